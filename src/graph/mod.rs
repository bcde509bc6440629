//! Mix Bus / Gain Graph
//!
//! Signal flow:
//!
//! ```text
//! noise source ──> noise gain ────┐
//! nature source ─> nature gain ───┼──> master gain ──> output
//! binaural pair ─> binaural gain ─┘
//! ```
//!
//! The four gain nodes live as long as the graph. Sources come and go: each
//! channel holds zero or one source, and a replaced source is stopped
//! before its successor starts.

pub mod gain;
pub mod source;

use std::sync::Arc;

use parking_lot::Mutex;

pub use gain::{perceptual_gain, GainNode};
pub use source::BufferSource;

use crate::engine::buffer::AudioBuffer;
use crate::error::Result;
use crate::generator::{BinauralPair, GeneratorId};
use crate::settings::{AudioSettings, NatureSoundType, NoiseType, VolumeChannel};

/// Graph shared between the engine and the output render callback
pub type SharedGraph = Arc<Mutex<MixGraph>>;

#[derive(Debug)]
struct NoiseVoice {
    noise_type: NoiseType,
    source: BufferSource,
}

#[derive(Debug)]
struct NatureVoice {
    kind: NatureSoundType,
    source: BufferSource,
}

// ============================================================================
// Snapshot
// ============================================================================

/// Point-in-time view of the graph
#[derive(Debug, Clone, PartialEq)]
pub struct GraphSnapshot {
    pub noise: Option<(GeneratorId, NoiseType)>,
    pub nature: Option<(GeneratorId, NatureSoundType)>,
    pub binaural: Option<BinauralSnapshot>,
    pub noise_gain: f32,
    pub nature_gain: f32,
    pub binaural_gain: f32,
    pub master_gain: f32,
}

impl GraphSnapshot {
    /// Number of live generator instances across all channels
    pub fn active_generators(&self) -> usize {
        self.noise.is_some() as usize
            + self.nature.is_some() as usize
            + self.binaural.as_ref().map_or(0, |_| 2)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinauralSnapshot {
    pub carrier_id: GeneratorId,
    pub carrier_hz: f32,
    pub modulator_id: GeneratorId,
    pub modulator_hz: f32,
}

// ============================================================================
// Mix Graph
// ============================================================================

#[derive(Debug)]
pub struct MixGraph {
    sample_rate: u32,
    noise_gain: GainNode,
    nature_gain: GainNode,
    binaural_gain: GainNode,
    master_gain: GainNode,
    noise: Option<NoiseVoice>,
    nature: Option<NatureVoice>,
    binaural: Option<BinauralPair>,
}

impl MixGraph {
    /// Build an idle graph with gains taken from `settings`
    pub fn new(sample_rate: u32, settings: &AudioSettings) -> Self {
        Self {
            sample_rate,
            noise_gain: GainNode::new(settings.noise_volume),
            nature_gain: GainNode::new(settings.nature_volume),
            binaural_gain: GainNode::new(settings.binaural_volume),
            master_gain: GainNode::new(settings.master_volume),
            noise: None,
            nature: None,
            binaural: None,
        }
    }

    pub fn shared(self) -> SharedGraph {
        Arc::new(Mutex::new(self))
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Adopt the rate reported by the output; running sources are stopped
    pub(crate) fn set_sample_rate(&mut self, sample_rate: u32) {
        if sample_rate != self.sample_rate {
            self.stop_all();
            self.sample_rate = sample_rate;
        }
    }

    pub fn gain(&self, channel: VolumeChannel) -> &GainNode {
        match channel {
            VolumeChannel::Noise => &self.noise_gain,
            VolumeChannel::Nature => &self.nature_gain,
            VolumeChannel::Binaural => &self.binaural_gain,
            VolumeChannel::Master => &self.master_gain,
        }
    }

    /// Change a channel volume; never starts or stops a source
    pub fn set_volume(&mut self, channel: VolumeChannel, value: f32) {
        let node = match channel {
            VolumeChannel::Noise => &mut self.noise_gain,
            VolumeChannel::Nature => &mut self.nature_gain,
            VolumeChannel::Binaural => &mut self.binaural_gain,
            VolumeChannel::Master => &mut self.master_gain,
        };
        node.set_value(value);
    }

    // ------------------------------------------------------------------------
    // Channel lifecycle
    // ------------------------------------------------------------------------

    pub fn start_noise(&mut self, noise_type: NoiseType, buffer: Arc<AudioBuffer>) -> GeneratorId {
        self.stop_noise();
        let source = BufferSource::start(buffer);
        let id = source.id();
        self.noise = Some(NoiseVoice { noise_type, source });
        id
    }

    /// Returns false when the channel was already idle
    pub fn stop_noise(&mut self) -> bool {
        match self.noise.take() {
            Some(voice) => {
                voice.source.stop();
                true
            }
            None => false,
        }
    }

    pub fn start_nature(&mut self, kind: NatureSoundType, buffer: Arc<AudioBuffer>) -> GeneratorId {
        self.stop_nature();
        let source = BufferSource::start(buffer);
        let id = source.id();
        self.nature = Some(NatureVoice { kind, source });
        id
    }

    pub fn stop_nature(&mut self) -> bool {
        match self.nature.take() {
            Some(voice) => {
                voice.source.stop();
                true
            }
            None => false,
        }
    }

    pub fn start_binaural(&mut self, beat_frequency: f32) -> Result<()> {
        let pair = BinauralPair::start(beat_frequency, self.sample_rate)?;
        self.stop_binaural();
        self.binaural = Some(pair);
        Ok(())
    }

    /// Retune the running pair in place
    ///
    /// Returns `Ok(false)` if no pair is running.
    pub fn retune_binaural(&mut self, beat_frequency: f32) -> Result<bool> {
        match self.binaural.as_mut() {
            Some(pair) => {
                pair.set_beat_frequency(beat_frequency)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn stop_binaural(&mut self) -> bool {
        match self.binaural.take() {
            Some(pair) => {
                pair.stop();
                true
            }
            None => false,
        }
    }

    pub fn stop_all(&mut self) {
        self.stop_noise();
        self.stop_nature();
        self.stop_binaural();
    }

    pub fn is_idle(&self) -> bool {
        self.noise.is_none() && self.nature.is_none() && self.binaural.is_none()
    }

    // ------------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------------

    /// Fill `out` with interleaved stereo frames
    ///
    /// A trailing odd sample is zeroed.
    pub fn render(&mut self, out: &mut [f32]) {
        let noise_gain = self.noise_gain.applied();
        let nature_gain = self.nature_gain.applied();
        let binaural_gain = self.binaural_gain.applied();
        let master = self.master_gain.applied();

        let mut frames = out.chunks_exact_mut(2);
        for frame in &mut frames {
            let mut left = 0.0_f32;
            let mut right = 0.0_f32;

            if let Some(voice) = self.noise.as_mut() {
                let (l, r) = voice.source.next_frame();
                left += l * noise_gain;
                right += r * noise_gain;
            }
            if let Some(voice) = self.nature.as_mut() {
                let (l, r) = voice.source.next_frame();
                left += l * nature_gain;
                right += r * nature_gain;
            }
            if let Some(pair) = self.binaural.as_mut() {
                let (l, r) = pair.next_frame();
                left += l * binaural_gain;
                right += r * binaural_gain;
            }

            frame[0] = (left * master).clamp(-1.0, 1.0);
            frame[1] = (right * master).clamp(-1.0, 1.0);
        }
        for sample in frames.into_remainder() {
            *sample = 0.0;
        }
    }

    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            noise: self.noise.as_ref().map(|v| (v.source.id(), v.noise_type)),
            nature: self.nature.as_ref().map(|v| (v.source.id(), v.kind)),
            binaural: self.binaural.as_ref().map(|pair| BinauralSnapshot {
                carrier_id: pair.carrier().id(),
                carrier_hz: pair.carrier().frequency(),
                modulator_id: pair.modulator().id(),
                modulator_hz: pair.modulator().frequency(),
            }),
            noise_gain: self.noise_gain.applied(),
            nature_gain: self.nature_gain.applied(),
            binaural_gain: self.binaural_gain.applied(),
            master_gain: self.master_gain.applied(),
        }
    }
}
