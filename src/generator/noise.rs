//! Noise Buffer Generation
//!
//! Synthesizes the fixed-length stereo loops used by the noise channel.
//! Each channel is filtered independently so left and right are
//! uncorrelated. Buffers are generated once per engine and looped forever.

use std::collections::HashMap;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::engine::buffer::{AudioBuffer, ChannelLayout};
use crate::error::{AudioError, Result};
use crate::settings::NoiseType;

/// Loop length of every noise buffer
pub const NOISE_BUFFER_SECS: f64 = 2.0;

const PINK_OUTPUT_SCALE: f32 = 0.11;
const BROWN_INPUT_WEIGHT: f32 = 0.02;
const BROWN_LEAK: f32 = 0.98;
const BROWN_OUTPUT_SCALE: f32 = 3.5;
const GREY_OUTPUT_SCALE: f32 = 0.7;
const GREY_INPUT_BOOST: f32 = 0.1;

// ============================================================================
// Filters
// ============================================================================

/// Seven-stage leaky integrator bank approximating a 1/f slope
#[derive(Debug, Default, Clone)]
struct PinkFilter {
    b: [f32; 7],
}

impl PinkFilter {
    #[inline]
    fn process(&mut self, white: f32) -> f32 {
        let b = &mut self.b;
        b[0] = 0.99886 * b[0] + white * 0.0555179;
        b[1] = 0.99332 * b[1] + white * 0.0750759;
        b[2] = 0.96900 * b[2] + white * 0.1538520;
        b[3] = 0.86650 * b[3] + white * 0.3104856;
        b[4] = 0.55000 * b[4] + white * 0.5329522;
        b[5] = -0.7616 * b[5] - white * 0.0168980;
        let out = b.iter().sum::<f32>() + white * 0.5362;
        b[6] = white * 0.115926;
        out * PINK_OUTPUT_SCALE
    }
}

/// Single-pole leaky integrator (1/f² slope)
#[derive(Debug, Default, Clone)]
struct BrownFilter {
    state: f32,
}

impl BrownFilter {
    #[inline]
    fn process(&mut self, white: f32) -> f32 {
        self.state = BROWN_INPUT_WEIGHT * white + BROWN_LEAK * self.state;
        self.state * BROWN_OUTPUT_SCALE
    }
}

/// Difference filter tilting white noise toward the upper mids
///
/// Output stays within about ±2.57 for inputs in [-1, 1]; the mix bus
/// clips the final sum.
#[derive(Debug, Default, Clone)]
struct GreyFilter {
    prev_out: f32,
}

impl GreyFilter {
    #[inline]
    fn process(&mut self, white: f32) -> f32 {
        let out = GREY_OUTPUT_SCALE * (white - self.prev_out + GREY_INPUT_BOOST * white);
        self.prev_out = out;
        out
    }
}

// ============================================================================
// Noise Generator
// ============================================================================

/// Produces noise buffers from a seedable random source
pub struct NoiseGenerator {
    rng: StdRng,
}

impl NoiseGenerator {
    /// Generator seeded from OS entropy
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic generator for reproducible renders and tests
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    #[inline]
    fn white(&mut self) -> f32 {
        self.rng.gen_range(-1.0_f32..=1.0)
    }

    /// Generate one stereo loop of the requested color
    ///
    /// # Arguments
    /// * `noise_type` - Color to synthesize
    /// * `sample_rate` - Output sample rate in Hz
    /// * `duration_secs` - Loop length in seconds
    ///
    /// # Errors
    /// * `InvalidSampleRate` - if `sample_rate` is zero
    /// * `Config` - if the duration yields an empty buffer
    pub fn generate(
        &mut self,
        noise_type: NoiseType,
        sample_rate: u32,
        duration_secs: f64,
    ) -> Result<AudioBuffer> {
        if sample_rate == 0 {
            return Err(AudioError::InvalidSampleRate { sample_rate });
        }
        let frames = (duration_secs * sample_rate as f64).round() as usize;
        if frames == 0 {
            return Err(AudioError::Config {
                reason: format!("noise duration {duration_secs}s is too short"),
            });
        }

        let mut buffer = AudioBuffer::new(frames, ChannelLayout::Stereo, sample_rate);
        for ch in 0..buffer.num_channels() {
            let samples = buffer.channel_mut(ch);
            match noise_type {
                NoiseType::White => {
                    for s in samples.iter_mut() {
                        *s = self.white();
                    }
                }
                NoiseType::Pink => {
                    let mut filter = PinkFilter::default();
                    for s in samples.iter_mut() {
                        *s = filter.process(self.white());
                    }
                }
                NoiseType::Brown => {
                    let mut filter = BrownFilter::default();
                    for s in samples.iter_mut() {
                        *s = filter.process(self.white());
                    }
                }
                NoiseType::Grey => {
                    let mut filter = GreyFilter::default();
                    for s in samples.iter_mut() {
                        *s = filter.process(self.white());
                    }
                }
            }
        }

        Ok(buffer)
    }
}

impl Default for NoiseGenerator {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Noise Buffer Set
// ============================================================================

/// Precomputed loops for every noise color
#[derive(Debug, Clone)]
pub struct NoiseBufferSet {
    buffers: HashMap<NoiseType, Arc<AudioBuffer>>,
}

impl NoiseBufferSet {
    /// Generate all four colors at `sample_rate`
    pub fn generate(
        generator: &mut NoiseGenerator,
        sample_rate: u32,
        duration_secs: f64,
    ) -> Result<Self> {
        let mut buffers = HashMap::with_capacity(NoiseType::ALL.len());
        for noise_type in NoiseType::ALL {
            let buffer = generator.generate(noise_type, sample_rate, duration_secs)?;
            buffers.insert(noise_type, Arc::new(buffer));
        }
        tracing::debug!(
            sample_rate,
            duration_secs,
            "generated {} noise buffers",
            buffers.len()
        );
        Ok(Self { buffers })
    }

    pub fn get(&self, noise_type: NoiseType) -> Option<Arc<AudioBuffer>> {
        self.buffers.get(&noise_type).cloned()
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }
}
