//! Audio Engine Facade
//!
//! Owns the output, the mix graph, the noise loops and the loaded nature
//! sounds, and drives them through the lifecycle in `EngineState`.
//! Nothing outside the engine holds a source or oscillator handle.

use std::time::Duration;

use crate::config::EngineConfig;
use crate::engine::buffer::{AudioBuffer, ChannelLayout};
use crate::engine::state::EngineState;
use crate::error::{AudioError, Result};
use crate::generator::oscillator::validate_beat_frequency;
use crate::generator::{NoiseBufferSet, NoiseGenerator};
use crate::graph::{GraphSnapshot, MixGraph, SharedGraph};
use crate::nature::{fetch_and_decode, InsertOutcome, LoadedSound, NatureSoundSet};
use crate::output::{AudioOutput, OfflineBackend, OutputBackend};
use crate::settings::{
    AudioSettings, AudioSettingsUpdate, NatureSoundType, SettingsDelta, VolumeChannel,
};

/// Everything that exists only between `initialize` and `dispose`
struct AudioContext {
    output: Box<dyn AudioOutput>,
    graph: SharedGraph,
    noise_buffers: NoiseBufferSet,
}

impl AudioContext {
    fn sample_rate(&self) -> u32 {
        self.output.sample_rate()
    }
}

/// Parameters captured when a nature sound load begins
#[derive(Debug, Clone, Copy)]
pub struct NatureLoadTicket {
    pub epoch: u64,
    pub sample_rate: u32,
    pub timeout: Duration,
}

pub struct AudioEngine {
    config: EngineConfig,
    settings: AudioSettings,
    state: EngineState,
    backend: Box<dyn OutputBackend>,
    context: Option<AudioContext>,
    nature_sounds: NatureSoundSet,
}

impl AudioEngine {
    /// Create an engine; nothing is opened until `initialize`
    pub fn new(config: EngineConfig, backend: Box<dyn OutputBackend>) -> Result<Self> {
        config.validate()?;
        let settings = config.settings.clone().normalized();
        Ok(Self {
            config,
            settings,
            state: EngineState::Uninitialized,
            backend,
            context: None,
            nature_sounds: NatureSoundSet::new(),
        })
    }

    /// Engine rendering through the offline backend
    pub fn offline(config: EngineConfig) -> Result<Self> {
        Self::new(config, Box::new(OfflineBackend::new()))
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == EngineState::Playing
    }

    pub fn settings(&self) -> &AudioSettings {
        &self.settings
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Output rate, once initialized
    pub fn sample_rate(&self) -> Option<u32> {
        self.context.as_ref().map(|ctx| ctx.sample_rate())
    }

    pub fn nature_sounds(&self) -> &NatureSoundSet {
        &self.nature_sounds
    }

    /// Current graph contents, once initialized
    pub fn snapshot(&self) -> Option<GraphSnapshot> {
        self.context.as_ref().map(|ctx| ctx.graph.lock().snapshot())
    }

    fn ensure_not_disposed(&self) -> Result<()> {
        if self.state == EngineState::Disposed {
            return Err(AudioError::Disposed);
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// Open the output, build the gain graph and generate noise loops
    ///
    /// Idempotent. On failure the engine stays `Uninitialized`.
    pub fn initialize(&mut self) -> Result<()> {
        self.ensure_not_disposed()?;
        if self.context.is_some() {
            return Ok(());
        }

        let context = self.open_context().map_err(|e| {
            tracing::error!(code = e.error_code(), "engine initialization failed: {}", e);
            e
        })?;

        tracing::info!(
            backend = self.backend.name(),
            sample_rate = context.sample_rate(),
            "audio engine initialized"
        );
        self.context = Some(context);
        self.state = EngineState::Stopped;
        Ok(())
    }

    fn open_context(&self) -> Result<AudioContext> {
        let graph = MixGraph::new(self.config.sample_rate, &self.settings).shared();
        let mut output = self.backend.open(self.config.sample_rate, graph.clone())?;

        let sample_rate = output.sample_rate();
        graph.lock().set_sample_rate(sample_rate);

        let mut generator = match self.config.seed {
            Some(seed) => NoiseGenerator::with_seed(seed),
            None => NoiseGenerator::new(),
        };
        let noise_buffers =
            match NoiseBufferSet::generate(&mut generator, sample_rate, self.config.noise_duration_secs) {
                Ok(buffers) => buffers,
                Err(e) => {
                    if let Err(close_err) = output.close() {
                        tracing::warn!("error while closing output: {}", close_err);
                    }
                    return Err(e);
                }
            };

        Ok(AudioContext {
            output,
            graph,
            noise_buffers,
        })
    }

    /// Start every configured channel
    ///
    /// No-op while already playing. Initializes on first use and resumes a
    /// suspended output. If any channel fails to start, channels started by
    /// this call are stopped again and the engine stays `Stopped`.
    pub fn play(&mut self) -> Result<()> {
        self.ensure_not_disposed()?;
        if self.state == EngineState::Playing {
            return Ok(());
        }

        self.initialize()?;
        let Some(ctx) = self.context.as_mut() else {
            return Err(AudioError::NotInitialized);
        };

        if ctx.output.is_suspended() {
            ctx.output.resume().map_err(|e| {
                tracing::error!("failed to resume output: {}", e);
                e
            })?;
        }

        let mut graph = ctx.graph.lock();
        let started = start_channels(&mut graph, &ctx.noise_buffers, &self.nature_sounds, &self.settings);
        if let Err(e) = started {
            graph.stop_all();
            drop(graph);
            if let Err(suspend_err) = ctx.output.suspend() {
                tracing::warn!("failed to suspend output: {}", suspend_err);
            }
            tracing::error!(code = e.error_code(), "playback failed to start: {}", e);
            return Err(e);
        }
        drop(graph);

        self.state = EngineState::Playing;
        tracing::info!(
            noise = %self.settings.noise_type,
            nature = ?self.settings.nature_sound,
            binaural_hz = self.settings.binaural_frequency,
            "playback started"
        );
        Ok(())
    }

    /// Stop every channel and suspend the output
    ///
    /// Safe to call in any state, including before `initialize`, twice in a
    /// row, or after `dispose`. A suspend failure is logged, not returned.
    pub fn stop(&mut self) {
        if let Some(ctx) = self.context.as_mut() {
            ctx.graph.lock().stop_all();
            if !ctx.output.is_suspended() {
                if let Err(e) = ctx.output.suspend() {
                    tracing::warn!("failed to suspend output: {}", e);
                }
            }
        }
        if self.state == EngineState::Playing {
            self.state = EngineState::Stopped;
            tracing::info!("playback stopped");
        }
    }

    /// Stop playback, release the output and invalidate pending loads
    ///
    /// Terminal: later calls to `initialize`, `play` and the update
    /// methods return `AudioError::Disposed`.
    pub fn dispose(&mut self) {
        if self.state == EngineState::Disposed {
            return;
        }
        self.stop();
        if let Some(mut ctx) = self.context.take() {
            if let Err(e) = ctx.output.close() {
                tracing::warn!("error while closing output: {}", e);
            }
        }
        self.nature_sounds.advance_epoch();
        self.state = EngineState::Disposed;
        tracing::info!("audio engine disposed");
    }

    // ------------------------------------------------------------------------
    // Settings
    // ------------------------------------------------------------------------

    /// Merge a partial update and apply the smallest matching graph change
    ///
    /// Volume changes touch only gains. A new noise or nature type restarts
    /// only that channel. A new binaural frequency retunes the running
    /// modulator in place. Invalid frequencies are rejected before any field
    /// changes.
    pub fn update_settings(&mut self, update: AudioSettingsUpdate) -> Result<SettingsDelta> {
        self.ensure_not_disposed()?;
        if let Some(freq) = update.binaural_frequency {
            validate_beat_frequency(freq)?;
        }

        let delta = self.settings.apply(&update);
        if delta.is_empty() {
            return Ok(delta);
        }
        tracing::debug!(?delta, "settings updated");

        let Some(ctx) = self.context.as_ref() else {
            return Ok(delta);
        };
        let mut graph = ctx.graph.lock();

        for &channel in &delta.volumes {
            graph.set_volume(channel, self.settings.volume(channel));
        }

        if self.state != EngineState::Playing {
            return Ok(delta);
        }

        if delta.noise_type {
            if let Some(buffer) = ctx.noise_buffers.get(self.settings.noise_type) {
                graph.start_noise(self.settings.noise_type, buffer);
            }
        }
        if delta.nature_sound {
            graph.stop_nature();
            if let Some(kind) = self.settings.nature_sound {
                start_nature(&mut graph, &self.nature_sounds, kind);
            }
        }
        if delta.binaural_frequency && !graph.retune_binaural(self.settings.binaural_frequency)? {
            graph.start_binaural(self.settings.binaural_frequency)?;
        }

        Ok(delta)
    }

    /// Set one channel volume; input outside [0, 1] is clamped
    pub fn update_volume(&mut self, channel: VolumeChannel, value: f32) -> Result<()> {
        self.ensure_not_disposed()?;
        self.settings.set_volume(channel, value);
        if let Some(ctx) = self.context.as_ref() {
            ctx.graph
                .lock()
                .set_volume(channel, self.settings.volume(channel));
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Nature sounds
    // ------------------------------------------------------------------------

    /// Fetch, decode and store a nature sound
    ///
    /// Initializes the engine if needed so the sound is resampled to the
    /// output rate. On failure the slot stays empty and the error is
    /// returned after being logged.
    pub fn load_nature_sound(&mut self, kind: NatureSoundType, url: &str) -> Result<InsertOutcome> {
        let ticket = self.begin_nature_load()?;
        let result = fetch_and_decode(url, ticket.sample_rate, ticket.timeout);
        self.finish_nature_load(ticket, kind, url, result)
    }

    /// Load every source listed in the config, continuing past failures
    pub fn load_configured_sounds(&mut self) -> Vec<(NatureSoundType, Result<InsertOutcome>)> {
        let sources: Vec<_> = self
            .config
            .nature_sources
            .iter()
            .map(|(kind, url)| (*kind, url.clone()))
            .collect();
        sources
            .into_iter()
            .map(|(kind, url)| (kind, self.load_nature_sound(kind, &url)))
            .collect()
    }

    /// First half of a load: capture the epoch and output rate
    pub fn begin_nature_load(&mut self) -> Result<NatureLoadTicket> {
        self.initialize()?;
        let sample_rate = self.sample_rate().ok_or(AudioError::NotInitialized)?;
        Ok(NatureLoadTicket {
            epoch: self.nature_sounds.epoch(),
            sample_rate,
            timeout: self.config.fetch_timeout(),
        })
    }

    /// Second half of a load: store the result if the ticket is still current
    pub fn finish_nature_load(
        &mut self,
        ticket: NatureLoadTicket,
        kind: NatureSoundType,
        url: &str,
        result: Result<LoadedSound>,
    ) -> Result<InsertOutcome> {
        let sound = match result {
            Ok(sound) => sound,
            Err(e) => {
                tracing::warn!(kind = %kind, url, code = e.error_code(), "nature sound unavailable: {}", e);
                return Err(e);
            }
        };

        let outcome = self.nature_sounds.insert(ticket.epoch, kind, sound);
        match outcome {
            InsertOutcome::Stale => {
                tracing::debug!(kind = %kind, url, "discarding nature sound loaded for a disposed engine");
            }
            InsertOutcome::Unchanged => {
                tracing::debug!(kind = %kind, url, "nature sound already loaded");
            }
            InsertOutcome::Inserted => {
                tracing::info!(kind = %kind, url, "nature sound loaded");
                self.restart_selected_nature(kind);
            }
        }
        Ok(outcome)
    }

    /// (Re)start the nature channel when the selected type got new audio
    ///
    /// Covers both a sound arriving after playback began and a replacement
    /// recording for the type already playing.
    fn restart_selected_nature(&mut self, kind: NatureSoundType) {
        if self.state != EngineState::Playing || self.settings.nature_sound != Some(kind) {
            return;
        }
        if let Some(ctx) = self.context.as_ref() {
            let mut graph = ctx.graph.lock();
            start_nature(&mut graph, &self.nature_sounds, kind);
        }
    }

    // ------------------------------------------------------------------------
    // Offline rendering
    // ------------------------------------------------------------------------

    /// Pull `frames` stereo frames from the graph
    ///
    /// Only valid for offline outputs. A suspended output yields silence.
    pub fn render_offline(&mut self, frames: usize) -> Result<AudioBuffer> {
        self.ensure_not_disposed()?;
        let ctx = self.context.as_ref().ok_or(AudioError::NotInitialized)?;
        if ctx.output.is_realtime() {
            return Err(AudioError::OutputBusy);
        }

        let mut interleaved = vec![0.0_f32; frames * 2];
        if !ctx.output.is_suspended() {
            ctx.graph.lock().render(&mut interleaved);
        }
        AudioBuffer::from_interleaved(&interleaved, ChannelLayout::Stereo, ctx.sample_rate())
    }
}

fn start_channels(
    graph: &mut MixGraph,
    noise_buffers: &NoiseBufferSet,
    nature_sounds: &NatureSoundSet,
    settings: &AudioSettings,
) -> Result<()> {
    let buffer = noise_buffers
        .get(settings.noise_type)
        .ok_or(AudioError::NotInitialized)?;
    graph.start_noise(settings.noise_type, buffer);

    if let Some(kind) = settings.nature_sound {
        start_nature(graph, nature_sounds, kind);
    }

    graph.start_binaural(settings.binaural_frequency)
}

fn start_nature(graph: &mut MixGraph, nature_sounds: &NatureSoundSet, kind: NatureSoundType) {
    match nature_sounds.get(kind) {
        Some(buffer) => {
            graph.start_nature(kind, buffer);
        }
        None => tracing::debug!(kind = %kind, "nature sound not loaded, channel stays silent"),
    }
}
