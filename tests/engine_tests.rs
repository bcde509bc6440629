//! Engine Integration Tests
//!
//! Lifecycle, settings and mixing behaviour of the engine facade, driven
//! through the offline backend.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use approx::assert_relative_eq;
use focus_audio::engine::buffer::calculate_peak;
use focus_audio::generator::CARRIER_FREQUENCY;
use focus_audio::graph::{perceptual_gain, SharedGraph};
use focus_audio::output::{AudioOutput, OfflineBackend, OutputBackend};
use focus_audio::{
    AudioEngine, AudioError, AudioSettingsUpdate, EngineConfig, EngineHandle, EngineState,
    NatureSoundType, NoiseType, Result, VolumeChannel,
};
use pretty_assertions::assert_eq;

fn test_config() -> EngineConfig {
    EngineConfig {
        sample_rate: 8000,
        seed: Some(7),
        ..EngineConfig::default()
    }
}

fn offline_engine() -> AudioEngine {
    AudioEngine::offline(test_config()).unwrap()
}

/// Output that opens fine but refuses to start
struct StuckBackend;

struct StuckOutput;

impl AudioOutput for StuckOutput {
    fn sample_rate(&self) -> u32 {
        8000
    }

    fn resume(&mut self) -> Result<()> {
        Err(AudioError::DeviceUnavailable {
            reason: "device lost".to_string(),
        })
    }

    fn suspend(&mut self) -> Result<()> {
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }

    fn is_suspended(&self) -> bool {
        true
    }

    fn is_realtime(&self) -> bool {
        false
    }
}

impl OutputBackend for StuckBackend {
    fn open(&self, _preferred_sample_rate: u32, _graph: SharedGraph) -> Result<Box<dyn AudioOutput>> {
        Ok(Box::new(StuckOutput))
    }

    fn name(&self) -> &'static str {
        "stuck"
    }
}

/// Output that reports no usable rate and fails to close
struct RatelessBackend {
    closed: Arc<AtomicBool>,
}

struct RatelessOutput {
    closed: Arc<AtomicBool>,
}

impl AudioOutput for RatelessOutput {
    fn sample_rate(&self) -> u32 {
        0
    }

    fn resume(&mut self) -> Result<()> {
        Ok(())
    }

    fn suspend(&mut self) -> Result<()> {
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Err(AudioError::DeviceUnavailable {
            reason: "device vanished".to_string(),
        })
    }

    fn is_suspended(&self) -> bool {
        true
    }

    fn is_realtime(&self) -> bool {
        false
    }
}

impl OutputBackend for RatelessBackend {
    fn open(&self, _preferred_sample_rate: u32, _graph: SharedGraph) -> Result<Box<dyn AudioOutput>> {
        Ok(Box::new(RatelessOutput {
            closed: Arc::clone(&self.closed),
        }))
    }

    fn name(&self) -> &'static str {
        "rateless"
    }
}

// === Lifecycle ===

#[test]
fn test_play_twice_is_idempotent() {
    let mut engine = offline_engine();
    engine.play().unwrap();
    let first = engine.snapshot().unwrap();

    engine.play().unwrap();
    let second = engine.snapshot().unwrap();

    assert_eq!(engine.state(), EngineState::Playing);
    assert_eq!(first, second);
    // Noise plus carrier and modulator; nature is off by default
    assert_eq!(second.active_generators(), 3);
}

#[test]
fn test_stop_without_play_is_harmless() {
    let mut engine = offline_engine();
    engine.stop();
    engine.stop();
    assert_eq!(engine.state(), EngineState::Uninitialized);

    engine.initialize().unwrap();
    engine.stop();
    assert_eq!(engine.state(), EngineState::Stopped);
}

#[test]
fn test_stop_twice_after_play() {
    let mut engine = offline_engine();
    engine.play().unwrap();
    engine.stop();
    engine.stop();

    assert_eq!(engine.state(), EngineState::Stopped);
    assert_eq!(engine.snapshot().unwrap().active_generators(), 0);
}

#[test]
fn test_restart_creates_fresh_generators() {
    let mut engine = offline_engine();
    engine.play().unwrap();
    let before = engine.snapshot().unwrap();

    engine.stop();
    engine.play().unwrap();
    let after = engine.snapshot().unwrap();

    assert_ne!(before.noise.unwrap().0, after.noise.unwrap().0);
    assert_ne!(
        before.binaural.unwrap().carrier_id,
        after.binaural.unwrap().carrier_id
    );
}

#[test]
fn test_play_after_dispose_is_rejected() {
    let mut engine = offline_engine();
    engine.play().unwrap();
    engine.dispose();

    assert_eq!(engine.state(), EngineState::Disposed);
    assert!(matches!(engine.play(), Err(AudioError::Disposed)));
    assert!(matches!(engine.initialize(), Err(AudioError::Disposed)));
    assert!(engine.snapshot().is_none());

    // stop and dispose stay safe
    engine.stop();
    engine.dispose();
    assert_eq!(engine.state(), EngineState::Disposed);
}

#[test]
fn test_failed_initialize_stays_uninitialized() {
    let mut engine =
        AudioEngine::new(test_config(), Box::new(OfflineBackend::with_sample_rate(0))).unwrap();

    let err = engine.play().unwrap_err();
    assert_eq!(err.error_code(), "INVALID_SAMPLE_RATE");
    assert_eq!(engine.state(), EngineState::Uninitialized);
    assert!(engine.snapshot().is_none());
}

#[test]
fn test_resume_failure_leaves_nothing_running() {
    let mut engine = AudioEngine::new(test_config(), Box::new(StuckBackend)).unwrap();

    let err = engine.play().unwrap_err();
    assert!(err.is_recoverable());
    assert_eq!(engine.state(), EngineState::Stopped);
    assert_eq!(engine.snapshot().unwrap().active_generators(), 0);
}

#[test]
fn test_output_is_closed_when_context_setup_fails() {
    let closed = Arc::new(AtomicBool::new(false));
    let backend = RatelessBackend {
        closed: Arc::clone(&closed),
    };
    let mut engine = AudioEngine::new(test_config(), Box::new(backend)).unwrap();

    // The close error is logged; the setup error is what comes back
    let err = engine.initialize().unwrap_err();
    assert_eq!(err.error_code(), "INVALID_SAMPLE_RATE");
    assert!(closed.load(Ordering::SeqCst));
    assert_eq!(engine.state(), EngineState::Uninitialized);
    assert!(engine.snapshot().is_none());
}

// === Settings ===

#[test]
fn test_binaural_retune_keeps_oscillators() {
    let mut engine = offline_engine();
    engine.play().unwrap();
    let before = engine.snapshot().unwrap().binaural.unwrap();

    let delta = engine
        .update_settings(AudioSettingsUpdate::default().binaural_frequency(4.0))
        .unwrap();
    assert!(delta.binaural_frequency);

    let after = engine.snapshot().unwrap().binaural.unwrap();
    assert_eq!(after.carrier_id, before.carrier_id);
    assert_eq!(after.modulator_id, before.modulator_id);
    assert_relative_eq!(after.carrier_hz, CARRIER_FREQUENCY);
    assert_relative_eq!(after.modulator_hz, CARRIER_FREQUENCY + 4.0);
}

#[test]
fn test_invalid_binaural_frequency_is_rejected() {
    let mut engine = offline_engine();
    engine.play().unwrap();
    let before = engine.snapshot().unwrap();

    for freq in [0.0, -3.0, f32::NAN, 5000.0] {
        let err = engine
            .update_settings(AudioSettingsUpdate::default().binaural_frequency(freq))
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_FREQUENCY");
    }
    assert_eq!(engine.snapshot().unwrap(), before);
}

#[test]
fn test_pink_at_full_volume() {
    let mut engine = offline_engine();
    engine.initialize().unwrap();
    engine
        .update_settings(
            AudioSettingsUpdate::default()
                .noise_type(NoiseType::Pink)
                .noise_volume(1.0),
        )
        .unwrap();
    engine.play().unwrap();

    let snapshot = engine.snapshot().unwrap();
    assert_eq!(snapshot.noise.map(|(_, t)| t), Some(NoiseType::Pink));
    assert_relative_eq!(snapshot.noise_gain, 1.0);
}

#[test]
fn test_noise_type_change_restarts_only_noise() {
    let mut engine = offline_engine();
    engine.play().unwrap();
    let before = engine.snapshot().unwrap();

    engine
        .update_settings(AudioSettingsUpdate::default().noise_type(NoiseType::Brown))
        .unwrap();
    let after = engine.snapshot().unwrap();

    assert_eq!(after.noise.map(|(_, t)| t), Some(NoiseType::Brown));
    assert_ne!(after.noise.unwrap().0, before.noise.unwrap().0);
    assert_eq!(after.binaural, before.binaural);
}

#[test]
fn test_volume_update_touches_only_gains() {
    let mut engine = offline_engine();
    engine.play().unwrap();
    let before = engine.snapshot().unwrap();

    engine.update_volume(VolumeChannel::Binaural, 0.5).unwrap();
    let after = engine.snapshot().unwrap();

    assert_relative_eq!(after.binaural_gain, 0.125);
    assert_eq!(after.noise, before.noise);
    assert_eq!(after.binaural, before.binaural);
}

#[test]
fn test_volume_is_clamped_and_cubed() {
    let mut engine = offline_engine();
    engine.initialize().unwrap();

    engine.update_volume(VolumeChannel::Master, 1.7).unwrap();
    assert_relative_eq!(engine.settings().master_volume, 1.0);
    assert_relative_eq!(engine.snapshot().unwrap().master_gain, 1.0);

    engine.update_volume(VolumeChannel::Noise, -0.2).unwrap();
    assert_relative_eq!(engine.settings().noise_volume, 0.0);
    assert_relative_eq!(engine.snapshot().unwrap().noise_gain, 0.0);

    engine.update_volume(VolumeChannel::Nature, 0.9).unwrap();
    assert_relative_eq!(engine.snapshot().unwrap().nature_gain, 0.729, epsilon = 1e-6);
}

#[test]
fn test_perceptual_gain_curve() {
    let steps: Vec<f32> = (0..=100).map(|i| i as f32 / 100.0).collect();
    for pair in steps.windows(2) {
        assert!(perceptual_gain(pair[1]) > perceptual_gain(pair[0]));
    }
    for &v in &steps[1..steps.len() - 1] {
        assert!(perceptual_gain(v) < v);
    }
    assert_relative_eq!(perceptual_gain(0.0), 0.0);
    assert_relative_eq!(perceptual_gain(1.0), 1.0);
}

// === Nature Channel ===

#[test]
fn test_unloaded_nature_sound_stays_silent() {
    let config = EngineConfig {
        settings: focus_audio::AudioSettings {
            nature_sound: Some(NatureSoundType::Rain),
            ..focus_audio::AudioSettings::default()
        },
        ..test_config()
    };
    let mut engine = AudioEngine::offline(config).unwrap();
    engine.play().unwrap();

    let snapshot = engine.snapshot().unwrap();
    assert!(snapshot.nature.is_none());
    assert!(snapshot.noise.is_some());
    assert!(snapshot.binaural.is_some());
    assert_eq!(engine.state(), EngineState::Playing);
}

#[test]
fn test_turning_nature_off_while_playing() {
    let mut engine = offline_engine();
    engine.play().unwrap();
    let delta = engine
        .update_settings(AudioSettingsUpdate::default().nature_sound(None))
        .unwrap();
    assert!(delta.is_empty());

    let delta = engine
        .update_settings(AudioSettingsUpdate::default().nature_sound(Some(NatureSoundType::Ocean)))
        .unwrap();
    assert!(delta.nature_sound);
    assert!(engine.snapshot().unwrap().nature.is_none());
}

// === Rendering ===

#[test]
fn test_render_produces_bounded_audio() {
    let mut engine = offline_engine();
    engine.update_volume(VolumeChannel::Master, 1.0).unwrap();
    engine.update_volume(VolumeChannel::Noise, 1.0).unwrap();
    engine.update_volume(VolumeChannel::Binaural, 1.0).unwrap();
    engine.play().unwrap();

    let out = engine.render_offline(4000).unwrap();
    assert_eq!(out.channels(), 2);
    assert_eq!(out.len(), 4000);
    assert_eq!(out.sample_rate, 8000);

    let peak = calculate_peak(&out);
    assert!(peak > 0.0);
    assert!(peak <= 1.0);
}

#[test]
fn test_stopped_engine_renders_silence() {
    let mut engine = offline_engine();
    engine.play().unwrap();
    engine.stop();

    let out = engine.render_offline(256).unwrap();
    assert_relative_eq!(calculate_peak(&out), 0.0);
}

#[test]
fn test_muted_master_renders_silence() {
    let mut engine = offline_engine();
    engine.play().unwrap();
    engine.update_volume(VolumeChannel::Master, 0.0).unwrap();

    let out = engine.render_offline(256).unwrap();
    assert_relative_eq!(calculate_peak(&out), 0.0);
}

// === Shared Handle ===

#[test]
fn test_handle_serializes_calls_across_threads() {
    let handle = EngineHandle::new(offline_engine());
    handle.initialize().unwrap();

    let workers: Vec<_> = (0..4)
        .map(|i| {
            let handle = handle.clone();
            std::thread::spawn(move || {
                for _ in 0..25 {
                    handle.play().unwrap();
                    handle
                        .update_volume(VolumeChannel::Noise, i as f32 / 4.0)
                        .unwrap();
                    handle.stop();
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    assert_eq!(handle.state(), EngineState::Stopped);
    assert_eq!(handle.snapshot().unwrap().active_generators(), 0);

    handle.play().unwrap();
    assert!(handle.is_playing());
    assert_eq!(handle.snapshot().unwrap().active_generators(), 3);
}
