//! Binaural Beat Oscillators
//!
//! Two sine oscillators, one per ear. The carrier stays at a fixed pitch and
//! the modulator sits `beat` Hz above it; the listener perceives the
//! difference as a slow pulsation.

use std::f64::consts::TAU;

use super::GeneratorId;
use crate::error::{AudioError, Result};

/// Pitch of the left-ear carrier tone
pub const CARRIER_FREQUENCY: f32 = 200.0;

/// Highest beat frequency accepted by the pair
pub const MAX_BEAT_FREQUENCY: f32 = 1000.0;

// ============================================================================
// Presets
// ============================================================================

/// Named brainwave band with its documented range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinauralPreset {
    pub name: &'static str,
    pub min_hz: f32,
    pub max_hz: f32,
    pub default_hz: f32,
    pub description: &'static str,
}

impl BinauralPreset {
    pub fn contains(&self, frequency: f32) -> bool {
        frequency >= self.min_hz && frequency <= self.max_hz
    }
}

pub const BINAURAL_PRESETS: [BinauralPreset; 5] = [
    BinauralPreset {
        name: "delta",
        min_hz: 0.5,
        max_hz: 4.0,
        default_hz: 2.0,
        description: "Deep sleep and restoration",
    },
    BinauralPreset {
        name: "theta",
        min_hz: 4.0,
        max_hz: 8.0,
        default_hz: 6.0,
        description: "Meditation and creativity",
    },
    BinauralPreset {
        name: "alpha",
        min_hz: 8.0,
        max_hz: 14.0,
        default_hz: 10.0,
        description: "Relaxed focus",
    },
    BinauralPreset {
        name: "beta",
        min_hz: 14.0,
        max_hz: 30.0,
        default_hz: 20.0,
        description: "Active thinking and concentration",
    },
    BinauralPreset {
        name: "gamma",
        min_hz: 30.0,
        max_hz: 100.0,
        default_hz: 40.0,
        description: "High-level cognition",
    },
];

/// Look up a preset by name (case-insensitive)
pub fn preset(name: &str) -> Option<&'static BinauralPreset> {
    BINAURAL_PRESETS
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(name.trim()))
}

/// First preset whose range contains `frequency`
pub fn preset_for_frequency(frequency: f32) -> Option<&'static BinauralPreset> {
    BINAURAL_PRESETS.iter().find(|p| p.contains(frequency))
}

/// Reject frequencies the pair cannot sensibly produce
pub fn validate_beat_frequency(frequency: f32) -> Result<()> {
    if !frequency.is_finite() {
        return Err(AudioError::InvalidFrequency {
            frequency,
            reason: "not a finite number".to_string(),
        });
    }
    if frequency <= 0.0 || frequency > MAX_BEAT_FREQUENCY {
        return Err(AudioError::InvalidFrequency {
            frequency,
            reason: format!("must be within (0, {MAX_BEAT_FREQUENCY}] Hz"),
        });
    }
    Ok(())
}

// ============================================================================
// Oscillator
// ============================================================================

/// Phase-accumulating sine oscillator
///
/// Frequency can change while running; phase stays continuous so retuning
/// does not click.
#[derive(Debug)]
pub struct Oscillator {
    id: GeneratorId,
    frequency: f32,
    sample_rate: u32,
    phase: f64,
}

impl Oscillator {
    pub fn new(frequency: f32, sample_rate: u32) -> Self {
        Self {
            id: GeneratorId::new(),
            frequency,
            sample_rate,
            phase: 0.0,
        }
    }

    pub fn id(&self) -> GeneratorId {
        self.id
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// Retune in place
    pub fn set_frequency(&mut self, frequency: f32) {
        self.frequency = frequency;
    }

    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        let out = (self.phase * TAU).sin() as f32;
        self.phase += self.frequency as f64 / self.sample_rate as f64;
        self.phase -= self.phase.floor();
        out
    }
}

// ============================================================================
// Binaural Pair
// ============================================================================

/// Carrier (left) and modulator (right) oscillators started and stopped together
#[derive(Debug)]
pub struct BinauralPair {
    carrier: Oscillator,
    modulator: Oscillator,
}

impl BinauralPair {
    /// Start a pair producing a `beat_frequency` Hz beat
    pub fn start(beat_frequency: f32, sample_rate: u32) -> Result<Self> {
        validate_beat_frequency(beat_frequency)?;
        if sample_rate == 0 {
            return Err(AudioError::InvalidSampleRate { sample_rate });
        }
        let pair = Self {
            carrier: Oscillator::new(CARRIER_FREQUENCY, sample_rate),
            modulator: Oscillator::new(CARRIER_FREQUENCY + beat_frequency, sample_rate),
        };
        tracing::debug!(
            carrier = %pair.carrier.id(),
            modulator = %pair.modulator.id(),
            beat_frequency,
            "binaural pair started"
        );
        Ok(pair)
    }

    pub fn carrier(&self) -> &Oscillator {
        &self.carrier
    }

    pub fn modulator(&self) -> &Oscillator {
        &self.modulator
    }

    pub fn beat_frequency(&self) -> f32 {
        self.modulator.frequency() - self.carrier.frequency()
    }

    /// Retune the modulator; the carrier is never touched
    pub fn set_beat_frequency(&mut self, beat_frequency: f32) -> Result<()> {
        validate_beat_frequency(beat_frequency)?;
        self.modulator
            .set_frequency(self.carrier.frequency() + beat_frequency);
        Ok(())
    }

    #[inline]
    pub fn next_frame(&mut self) -> (f32, f32) {
        (self.carrier.next_sample(), self.modulator.next_sample())
    }

    /// Halt both oscillators; the pair cannot be restarted
    pub fn stop(self) {
        tracing::debug!(
            carrier = %self.carrier.id(),
            modulator = %self.modulator.id(),
            "binaural pair stopped"
        );
    }
}
