//! Engine configuration
//!
//! Loaded from a JSON file; every field has a default, so an empty object
//! is a valid configuration.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::engine::buffer::DEFAULT_SAMPLE_RATE;
use crate::error::{AudioError, Result};
use crate::generator::{NOISE_BUFFER_SECS, oscillator::validate_beat_frequency};
use crate::settings::{AudioSettings, NatureSoundType};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Preferred output rate; the device may override it
    pub sample_rate: u32,
    /// Length of each generated noise loop
    pub noise_duration_secs: f64,
    /// Timeout for remote nature sound fetches
    pub fetch_timeout_ms: u64,
    /// Seed for noise generation; `None` draws from OS entropy
    pub seed: Option<u64>,
    /// Nature sound sources, keyed by type
    pub nature_sources: BTreeMap<NatureSoundType, String>,
    /// Settings applied when the engine is created
    pub settings: AudioSettings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            noise_duration_secs: NOISE_BUFFER_SECS,
            fetch_timeout_ms: 30_000,
            seed: None,
            nature_sources: BTreeMap::new(),
            settings: AudioSettings::default(),
        }
    }
}

impl EngineConfig {
    /// Read and validate a JSON config file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: EngineConfig = serde_json::from_str(&text)?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "loaded engine config");
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(AudioError::InvalidSampleRate {
                sample_rate: self.sample_rate,
            });
        }
        if !(self.noise_duration_secs.is_finite() && self.noise_duration_secs > 0.0) {
            return Err(AudioError::Config {
                reason: format!(
                    "noise_duration_secs must be positive, got {}",
                    self.noise_duration_secs
                ),
            });
        }
        if self.fetch_timeout_ms == 0 {
            return Err(AudioError::Config {
                reason: "fetch_timeout_ms must be positive".to_string(),
            });
        }
        validate_beat_frequency(self.settings.binaural_frequency)?;
        Ok(())
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }
}
