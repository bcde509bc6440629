//! Audio settings value objects
//!
//! `AudioSettings` is the single source of truth for what the engine should
//! be playing. It is only mutated through `AudioSettings::apply`, which the
//! engine facade calls from `update_settings`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AudioError;

// ============================================================================
// Noise Types
// ============================================================================

/// Noise color used for masking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoiseType {
    /// Flat spectrum
    #[default]
    White,
    /// ~1/f spectrum
    Pink,
    /// ~1/f² spectrum
    Brown,
    /// High-passed white noise shaped toward equal loudness
    Grey,
}

impl NoiseType {
    /// All noise colors in a stable order
    pub const ALL: [NoiseType; 4] = [
        NoiseType::White,
        NoiseType::Pink,
        NoiseType::Brown,
        NoiseType::Grey,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NoiseType::White => "white",
            NoiseType::Pink => "pink",
            NoiseType::Brown => "brown",
            NoiseType::Grey => "grey",
        }
    }
}

impl fmt::Display for NoiseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NoiseType {
    type Err = AudioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "white" => Ok(NoiseType::White),
            "pink" => Ok(NoiseType::Pink),
            "brown" | "brownian" => Ok(NoiseType::Brown),
            "grey" | "gray" => Ok(NoiseType::Grey),
            _ => Err(AudioError::UnknownVariant {
                kind: "noise type",
                value: s.to_string(),
            }),
        }
    }
}

// ============================================================================
// Nature Sound Types
// ============================================================================

/// Ambient recording category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NatureSoundType {
    Rain,
    Ocean,
    Forest,
    Thunderstorm,
    River,
    Fire,
    Birds,
    Wind,
}

impl NatureSoundType {
    pub const ALL: [NatureSoundType; 8] = [
        NatureSoundType::Rain,
        NatureSoundType::Ocean,
        NatureSoundType::Forest,
        NatureSoundType::Thunderstorm,
        NatureSoundType::River,
        NatureSoundType::Fire,
        NatureSoundType::Birds,
        NatureSoundType::Wind,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NatureSoundType::Rain => "rain",
            NatureSoundType::Ocean => "ocean",
            NatureSoundType::Forest => "forest",
            NatureSoundType::Thunderstorm => "thunderstorm",
            NatureSoundType::River => "river",
            NatureSoundType::Fire => "fire",
            NatureSoundType::Birds => "birds",
            NatureSoundType::Wind => "wind",
        }
    }
}

impl fmt::Display for NatureSoundType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NatureSoundType {
    type Err = AudioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        NatureSoundType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == needle)
            .ok_or_else(|| AudioError::UnknownVariant {
                kind: "nature sound",
                value: s.to_string(),
            })
    }
}

// ============================================================================
// Volume Channels
// ============================================================================

/// A gain stage addressable by `update_volume`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VolumeChannel {
    Noise,
    Nature,
    Binaural,
    Master,
}

impl fmt::Display for VolumeChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VolumeChannel::Noise => write!(f, "noise"),
            VolumeChannel::Nature => write!(f, "nature"),
            VolumeChannel::Binaural => write!(f, "binaural"),
            VolumeChannel::Master => write!(f, "master"),
        }
    }
}

// ============================================================================
// Audio Settings
// ============================================================================

/// Complete playback configuration
///
/// Field names serialize in camelCase so settings saved by the web client
/// load unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AudioSettings {
    pub noise_type: NoiseType,
    pub noise_volume: f32,
    #[serde(rename = "natureSoundType")]
    pub nature_sound: Option<NatureSoundType>,
    #[serde(rename = "natureSoundVolume")]
    pub nature_volume: f32,
    pub binaural_frequency: f32,
    pub binaural_volume: f32,
    pub master_volume: f32,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            noise_type: NoiseType::White,
            noise_volume: 0.5,
            nature_sound: None,
            nature_volume: 0.5,
            binaural_frequency: 10.0,
            binaural_volume: 0.3,
            master_volume: 0.7,
        }
    }
}

impl AudioSettings {
    /// Current raw (unshaped) volume for a channel
    pub fn volume(&self, channel: VolumeChannel) -> f32 {
        match channel {
            VolumeChannel::Noise => self.noise_volume,
            VolumeChannel::Nature => self.nature_volume,
            VolumeChannel::Binaural => self.binaural_volume,
            VolumeChannel::Master => self.master_volume,
        }
    }

    /// Store a volume, clamped to [0, 1]
    pub fn set_volume(&mut self, channel: VolumeChannel, value: f32) {
        let value = clamp_volume(value);
        match channel {
            VolumeChannel::Noise => self.noise_volume = value,
            VolumeChannel::Nature => self.nature_volume = value,
            VolumeChannel::Binaural => self.binaural_volume = value,
            VolumeChannel::Master => self.master_volume = value,
        }
    }

    /// Return a copy with every volume clamped to [0, 1]
    pub fn normalized(mut self) -> Self {
        for channel in [
            VolumeChannel::Noise,
            VolumeChannel::Nature,
            VolumeChannel::Binaural,
            VolumeChannel::Master,
        ] {
            let v = self.volume(channel);
            self.set_volume(channel, v);
        }
        self
    }

    /// Merge a partial update and report what changed
    pub fn apply(&mut self, update: &AudioSettingsUpdate) -> SettingsDelta {
        let mut delta = SettingsDelta::default();

        if let Some(noise_type) = update.noise_type {
            delta.noise_type = noise_type != self.noise_type;
            self.noise_type = noise_type;
        }
        if let Some(nature) = update.nature_sound {
            delta.nature_sound = nature != self.nature_sound;
            self.nature_sound = nature;
        }
        if let Some(freq) = update.binaural_frequency {
            delta.binaural_frequency = freq != self.binaural_frequency;
            self.binaural_frequency = freq;
        }

        let volumes = [
            (VolumeChannel::Noise, update.noise_volume),
            (VolumeChannel::Nature, update.nature_volume),
            (VolumeChannel::Binaural, update.binaural_volume),
            (VolumeChannel::Master, update.master_volume),
        ];
        for (channel, value) in volumes {
            if let Some(v) = value {
                let before = self.volume(channel);
                self.set_volume(channel, v);
                if self.volume(channel) != before {
                    delta.volumes.push(channel);
                }
            }
        }

        delta
    }
}

/// Partial settings update; `None` leaves a field untouched
///
/// `nature_sound` is doubly optional: `Some(None)` turns the nature channel
/// off, `None` leaves it as is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AudioSettingsUpdate {
    pub noise_type: Option<NoiseType>,
    pub noise_volume: Option<f32>,
    #[serde(
        rename = "natureSoundType",
        with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub nature_sound: Option<Option<NatureSoundType>>,
    #[serde(rename = "natureSoundVolume")]
    pub nature_volume: Option<f32>,
    pub binaural_frequency: Option<f32>,
    pub binaural_volume: Option<f32>,
    pub master_volume: Option<f32>,
}

impl AudioSettingsUpdate {
    pub fn noise_type(mut self, noise_type: NoiseType) -> Self {
        self.noise_type = Some(noise_type);
        self
    }

    pub fn noise_volume(mut self, volume: f32) -> Self {
        self.noise_volume = Some(volume);
        self
    }

    pub fn nature_sound(mut self, nature: Option<NatureSoundType>) -> Self {
        self.nature_sound = Some(nature);
        self
    }

    pub fn nature_volume(mut self, volume: f32) -> Self {
        self.nature_volume = Some(volume);
        self
    }

    pub fn binaural_frequency(mut self, frequency: f32) -> Self {
        self.binaural_frequency = Some(frequency);
        self
    }

    pub fn binaural_volume(mut self, volume: f32) -> Self {
        self.binaural_volume = Some(volume);
        self
    }

    pub fn master_volume(mut self, volume: f32) -> Self {
        self.master_volume = Some(volume);
        self
    }
}

/// Which parts of the settings changed in one `apply` call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsDelta {
    pub noise_type: bool,
    pub nature_sound: bool,
    pub binaural_frequency: bool,
    pub volumes: Vec<VolumeChannel>,
}

impl SettingsDelta {
    pub fn is_empty(&self) -> bool {
        !self.noise_type && !self.nature_sound && !self.binaural_frequency && self.volumes.is_empty()
    }
}

/// Clamp a volume into [0, 1]; NaN and infinities map to silence
#[inline]
pub fn clamp_volume(value: f32) -> f32 {
    if !value.is_finite() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

/// Distinguishes an absent `natureSoundType` key from an explicit `null`
mod double_option {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<T, S>(value: &Option<Option<T>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Serialize,
        S: Serializer,
    {
        match value {
            Some(inner) => inner.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_noise_type_parse() {
        assert_eq!("pink".parse::<NoiseType>().unwrap(), NoiseType::Pink);
        assert_eq!("Gray".parse::<NoiseType>().unwrap(), NoiseType::Grey);
        assert!("purple".parse::<NoiseType>().is_err());
    }

    #[test]
    fn test_nature_type_parse() {
        for kind in NatureSoundType::ALL {
            assert_eq!(kind.as_str().parse::<NatureSoundType>().unwrap(), kind);
        }
        assert!("lava".parse::<NatureSoundType>().is_err());
    }

    #[test]
    fn test_set_volume_clamps() {
        let mut settings = AudioSettings::default();
        settings.set_volume(VolumeChannel::Noise, 1.7);
        assert_eq!(settings.noise_volume, 1.0);
        settings.set_volume(VolumeChannel::Master, -0.2);
        assert_eq!(settings.master_volume, 0.0);
        settings.set_volume(VolumeChannel::Nature, f32::NAN);
        assert_eq!(settings.nature_volume, 0.0);
    }

    #[test]
    fn test_infinite_volume_is_silent() {
        assert_eq!(clamp_volume(f32::INFINITY), 0.0);
        assert_eq!(clamp_volume(f32::NEG_INFINITY), 0.0);

        let mut settings = AudioSettings::default();
        settings.set_volume(VolumeChannel::Binaural, f32::INFINITY);
        assert_eq!(settings.binaural_volume, 0.0);
    }

    #[test]
    fn test_apply_reports_changes() {
        let mut settings = AudioSettings::default();
        let update = AudioSettingsUpdate::default()
            .noise_type(NoiseType::Brown)
            .noise_volume(0.5)
            .master_volume(0.2);

        let delta = settings.apply(&update);
        assert!(delta.noise_type);
        assert!(!delta.nature_sound);
        // noise volume was already 0.5
        assert_eq!(delta.volumes, vec![VolumeChannel::Master]);
        assert_eq!(settings.noise_type, NoiseType::Brown);
    }

    #[test]
    fn test_apply_empty_update_is_noop() {
        let mut settings = AudioSettings::default();
        let delta = settings.apply(&AudioSettingsUpdate::default());
        assert!(delta.is_empty());
        assert_eq!(settings, AudioSettings::default());
    }

    #[test]
    fn test_settings_camel_case_json() {
        let json = r#"{
            "noiseType": "pink",
            "noiseVolume": 0.8,
            "natureSoundType": "rain",
            "natureSoundVolume": 0.4,
            "binauralFrequency": 6.0,
            "binauralVolume": 0.2,
            "masterVolume": 1.0
        }"#;
        let settings: AudioSettings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.noise_type, NoiseType::Pink);
        assert_eq!(settings.nature_sound, Some(NatureSoundType::Rain));
        assert_eq!(settings.binaural_frequency, 6.0);
    }

    #[test]
    fn test_update_null_nature_turns_channel_off() {
        let update: AudioSettingsUpdate =
            serde_json::from_str(r#"{"natureSoundType": null}"#).unwrap();
        assert_eq!(update.nature_sound, Some(None));

        let untouched: AudioSettingsUpdate = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(untouched.nature_sound, None);
    }
}
