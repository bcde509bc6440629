//! CLI Module
//!
//! Command-line interface for rendering and playing focus mixes.

pub mod commands;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::settings::{AudioSettingsUpdate, NatureSoundType, NoiseType};

/// Focus Audio - noise, nature sounds and binaural beats for concentration
#[derive(Parser, Debug)]
#[command(name = "focus-audio")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render the mix to a WAV file
    #[command(name = "render")]
    Render {
        /// Output WAV path
        #[arg(short, long)]
        out: PathBuf,

        /// Length of the render in seconds
        #[arg(short, long, default_value_t = 10.0)]
        seconds: f64,

        /// WAV bit depth: 16, 24 or 32 (float)
        #[arg(long, default_value_t = 16)]
        bit_depth: u16,

        #[command(flatten)]
        mix: MixArgs,
    },

    /// Play the mix on the default output device
    #[cfg(feature = "device")]
    #[command(name = "play")]
    Play {
        /// How long to play, in seconds
        #[arg(short, long, default_value_t = 60.0)]
        seconds: f64,

        #[command(flatten)]
        mix: MixArgs,
    },

    /// List binaural beat presets
    #[command(name = "presets")]
    Presets,

    /// Print octave band energies of generated noise
    #[command(name = "analyze")]
    Analyze {
        /// Only analyze this noise color
        #[arg(long)]
        noise: Option<NoiseType>,

        /// Length of noise to analyze, in seconds
        #[arg(short, long, default_value_t = 4.0)]
        seconds: f64,

        #[arg(long, default_value_t = crate::engine::DEFAULT_SAMPLE_RATE)]
        sample_rate: u32,

        /// Seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Find nature sound files in a directory
    #[command(name = "discover")]
    Discover {
        /// Directory to search
        dir: PathBuf,
    },
}

/// Options shared by commands that build a mix
#[derive(Args, Debug, Clone, Default)]
pub struct MixArgs {
    /// Engine config file (JSON)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Settings file (JSON), replacing the config's settings
    #[arg(long)]
    pub settings: Option<PathBuf>,

    /// Noise color: white, pink, brown, grey
    #[arg(long)]
    pub noise: Option<NoiseType>,

    /// Nature sound type, e.g. rain or ocean
    #[arg(long)]
    pub nature: Option<NatureSoundType>,

    /// Where to load the nature sound from (URL or file path)
    #[arg(long, requires = "nature")]
    pub nature_source: Option<String>,

    /// Binaural beat frequency in Hz
    #[arg(long)]
    pub binaural: Option<f32>,

    #[arg(long)]
    pub noise_volume: Option<f32>,

    #[arg(long)]
    pub nature_volume: Option<f32>,

    #[arg(long)]
    pub binaural_volume: Option<f32>,

    #[arg(long)]
    pub master_volume: Option<f32>,

    /// Seed for noise generation
    #[arg(long)]
    pub seed: Option<u64>,
}

impl MixArgs {
    /// Settings overrides given on the command line
    pub fn settings_update(&self) -> AudioSettingsUpdate {
        AudioSettingsUpdate {
            noise_type: self.noise,
            noise_volume: self.noise_volume,
            nature_sound: self.nature.map(Some),
            nature_volume: self.nature_volume,
            binaural_frequency: self.binaural,
            binaural_volume: self.binaural_volume,
            master_volume: self.master_volume,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_render() {
        let cli = Cli::parse_from([
            "focus-audio",
            "render",
            "--out",
            "mix.wav",
            "--noise",
            "pink",
            "--binaural",
            "6",
        ]);
        match cli.command {
            Some(Commands::Render { out, seconds, mix, .. }) => {
                assert_eq!(out, PathBuf::from("mix.wav"));
                assert_eq!(seconds, 10.0);
                assert_eq!(mix.noise, Some(NoiseType::Pink));
                assert_eq!(mix.binaural, Some(6.0));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_noise_is_rejected() {
        let result = Cli::try_parse_from(["focus-audio", "render", "--out", "x.wav", "--noise", "purple"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_nature_source_requires_nature() {
        let result = Cli::try_parse_from([
            "focus-audio",
            "render",
            "--out",
            "x.wav",
            "--nature-source",
            "rain.wav",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_settings_update_from_flags() {
        let mix = MixArgs {
            nature: Some(NatureSoundType::Rain),
            master_volume: Some(0.4),
            ..MixArgs::default()
        };
        let update = mix.settings_update();
        assert_eq!(update.nature_sound, Some(Some(NatureSoundType::Rain)));
        assert_eq!(update.master_volume, Some(0.4));
        assert!(update.noise_type.is_none());
    }
}
