//! Focus Audio - Ambient Sound Engine
//!
//! Mixes three layers of background audio for concentration:
//! 1. Colored noise - looped white, pink, brown or grey noise buffers
//! 2. Nature sounds - fetched and decoded ambient recordings
//! 3. Binaural beats - a carrier tone in one ear and a detuned tone in the other
//!
//! # Architecture
//!
//! ```text
//! AudioEngine ──owns──> OutputBackend ──opens──> AudioOutput
//!      │                                              │
//!      └──────owns──> MixGraph <──────renders─────────┘
//! ```
//!
//! The engine moves through `EngineState` (uninitialized, stopped, playing,
//! disposed). `EngineHandle` wraps it for use from several threads.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod generator;
pub mod graph;
pub mod nature;
pub mod output;
pub mod settings;

pub use config::EngineConfig;
pub use engine::{AudioBuffer, AudioEngine, EngineHandle, EngineState};
pub use error::{AudioError, Result};
pub use settings::{
    AudioSettings, AudioSettingsUpdate, NatureSoundType, NoiseType, SettingsDelta, VolumeChannel,
};
