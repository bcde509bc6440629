//! Audio Engine Module
//!
//! - Sample buffers and level analysis
//! - Lifecycle state machine
//! - The engine facade and its shared handle
//! - WAV export and resampling

pub mod buffer;
pub mod facade;
pub mod handle;
pub mod io;
pub mod state;

pub use buffer::{AudioBuffer, ChannelLayout, DEFAULT_SAMPLE_RATE};
pub use facade::{AudioEngine, NatureLoadTicket};
pub use handle::EngineHandle;
pub use io::{export_wav, generate_test_tone, ExportFormat};
pub use state::EngineState;
