//! Engine lifecycle states
//!
//! ```text
//! Uninitialized ──initialize──> Stopped ──play──> Playing
//!                                  ^                 │
//!                                  └──────stop───────┘
//! any ──dispose──> Disposed (terminal)
//! ```

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineState {
    /// No output or graph exists yet
    #[default]
    Uninitialized,
    /// Output open, no channel playing
    Stopped,
    /// Channels are running
    Playing,
    /// Output released; every further operation is rejected
    Disposed,
}

impl EngineState {
    pub fn is_initialized(&self) -> bool {
        matches!(self, EngineState::Stopped | EngineState::Playing)
    }
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineState::Uninitialized => write!(f, "Uninitialized"),
            EngineState::Stopped => write!(f, "Stopped"),
            EngineState::Playing => write!(f, "Playing"),
            EngineState::Disposed => write!(f, "Disposed"),
        }
    }
}
