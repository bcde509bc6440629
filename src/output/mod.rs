//! Output Devices
//!
//! An `OutputBackend` opens an `AudioOutput` bound to a mix graph. The
//! engine never talks to a device directly, which keeps the facade testable
//! with the offline backend and lets live playback stay behind the
//! `device` feature.

pub mod offline;

#[cfg(feature = "device")]
pub mod device;

pub use offline::{OfflineBackend, OfflineOutput};

#[cfg(feature = "device")]
pub use device::CpalBackend;

use crate::error::Result;
use crate::graph::SharedGraph;

/// An open connection to something that consumes rendered frames
pub trait AudioOutput: Send {
    /// Rate at which the output consumes frames
    fn sample_rate(&self) -> u32;

    /// Start (or continue) pulling frames from the graph
    fn resume(&mut self) -> Result<()>;

    /// Pause pulling frames without releasing the device
    fn suspend(&mut self) -> Result<()>;

    /// Release the device; the output is unusable afterwards
    fn close(&mut self) -> Result<()>;

    fn is_suspended(&self) -> bool;

    /// True when a device thread pulls frames on its own clock
    fn is_realtime(&self) -> bool;
}

/// Factory for outputs
pub trait OutputBackend: Send {
    /// Open an output attached to `graph`
    ///
    /// `preferred_sample_rate` is a hint; the returned output reports the
    /// rate actually in use. Outputs open suspended.
    fn open(&self, preferred_sample_rate: u32, graph: SharedGraph) -> Result<Box<dyn AudioOutput>>;

    fn name(&self) -> &'static str;
}
