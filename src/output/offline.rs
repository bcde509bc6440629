//! Offline output
//!
//! Holds no device. Frames are pulled explicitly through
//! `AudioEngine::render_offline`, which makes this backend suitable for
//! rendering to files and for tests.

use super::{AudioOutput, OutputBackend};
use crate::engine::buffer::DEFAULT_SAMPLE_RATE;
use crate::error::{AudioError, Result};
use crate::graph::SharedGraph;

#[derive(Debug, Clone, Default)]
pub struct OfflineBackend {
    sample_rate: Option<u32>,
}

impl OfflineBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Force a sample rate regardless of the caller's preference
    pub fn with_sample_rate(sample_rate: u32) -> Self {
        Self {
            sample_rate: Some(sample_rate),
        }
    }
}

impl OutputBackend for OfflineBackend {
    fn open(&self, preferred_sample_rate: u32, _graph: SharedGraph) -> Result<Box<dyn AudioOutput>> {
        let sample_rate = match self.sample_rate {
            Some(rate) => rate,
            None if preferred_sample_rate > 0 => preferred_sample_rate,
            None => DEFAULT_SAMPLE_RATE,
        };
        if sample_rate == 0 {
            return Err(AudioError::InvalidSampleRate { sample_rate });
        }
        Ok(Box::new(OfflineOutput::new(sample_rate)))
    }

    fn name(&self) -> &'static str {
        "offline"
    }
}

#[derive(Debug)]
pub struct OfflineOutput {
    sample_rate: u32,
    suspended: bool,
    closed: bool,
}

impl OfflineOutput {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            suspended: true,
            closed: false,
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(AudioError::DeviceUnavailable {
                reason: "offline output has been closed".to_string(),
            });
        }
        Ok(())
    }
}

impl AudioOutput for OfflineOutput {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn resume(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.suspended = false;
        Ok(())
    }

    fn suspend(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.suspended = true;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        self.suspended = true;
        Ok(())
    }

    fn is_suspended(&self) -> bool {
        self.suspended
    }

    fn is_realtime(&self) -> bool {
        false
    }
}
