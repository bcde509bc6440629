//! Sample Buffer Management
//!
//! Provides the decoded/generated sample buffer type shared by the noise
//! generator, the nature sound loader and the mix graph.

use crate::error::{AudioError, Result};

// ============================================================================
// Constants
// ============================================================================

/// Sample rate used when no output device dictates one
pub const DEFAULT_SAMPLE_RATE: u32 = 48000;

// ============================================================================
// Helper Functions
// ============================================================================

/// Convert linear amplitude to decibels
///
/// Returns -f32::INFINITY for zero input.
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    if linear <= 0.0 {
        f32::NEG_INFINITY
    } else {
        20.0 * linear.log10()
    }
}

/// Calculate the RMS level of a buffer in dB
///
/// # Returns
/// RMS level in dB. Returns -f32::INFINITY for empty or silent buffers.
pub fn calculate_rms(buffer: &AudioBuffer) -> f32 {
    let total_samples = buffer.num_channels() * buffer.num_samples();
    if total_samples == 0 {
        return f32::NEG_INFINITY;
    }

    let sum_squares: f64 = buffer
        .samples
        .iter()
        .flat_map(|channel| channel.iter())
        .map(|&s| (s as f64) * (s as f64))
        .sum();

    let rms = (sum_squares / total_samples as f64).sqrt() as f32;
    linear_to_db(rms)
}

/// Calculate the peak absolute sample value (linear)
pub fn calculate_peak(buffer: &AudioBuffer) -> f32 {
    buffer
        .samples
        .iter()
        .flat_map(|channel| channel.iter())
        .map(|&s| s.abs())
        .fold(0.0_f32, f32::max)
}

/// Ratio of samples that are not exactly zero
///
/// # Returns
/// Value in [0, 1]. Returns 0.0 for empty buffers.
pub fn nonzero_ratio(buffer: &AudioBuffer) -> f32 {
    let total_samples = buffer.num_channels() * buffer.num_samples();
    if total_samples == 0 {
        return 0.0;
    }

    let nonzero = buffer
        .samples
        .iter()
        .flat_map(|channel| channel.iter())
        .filter(|&&s| s != 0.0)
        .count();

    nonzero as f32 / total_samples as f32
}

// ============================================================================
// Channel Layout
// ============================================================================

/// Audio channel configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChannelLayout {
    /// Single channel (mono)
    Mono,
    /// Two channels (stereo: left, right)
    #[default]
    Stereo,
}

impl ChannelLayout {
    /// Returns the number of channels for this layout
    pub fn num_channels(&self) -> usize {
        match self {
            ChannelLayout::Mono => 1,
            ChannelLayout::Stereo => 2,
        }
    }

    /// Create a ChannelLayout from a channel count
    pub fn from_count(count: usize) -> Option<Self> {
        match count {
            1 => Some(ChannelLayout::Mono),
            2 => Some(ChannelLayout::Stereo),
            _ => None,
        }
    }
}

// ============================================================================
// Audio Buffer
// ============================================================================

/// Non-interleaved 32-bit float sample buffer
///
/// Each channel is a separate `Vec<f32>`. Buffers handed to the mix graph
/// are wrapped in `Arc` and never mutated afterwards.
///
/// # Example
/// ```
/// use focus_audio::engine::buffer::{AudioBuffer, ChannelLayout};
///
/// let buffer = AudioBuffer::new(48000, ChannelLayout::Stereo, 48000);
/// assert_eq!(buffer.channels(), 2);
/// assert_eq!(buffer.len(), 48000);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    /// Sample data: outer Vec is channels, inner Vec is samples
    pub samples: Vec<Vec<f32>>,
    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl AudioBuffer {
    /// Create a zeroed buffer
    ///
    /// # Arguments
    /// * `num_samples` - Number of samples per channel
    /// * `layout` - Channel configuration (Mono or Stereo)
    /// * `sample_rate` - Sample rate in Hz
    pub fn new(num_samples: usize, layout: ChannelLayout, sample_rate: u32) -> Self {
        Self {
            samples: vec![vec![0.0_f32; num_samples]; layout.num_channels()],
            sample_rate,
        }
    }

    /// Build a buffer from per-channel vectors
    ///
    /// # Errors
    /// * `UnsupportedFormat` - more than two channels, or channels of unequal length
    pub fn from_channels(samples: Vec<Vec<f32>>, sample_rate: u32) -> Result<Self> {
        if ChannelLayout::from_count(samples.len()).is_none() {
            return Err(AudioError::UnsupportedFormat {
                format: format!("{}-channel audio (only mono/stereo supported)", samples.len()),
            });
        }
        let len = samples[0].len();
        if samples.iter().any(|ch| ch.len() != len) {
            return Err(AudioError::UnsupportedFormat {
                format: "channels of unequal length".to_string(),
            });
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Create a buffer from interleaved sample data
    ///
    /// # Arguments
    /// * `interleaved` - Interleaved sample data (L, R, L, R, ... for stereo)
    /// * `layout` - Channel configuration
    /// * `sample_rate` - Sample rate in Hz
    pub fn from_interleaved(
        interleaved: &[f32],
        layout: ChannelLayout,
        sample_rate: u32,
    ) -> Result<Self> {
        let num_channels = layout.num_channels();

        if interleaved.len() % num_channels != 0 {
            return Err(AudioError::UnsupportedFormat {
                format: format!(
                    "interleaved length {} is not divisible by channel count {}",
                    interleaved.len(),
                    num_channels
                ),
            });
        }

        let num_samples = interleaved.len() / num_channels;
        let mut samples = vec![Vec::with_capacity(num_samples); num_channels];

        for frame in interleaved.chunks_exact(num_channels) {
            for (ch, &sample) in frame.iter().enumerate() {
                samples[ch].push(sample);
            }
        }

        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Convert the buffer to interleaved format
    pub fn to_interleaved(&self) -> Vec<f32> {
        let num_channels = self.channels();
        let num_samples = self.len();

        let mut interleaved = Vec::with_capacity(num_channels * num_samples);
        for sample_idx in 0..num_samples {
            for channel in &self.samples {
                interleaved.push(channel[sample_idx]);
            }
        }

        interleaved
    }

    /// Get the number of channels
    #[inline]
    pub fn channels(&self) -> usize {
        self.samples.len()
    }

    /// Alias for channels()
    #[inline]
    pub fn num_channels(&self) -> usize {
        self.channels()
    }

    /// Get the number of samples per channel
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.first().map(|ch| ch.len()).unwrap_or(0)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Alias for len()
    #[inline]
    pub fn num_samples(&self) -> usize {
        self.len()
    }

    /// Get the duration in seconds
    #[inline]
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.len() as f64 / self.sample_rate as f64
    }

    /// Get immutable access to a channel's samples
    ///
    /// # Panics
    /// Panics if the channel index is out of bounds
    #[inline]
    pub fn channel(&self, index: usize) -> &[f32] {
        &self.samples[index]
    }

    /// Get mutable access to a channel's samples
    ///
    /// # Panics
    /// Panics if the channel index is out of bounds
    #[inline]
    pub fn channel_mut(&mut self, index: usize) -> &mut [f32] {
        &mut self.samples[index]
    }

    /// Stereo frame at `index`; mono buffers feed both sides
    #[inline]
    pub fn frame(&self, index: usize) -> (f32, f32) {
        match self.samples.as_slice() {
            [mono] => {
                let s = mono.get(index).copied().unwrap_or(0.0);
                (s, s)
            }
            [left, right, ..] => (
                left.get(index).copied().unwrap_or(0.0),
                right.get(index).copied().unwrap_or(0.0),
            ),
            [] => (0.0, 0.0),
        }
    }

    /// Check that every sample is finite
    pub fn is_finite(&self) -> bool {
        self.samples
            .iter()
            .flat_map(|ch| ch.iter())
            .all(|s| s.is_finite())
    }
}
