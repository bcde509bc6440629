//! Gain Node
//!
//! Volume stage with a perceptual curve. The stored value is linear in
//! [0, 1]; the multiplier applied to samples is its cube, which tracks
//! perceived loudness far better than a straight line.

use crate::settings::clamp_volume;

/// Map a user-facing volume to the applied multiplier
#[inline]
pub fn perceptual_gain(value: f32) -> f32 {
    let v = clamp_volume(value);
    v * v * v
}

/// One volume control in the mix graph
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GainNode {
    value: f32,
    applied: f32,
}

impl GainNode {
    pub fn new(value: f32) -> Self {
        let value = clamp_volume(value);
        Self {
            value,
            applied: perceptual_gain(value),
        }
    }

    /// Set the volume; out-of-range input is clamped
    pub fn set_value(&mut self, value: f32) {
        self.value = clamp_volume(value);
        self.applied = perceptual_gain(self.value);
    }

    /// Clamped volume as set by the caller
    pub fn value(&self) -> f32 {
        self.value
    }

    /// Multiplier applied to samples
    pub fn applied(&self) -> f32 {
        self.applied
    }
}

impl Default for GainNode {
    fn default() -> Self {
        Self::new(1.0)
    }
}
