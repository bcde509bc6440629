//! Signal Generators
//!
//! Sample producers feeding the mix graph:
//! - Noise buffer synthesis (white, pink, brown, grey)
//! - Sine oscillators and the binaural beat pair

pub mod noise;
pub mod oscillator;

use std::fmt;

use uuid::Uuid;

pub use noise::{NoiseBufferSet, NoiseGenerator, NOISE_BUFFER_SECS};
pub use oscillator::{
    BinauralPair, BinauralPreset, Oscillator, BINAURAL_PRESETS, CARRIER_FREQUENCY,
};

/// Identity of one generator instance
///
/// A fresh id is minted whenever a source or oscillator is created, so an
/// unchanged id proves a generator was reused rather than recreated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GeneratorId(Uuid);

impl GeneratorId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for GeneratorId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for GeneratorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
