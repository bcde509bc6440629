//! Nature Sound Loading
//!
//! Ambient recordings are fetched, decoded and resampled to the engine rate,
//! then kept per sound type. A missing entry simply means that type cannot
//! play yet.
//!
//! The set carries an epoch. Loads capture the epoch when they start and
//! only write if it is unchanged when they finish, so a load that outlives
//! `dispose` is dropped instead of landing in a torn-down engine.

pub mod decode;
pub mod fetch;

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use sha2::{Digest, Sha256};
use walkdir::WalkDir;

pub use decode::decode_audio;
pub use fetch::{fetch_bytes, SoundLocation};

use crate::engine::buffer::AudioBuffer;
use crate::engine::io::resample;
use crate::error::{AudioError, Result};
use crate::settings::NatureSoundType;

/// Extensions the decoder is built for
pub const SUPPORTED_EXTENSIONS: [&str; 5] = ["wav", "mp3", "ogg", "flac", "oga"];

// ============================================================================
// Loaded Sound
// ============================================================================

/// A decoded recording ready for the mix graph
#[derive(Debug, Clone)]
pub struct LoadedSound {
    pub buffer: Arc<AudioBuffer>,
    /// URL or path the bytes came from
    pub source: String,
    /// SHA-256 of the encoded bytes
    pub digest: [u8; 32],
}

impl LoadedSound {
    pub fn digest_hex(&self) -> String {
        self.digest.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

/// Fetch, decode and resample one recording
///
/// Runs without touching any engine state, so callers can do it off-lock.
pub fn fetch_and_decode(url: &str, sample_rate: u32, timeout: Duration) -> Result<LoadedSound> {
    let bytes = fetch_bytes(url, timeout)?;
    let digest: [u8; 32] = Sha256::digest(&bytes).into();
    let extension = SoundLocation::parse(url).extension();

    let decoded = decode_audio(bytes, extension.as_deref(), url)?;
    let buffer = resample(&decoded, sample_rate);
    if buffer.is_empty() {
        return Err(AudioError::EmptyAudio);
    }

    tracing::debug!(
        source = url,
        seconds = buffer.duration_secs(),
        channels = buffer.channels(),
        "decoded nature sound"
    );

    Ok(LoadedSound {
        buffer: Arc::new(buffer),
        source: url.to_string(),
        digest,
    })
}

// ============================================================================
// Nature Sound Set
// ============================================================================

/// Result of offering a loaded sound to the set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// Same bytes were already loaded for this type
    Unchanged,
    /// The set moved to a newer epoch while the load was running
    Stale,
}

#[derive(Debug, Default)]
pub struct NatureSoundSet {
    sounds: HashMap<NatureSoundType, LoadedSound>,
    epoch: u64,
}

impl NatureSoundSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Drop every sound and invalidate in-flight loads
    pub fn advance_epoch(&mut self) {
        self.sounds.clear();
        self.epoch += 1;
    }

    pub fn get(&self, kind: NatureSoundType) -> Option<Arc<AudioBuffer>> {
        self.sounds.get(&kind).map(|s| s.buffer.clone())
    }

    pub fn entry(&self, kind: NatureSoundType) -> Option<&LoadedSound> {
        self.sounds.get(&kind)
    }

    pub fn contains(&self, kind: NatureSoundType) -> bool {
        self.sounds.contains_key(&kind)
    }

    pub fn loaded_types(&self) -> Vec<NatureSoundType> {
        let mut kinds: Vec<_> = self.sounds.keys().copied().collect();
        kinds.sort();
        kinds
    }

    /// Store a sound if `epoch` is still current
    pub fn insert(&mut self, epoch: u64, kind: NatureSoundType, sound: LoadedSound) -> InsertOutcome {
        if epoch != self.epoch {
            return InsertOutcome::Stale;
        }
        if let Some(existing) = self.sounds.get(&kind) {
            if existing.digest == sound.digest {
                return InsertOutcome::Unchanged;
            }
        }
        self.sounds.insert(kind, sound);
        InsertOutcome::Inserted
    }

    pub fn remove(&mut self, kind: NatureSoundType) -> bool {
        self.sounds.remove(&kind).is_some()
    }

    pub fn len(&self) -> usize {
        self.sounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sounds.is_empty()
    }
}

// ============================================================================
// Discovery
// ============================================================================

/// Map sound types to files under `dir` named after them
///
/// `rain.mp3`, `Ocean.ogg` and `sounds/fire.wav` all match. When several
/// files share a stem the first in file-name order wins.
pub fn discover_nature_sounds(dir: &Path) -> Result<BTreeMap<NatureSoundType, PathBuf>> {
    if !dir.is_dir() {
        return Err(AudioError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} is not a directory", dir.display()),
        )));
    }

    let mut found = BTreeMap::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("skipping unreadable entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let supported = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| SUPPORTED_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        if !supported {
            continue;
        }

        let kind = path
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(|s| s.parse::<NatureSoundType>().ok());
        if let Some(kind) = kind {
            found.entry(kind).or_insert_with(|| path.to_path_buf());
        }
    }

    Ok(found)
}
