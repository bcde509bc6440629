//! Source retrieval for nature sounds
//!
//! `http(s)://` sources go through a blocking reqwest client (feature
//! `remote`); `file://` URLs and bare paths are read from disk.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{AudioError, Result};

/// Where a nature sound comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SoundLocation {
    Remote(String),
    File(PathBuf),
}

impl SoundLocation {
    pub fn parse(url: &str) -> Self {
        let trimmed = url.trim();
        let lower = trimmed.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            SoundLocation::Remote(trimmed.to_string())
        } else if let Some(path) = trimmed.strip_prefix("file://") {
            SoundLocation::File(PathBuf::from(path))
        } else {
            SoundLocation::File(PathBuf::from(trimmed))
        }
    }

    /// File extension, used as a decoder hint
    pub fn extension(&self) -> Option<String> {
        let path = match self {
            SoundLocation::Remote(url) => {
                let without_query = url.split(['?', '#']).next().unwrap_or(url);
                Path::new(without_query).to_path_buf()
            }
            SoundLocation::File(path) => path.clone(),
        };
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
    }
}

/// Read the raw bytes of a sound source
///
/// # Errors
/// * `Fetch` - network failure, non-success status, or missing file
pub fn fetch_bytes(url: &str, timeout: Duration) -> Result<Vec<u8>> {
    match SoundLocation::parse(url) {
        SoundLocation::Remote(remote) => fetch_remote(&remote, timeout),
        SoundLocation::File(path) => std::fs::read(&path).map_err(|e| AudioError::Fetch {
            url: url.to_string(),
            reason: e.to_string(),
        }),
    }
}

#[cfg(feature = "remote")]
fn fetch_remote(url: &str, timeout: Duration) -> Result<Vec<u8>> {
    let fetch_error = |reason: String| AudioError::Fetch {
        url: url.to_string(),
        reason,
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| fetch_error(e.to_string()))?;

    let response = client.get(url).send().map_err(|e| {
        if e.is_timeout() {
            fetch_error(format!("timed out after {}ms", timeout.as_millis()))
        } else {
            fetch_error(e.to_string())
        }
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(fetch_error(format!("HTTP {}", status)));
    }

    let bytes = response.bytes().map_err(|e| fetch_error(e.to_string()))?;
    Ok(bytes.to_vec())
}

#[cfg(not(feature = "remote"))]
fn fetch_remote(url: &str, _timeout: Duration) -> Result<Vec<u8>> {
    Err(AudioError::Fetch {
        url: url.to_string(),
        reason: "remote sources require the `remote` feature".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_locations() {
        assert_eq!(
            SoundLocation::parse("https://cdn.example.com/rain.mp3"),
            SoundLocation::Remote("https://cdn.example.com/rain.mp3".to_string())
        );
        assert_eq!(
            SoundLocation::parse("file:///tmp/rain.ogg"),
            SoundLocation::File(PathBuf::from("/tmp/rain.ogg"))
        );
        assert_eq!(
            SoundLocation::parse("sounds/fire.wav"),
            SoundLocation::File(PathBuf::from("sounds/fire.wav"))
        );
    }

    #[test]
    fn test_extension_hint_ignores_query() {
        let loc = SoundLocation::parse("https://cdn.example.com/ocean.MP3?token=abc");
        assert_eq!(loc.extension().as_deref(), Some("mp3"));
    }

    #[test]
    fn test_missing_file_is_fetch_error() {
        let err = fetch_bytes("/definitely/not/here.wav", Duration::from_secs(1)).unwrap_err();
        assert_eq!(err.error_code(), "FETCH_FAILED");
    }
}
