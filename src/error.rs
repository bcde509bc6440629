//! Error handling for focus-audio
//!
//! Every failure in the engine is terminal for the operation that raised it
//! and never for the process. The worst outcome is silence.

use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, AudioError>;

/// Main error type for engine operations
#[derive(Error, Debug)]
pub enum AudioError {
    // Device Errors
    #[error("Output device unavailable: {reason}")]
    DeviceUnavailable { reason: String },

    #[error("Output is driven by a real-time device and cannot be rendered offline")]
    OutputBusy,

    #[error("Invalid sample rate: {sample_rate} Hz")]
    InvalidSampleRate { sample_rate: u32 },

    // Lifecycle Errors
    #[error("Engine is not initialized")]
    NotInitialized,

    #[error("Engine has been disposed")]
    Disposed,

    // Parameter Errors
    #[error("Invalid frequency: {frequency} Hz ({reason})")]
    InvalidFrequency { frequency: f32, reason: String },

    #[error("Unknown {kind}: '{value}'")]
    UnknownVariant { kind: &'static str, value: String },

    // Nature Sound Errors
    #[error("Failed to fetch '{url}': {reason}")]
    Fetch { url: String, reason: String },

    #[error("Failed to decode audio from '{source_name}': {reason}")]
    Decode { source_name: String, reason: String },

    #[error("Audio contains no samples")]
    EmptyAudio,

    #[error("Unsupported audio format: {format}")]
    UnsupportedFormat { format: String },

    // Configuration Errors
    #[error("Invalid configuration: {reason}")]
    Config { reason: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AudioError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            AudioError::DeviceUnavailable { .. } => "DEVICE_UNAVAILABLE",
            AudioError::OutputBusy => "OUTPUT_BUSY",
            AudioError::InvalidSampleRate { .. } => "INVALID_SAMPLE_RATE",
            AudioError::NotInitialized => "NOT_INITIALIZED",
            AudioError::Disposed => "DISPOSED",
            AudioError::InvalidFrequency { .. } => "INVALID_FREQUENCY",
            AudioError::UnknownVariant { .. } => "UNKNOWN_VARIANT",
            AudioError::Fetch { .. } => "FETCH_FAILED",
            AudioError::Decode { .. } => "DECODE_FAILED",
            AudioError::EmptyAudio => "EMPTY_AUDIO",
            AudioError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            AudioError::Config { .. } => "CONFIG_ERROR",
            AudioError::Io(_) => "IO_ERROR",
            AudioError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Check if retrying the same call could succeed
    ///
    /// Nothing in the engine retries on its own; this only tells the caller
    /// whether an explicit retry is worth attempting.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AudioError::DeviceUnavailable { .. }
                | AudioError::Fetch { .. }
                | AudioError::NotInitialized
                | AudioError::Io(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = AudioError::Fetch {
            url: "https://example.com/rain.mp3".to_string(),
            reason: "timeout".to_string(),
        };
        assert_eq!(err.error_code(), "FETCH_FAILED");
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_disposed_is_terminal() {
        let err = AudioError::Disposed;
        assert_eq!(err.error_code(), "DISPOSED");
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_display_includes_context() {
        let err = AudioError::InvalidFrequency {
            frequency: -3.0,
            reason: "must be positive".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("-3"));
        assert!(msg.contains("must be positive"));
    }
}
