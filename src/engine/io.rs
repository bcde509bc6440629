//! WAV export and resampling
//!
//! Rendered mixes are written with hound at 16, 24 or 32-bit depth.
//! Decoded nature sounds are brought to the engine rate with linear
//! interpolation, which is plenty for ambience loops.

use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};

use crate::engine::buffer::{AudioBuffer, ChannelLayout};
use crate::error::{AudioError, Result};

/// Export format configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportFormat {
    /// Bit depth: 16, 24, or 32 (float)
    pub bit_depth: u16,
}

impl Default for ExportFormat {
    fn default() -> Self {
        ExportFormat { bit_depth: 16 }
    }
}

impl ExportFormat {
    pub fn new(bit_depth: u16) -> Self {
        ExportFormat { bit_depth }
    }
}

fn wav_error(e: hound::Error) -> AudioError {
    match e {
        hound::Error::IoError(io) => AudioError::Io(io),
        other => AudioError::UnsupportedFormat {
            format: other.to_string(),
        },
    }
}

/// Write a buffer to a WAV file at the buffer's own sample rate
///
/// # Errors
/// * `UnsupportedFormat` - bit depth other than 16, 24 or 32
/// * `Io` - the file cannot be written
pub fn export_wav(buffer: &AudioBuffer, path: &Path, format: ExportFormat) -> Result<()> {
    if !matches!(format.bit_depth, 16 | 24 | 32) {
        return Err(AudioError::UnsupportedFormat {
            format: format!("{}-bit audio (only 16, 24, 32 supported)", format.bit_depth),
        });
    }
    if buffer.is_empty() {
        return Err(AudioError::EmptyAudio);
    }

    let spec = WavSpec {
        channels: buffer.num_channels() as u16,
        sample_rate: buffer.sample_rate,
        bits_per_sample: format.bit_depth,
        sample_format: if format.bit_depth == 32 {
            SampleFormat::Float
        } else {
            SampleFormat::Int
        },
    };

    let mut writer = WavWriter::create(path, spec).map_err(wav_error)?;
    for sample in buffer.to_interleaved() {
        match format.bit_depth {
            16 => {
                let scaled = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
                writer.write_sample(scaled).map_err(wav_error)?;
            }
            24 => {
                // 24-bit stored as i32 in hound
                let scaled = (sample * 8388607.0).clamp(-8388608.0, 8388607.0) as i32;
                writer.write_sample(scaled).map_err(wav_error)?;
            }
            _ => writer.write_sample(sample).map_err(wav_error)?,
        }
    }
    writer.finalize().map_err(wav_error)?;

    tracing::info!(
        path = %path.display(),
        seconds = buffer.duration_secs(),
        bit_depth = format.bit_depth,
        "exported wav"
    );
    Ok(())
}

/// Generate a sine tone, mono or stereo
pub fn generate_test_tone(
    frequency: f32,
    duration_secs: f32,
    sample_rate: u32,
    layout: ChannelLayout,
) -> AudioBuffer {
    let num_samples = (duration_secs * sample_rate as f32) as usize;
    let mut buffer = AudioBuffer::new(num_samples, layout, sample_rate);
    let angular_freq = 2.0 * std::f32::consts::PI * frequency / sample_rate as f32;

    for channel in buffer.samples.iter_mut() {
        for (i, sample) in channel.iter_mut().enumerate() {
            *sample = (angular_freq * i as f32).sin();
        }
    }

    buffer
}

/// Resample every channel to `target_rate`
pub fn resample(buffer: &AudioBuffer, target_rate: u32) -> AudioBuffer {
    if buffer.sample_rate == target_rate || buffer.sample_rate == 0 {
        return buffer.clone();
    }
    AudioBuffer {
        samples: resample_channels(&buffer.samples, buffer.sample_rate, target_rate),
        sample_rate: target_rate,
    }
}

fn resample_channels(channels: &[Vec<f32>], source_rate: u32, target_rate: u32) -> Vec<Vec<f32>> {
    let ratio = target_rate as f64 / source_rate as f64;

    channels
        .iter()
        .map(|channel| resample_linear(channel, ratio))
        .collect()
}

/// Linear interpolation resampling
fn resample_linear(samples: &[f32], ratio: f64) -> Vec<f32> {
    if samples.is_empty() {
        return Vec::new();
    }

    let source_len = samples.len();
    let target_len = ((source_len as f64) * ratio).ceil() as usize;
    let mut output = Vec::with_capacity(target_len);

    for i in 0..target_len {
        let src_pos = i as f64 / ratio;
        let src_idx = src_pos.floor() as usize;
        let frac = (src_pos - src_idx as f64) as f32;

        let sample = if src_idx + 1 < source_len {
            samples[src_idx] * (1.0 - frac) + samples[src_idx + 1] * frac
        } else if src_idx < source_len {
            samples[src_idx]
        } else {
            0.0
        };

        output.push(sample);
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_export_and_read_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        let buffer = generate_test_tone(440.0, 0.25, 8000, ChannelLayout::Stereo);

        export_wav(&buffer, &path, ExportFormat::new(16)).unwrap();

        let reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 2);
        assert_eq!(spec.sample_rate, 8000);
        assert_eq!(reader.len() as usize, buffer.len() * 2);
    }

    #[test]
    fn test_export_float() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        let buffer = generate_test_tone(440.0, 0.1, 8000, ChannelLayout::Mono);
        export_wav(&buffer, &path, ExportFormat::new(32)).unwrap();
        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().sample_format, SampleFormat::Float);
    }

    #[test]
    fn test_export_rejects_bad_depth() {
        let dir = tempdir().unwrap();
        let buffer = generate_test_tone(440.0, 0.1, 8000, ChannelLayout::Mono);
        let err = export_wav(&buffer, &dir.path().join("x.wav"), ExportFormat::new(12)).unwrap_err();
        assert_eq!(err.error_code(), "UNSUPPORTED_FORMAT");
    }

    #[test]
    fn test_resample_doubles_length() {
        let buffer = generate_test_tone(100.0, 0.5, 8000, ChannelLayout::Mono);
        let up = resample(&buffer, 16000);
        assert_eq!(up.sample_rate, 16000);
        assert_eq!(up.len(), buffer.len() * 2);
    }

    #[test]
    fn test_resample_same_rate_is_identity() {
        let buffer = generate_test_tone(100.0, 0.1, 8000, ChannelLayout::Stereo);
        assert_eq!(resample(&buffer, 8000), buffer);
    }
}
