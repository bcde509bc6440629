//! Compressed audio decoding via symphonia

use std::io::Cursor;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::default::{get_codecs, get_probe};

use crate::engine::buffer::AudioBuffer;
use crate::error::{AudioError, Result};

/// Decode an in-memory file into a mono or stereo buffer
///
/// Channels beyond the first two are dropped.
///
/// # Arguments
/// * `bytes` - Complete encoded file
/// * `extension` - Optional container hint ("mp3", "ogg", ...)
/// * `source_name` - Used in error messages only
pub fn decode_audio(bytes: Vec<u8>, extension: Option<&str>, source_name: &str) -> Result<AudioBuffer> {
    let decode_error = |reason: String| AudioError::Decode {
        source_name: source_name.to_string(),
        reason,
    };

    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());
    let mut hint = Hint::new();
    if let Some(ext) = extension {
        hint.with_extension(ext);
    }

    let probed = get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| decode_error(e.to_string()))?;
    let mut format = probed.format;

    let track = format
        .default_track()
        .ok_or_else(|| decode_error("no default track".to_string()))?;
    let track_id = track.id;
    let codec_params = track.codec_params.clone();

    let mut decoder = get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| decode_error(e.to_string()))?;
    let sample_rate = codec_params
        .sample_rate
        .ok_or_else(|| decode_error("unknown sample rate".to_string()))?;

    let mut channels: Vec<Vec<f32>> = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(_)) => break,
            Err(SymphoniaError::ResetRequired) => {
                decoder.reset();
                continue;
            }
            Err(e) => return Err(decode_error(e.to_string())),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(msg)) => {
                tracing::debug!(source = source_name, "skipping corrupt packet: {}", msg);
                continue;
            }
            Err(e) => return Err(decode_error(e.to_string())),
        };

        let spec = *decoded.spec();
        let count = spec.channels.count().max(1);
        if channels.is_empty() {
            channels = vec![Vec::new(); count.min(2)];
        }

        let needed = decoded.capacity() * count;
        if sample_buf.as_ref().map_or(true, |b| b.capacity() < needed) {
            sample_buf = Some(SampleBuffer::<f32>::new(decoded.capacity() as u64, spec));
        }
        let Some(sbuf) = sample_buf.as_mut() else {
            continue;
        };
        sbuf.copy_interleaved_ref(decoded);
        for frame in sbuf.samples().chunks_exact(count) {
            for (ch, out) in channels.iter_mut().enumerate() {
                out.push(frame[ch]);
            }
        }
    }

    if channels.iter().all(|ch| ch.is_empty()) {
        return Err(AudioError::EmptyAudio);
    }

    AudioBuffer::from_channels(channels, sample_rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::buffer::ChannelLayout;
    use crate::engine::io::{export_wav, generate_test_tone, ExportFormat};
    use tempfile::tempdir;

    #[test]
    fn test_decode_wav() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        let tone = generate_test_tone(220.0, 0.5, 22050, ChannelLayout::Stereo);
        export_wav(&tone, &path, ExportFormat::new(16)).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        let decoded = decode_audio(bytes, Some("wav"), "tone.wav").unwrap();
        assert_eq!(decoded.sample_rate, 22050);
        assert_eq!(decoded.channels(), 2);
        assert_eq!(decoded.len(), tone.len());
    }

    #[test]
    fn test_decode_garbage_fails() {
        let err = decode_audio(vec![0x13; 512], None, "noise.bin").unwrap_err();
        assert_eq!(err.error_code(), "DECODE_FAILED");
    }
}
