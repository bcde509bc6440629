//! Noise Generation Tests
//!
//! Buffer shape and spectral color of the four noise types.

use focus_audio::analysis::analyze_buffer;
use focus_audio::engine::buffer::nonzero_ratio;
use focus_audio::generator::{NoiseBufferSet, NoiseGenerator, NOISE_BUFFER_SECS};
use focus_audio::NoiseType;
use test_case::test_case;

const SAMPLE_RATE: u32 = 48000;
const FFT_SIZE: usize = 4096;

fn noise(noise_type: NoiseType) -> focus_audio::AudioBuffer {
    NoiseGenerator::with_seed(42)
        .generate(noise_type, SAMPLE_RATE, NOISE_BUFFER_SECS)
        .unwrap()
}

// === Buffer Shape ===

#[test_case(NoiseType::White ; "white")]
#[test_case(NoiseType::Pink ; "pink")]
#[test_case(NoiseType::Brown ; "brown")]
#[test_case(NoiseType::Grey ; "grey")]
fn test_buffer_is_two_seconds_of_stereo(noise_type: NoiseType) {
    let buffer = noise(noise_type);
    assert_eq!(buffer.channels(), 2);
    assert_eq!(buffer.len(), 2 * SAMPLE_RATE as usize);
    assert_eq!(buffer.sample_rate, SAMPLE_RATE);
    assert!(buffer.is_finite());
}

#[test_case(NoiseType::White ; "white")]
#[test_case(NoiseType::Pink ; "pink")]
#[test_case(NoiseType::Brown ; "brown")]
#[test_case(NoiseType::Grey ; "grey")]
fn test_buffer_is_not_silent(noise_type: NoiseType) {
    let buffer = noise(noise_type);
    let ratio = nonzero_ratio(&buffer);
    assert!(ratio >= 0.99, "{} noise only {:.3} nonzero", noise_type, ratio);
}

#[test]
fn test_buffer_set_has_every_color() {
    let mut generator = NoiseGenerator::with_seed(1);
    let set = NoiseBufferSet::generate(&mut generator, 8000, NOISE_BUFFER_SECS).unwrap();
    assert_eq!(set.len(), 4);
    for noise_type in NoiseType::ALL {
        let buffer = set.get(noise_type).unwrap();
        assert_eq!(buffer.len(), 16000);
    }
}

#[test]
fn test_same_seed_same_noise() {
    let a = noise(NoiseType::Pink);
    let b = noise(NoiseType::Pink);
    assert_eq!(a, b);
}

// === Spectral Color ===

#[test]
fn test_white_noise_is_flat() {
    let report = analyze_buffer(&noise(NoiseType::White), FFT_SIZE, 62.5);
    assert!(
        report.slope_db_per_octave.abs() < 0.75,
        "white slope {:.2} dB/octave",
        report.slope_db_per_octave
    );
}

#[test]
fn test_pink_noise_falls_about_three_db_per_octave() {
    let report = analyze_buffer(&noise(NoiseType::Pink), FFT_SIZE, 62.5);
    assert!(report.is_monotonically_decreasing(), "bands: {:?}", report.bands);
    assert!(
        (-4.5..-1.5).contains(&report.slope_db_per_octave),
        "pink slope {:.2} dB/octave",
        report.slope_db_per_octave
    );
}

#[test]
fn test_brown_noise_falls_faster_than_pink() {
    let brown = analyze_buffer(&noise(NoiseType::Brown), FFT_SIZE, 62.5);
    assert!(brown.is_monotonically_decreasing(), "bands: {:?}", brown.bands);

    // Above the leak corner the slope approaches 6 dB per octave
    let upper = analyze_buffer(&noise(NoiseType::Brown), FFT_SIZE, 250.0);
    assert!(
        upper.slope_db_per_octave < -4.0,
        "brown slope {:.2} dB/octave",
        upper.slope_db_per_octave
    );

    let pink = analyze_buffer(&noise(NoiseType::Pink), FFT_SIZE, 250.0);
    assert!(upper.slope_db_per_octave < pink.slope_db_per_octave);
}

#[test]
fn test_colored_noise_differs_from_white() {
    let white = analyze_buffer(&noise(NoiseType::White), FFT_SIZE, 62.5);
    for noise_type in [NoiseType::Pink, NoiseType::Brown] {
        let colored = analyze_buffer(&noise(noise_type), FFT_SIZE, 62.5);
        assert!(
            colored.slope_db_per_octave < white.slope_db_per_octave - 1.0,
            "{} not distinguishable from white",
            noise_type
        );
    }
}
