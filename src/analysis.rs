//! Spectrum analysis
//!
//! Welch-averaged power spectra grouped into octave bands. Used to check
//! that generated noise has the expected color: white is flat, pink falls
//! about 3 dB per octave, brown about 6.

use std::f32::consts::TAU;

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

use crate::engine::buffer::{linear_to_db, AudioBuffer};

/// Mean power of the bins inside one octave
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandEnergy {
    pub low_hz: f32,
    pub high_hz: f32,
    pub power_db: f32,
}

impl BandEnergy {
    pub fn center_hz(&self) -> f32 {
        (self.low_hz * self.high_hz).sqrt()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpectrumReport {
    pub bands: Vec<BandEnergy>,
    /// Least-squares fit of band power against octave number
    pub slope_db_per_octave: f32,
}

impl SpectrumReport {
    /// True when every band is quieter than the one below it
    pub fn is_monotonically_decreasing(&self) -> bool {
        self.bands
            .windows(2)
            .all(|pair| pair[1].power_db < pair[0].power_db)
    }
}

/// Hann-windowed, 50% overlap power spectrum averaged over all segments
///
/// Returns `fft_size / 2 + 1` bins, or an empty vector when the input is
/// shorter than one segment.
pub fn average_power_spectrum(samples: &[f32], fft_size: usize) -> Vec<f32> {
    if fft_size < 2 || samples.len() < fft_size {
        return Vec::new();
    }

    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(fft_size);
    let window: Vec<f32> = (0..fft_size)
        .map(|i| 0.5 - 0.5 * (TAU * i as f32 / fft_size as f32).cos())
        .collect();

    let hop = fft_size / 2;
    let mut power = vec![0.0_f64; fft_size / 2 + 1];
    let mut scratch = vec![Complex::new(0.0_f32, 0.0); fft_size];
    let mut segments = 0usize;
    let mut start = 0usize;

    while start + fft_size <= samples.len() {
        for (i, bin) in scratch.iter_mut().enumerate() {
            *bin = Complex::new(samples[start + i] * window[i], 0.0);
        }
        fft.process(&mut scratch);
        for (p, bin) in power.iter_mut().zip(scratch.iter()) {
            *p += bin.norm_sqr() as f64;
        }
        segments += 1;
        start += hop;
    }

    power
        .into_iter()
        .map(|p| (p / segments as f64) as f32)
        .collect()
}

/// Group a spectrum into octave bands starting at `lowest_hz`
pub fn octave_bands(spectrum: &[f32], sample_rate: u32, lowest_hz: f32) -> Vec<BandEnergy> {
    if spectrum.len() < 2 || lowest_hz <= 0.0 {
        return Vec::new();
    }
    let fft_size = (spectrum.len() - 1) * 2;
    let bin_hz = sample_rate as f32 / fft_size as f32;
    let nyquist = sample_rate as f32 / 2.0;

    let mut bands = Vec::new();
    let mut low = lowest_hz;
    while low * 2.0 <= nyquist {
        let high = low * 2.0;
        let in_band: Vec<f32> = spectrum
            .iter()
            .enumerate()
            .filter(|(k, _)| {
                let f = *k as f32 * bin_hz;
                f >= low && f < high
            })
            .map(|(_, &p)| p)
            .collect();
        if !in_band.is_empty() {
            let mean = in_band.iter().sum::<f32>() / in_band.len() as f32;
            bands.push(BandEnergy {
                low_hz: low,
                high_hz: high,
                power_db: linear_to_db(mean.sqrt()),
            });
        }
        low = high;
    }
    bands
}

/// Slope of a straight-line fit through (octave, dB) points
pub fn spectral_slope(bands: &[BandEnergy]) -> f32 {
    let points: Vec<(f32, f32)> = bands
        .iter()
        .filter(|b| b.power_db.is_finite())
        .map(|b| (b.center_hz().log2(), b.power_db))
        .collect();
    if points.len() < 2 {
        return 0.0;
    }

    let n = points.len() as f32;
    let mean_x = points.iter().map(|p| p.0).sum::<f32>() / n;
    let mean_y = points.iter().map(|p| p.1).sum::<f32>() / n;
    let cov: f32 = points.iter().map(|p| (p.0 - mean_x) * (p.1 - mean_y)).sum();
    let var: f32 = points.iter().map(|p| (p.0 - mean_x).powi(2)).sum();
    if var == 0.0 {
        0.0
    } else {
        cov / var
    }
}

/// Octave-band report averaged across the buffer's channels
pub fn analyze_buffer(buffer: &AudioBuffer, fft_size: usize, lowest_hz: f32) -> SpectrumReport {
    let spectra: Vec<Vec<f32>> = buffer
        .samples
        .iter()
        .map(|ch| average_power_spectrum(ch, fft_size))
        .filter(|s| !s.is_empty())
        .collect();

    let bands = match spectra.first() {
        Some(first) => {
            let mut combined = vec![0.0_f32; first.len()];
            for spectrum in &spectra {
                for (c, p) in combined.iter_mut().zip(spectrum) {
                    *c += p / spectra.len() as f32;
                }
            }
            octave_bands(&combined, buffer.sample_rate, lowest_hz)
        }
        None => Vec::new(),
    };

    let slope_db_per_octave = spectral_slope(&bands);
    SpectrumReport {
        bands,
        slope_db_per_octave,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::buffer::ChannelLayout;
    use crate::engine::io::generate_test_tone;

    #[test]
    fn test_short_input_has_no_spectrum() {
        assert!(average_power_spectrum(&[0.0; 100], 256).is_empty());
    }

    #[test]
    fn test_tone_peaks_at_its_bin() {
        // 1 kHz at 8 kHz with a 256-point FFT lands exactly on bin 32
        let tone = generate_test_tone(1000.0, 0.5, 8000, ChannelLayout::Mono);
        let spectrum = average_power_spectrum(tone.channel(0), 256);
        let peak = spectrum
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(k, _)| k)
            .unwrap();
        assert_eq!(peak, 32);
    }

    #[test]
    fn test_slope_of_synthetic_bands() {
        let bands: Vec<BandEnergy> = (0..5)
            .map(|i| {
                let low = 100.0 * 2f32.powi(i);
                BandEnergy {
                    low_hz: low,
                    high_hz: low * 2.0,
                    power_db: -3.0 * i as f32,
                }
            })
            .collect();
        assert!((spectral_slope(&bands) + 3.0).abs() < 1e-4);
    }
}
