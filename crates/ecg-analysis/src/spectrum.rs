//! Spectral summaries via FFT

use num_complex::Complex;
use rustfft::FftPlanner;
use serde::{Deserialize, Serialize};

/// One-sided power spectrum with its frequency resolution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpectrumAnalysis {
    /// Power per bin, DC first
    pub power: Vec<f64>,
    /// Bin width in Hz
    pub resolution_hz: f64,
}

impl SpectrumAnalysis {
    /// Center frequency of bin `i`
    pub fn frequency_of(&self, i: usize) -> f64 {
        i as f64 * self.resolution_hz
    }
}

/// One-sided power spectrum of the signal, mean removed
pub fn power_spectrum(samples: &[f64], sampling_rate: u32) -> SpectrumAnalysis {
    let n = samples.len();
    if n == 0 {
        return SpectrumAnalysis { power: Vec::new(), resolution_hz: 0.0 };
    }

    let mean = samples.iter().sum::<f64>() / n as f64;
    let mut buffer: Vec<Complex<f64>> =
        samples.iter().map(|&v| Complex::new(v - mean, 0.0)).collect();

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(n);
    fft.process(&mut buffer);

    let power = buffer[..n / 2 + 1]
        .iter()
        .map(|c| c.norm_sqr() / n as f64)
        .collect();

    SpectrumAnalysis {
        power,
        resolution_hz: sampling_rate as f64 / n as f64,
    }
}

/// Frequency of the strongest non-DC component, in Hz
pub fn dominant_frequency(samples: &[f64], sampling_rate: u32) -> f64 {
    let spectrum = power_spectrum(samples, sampling_rate);
    let (bin, _) = spectrum
        .power
        .iter()
        .enumerate()
        .skip(1)
        .fold((0, 0.0), |acc, (i, &p)| if p > acc.1 { (i, p) } else { acc });
    spectrum.frequency_of(bin)
}

/// Fraction of total power inside [lo_hz, hi_hz]
pub fn band_power(samples: &[f64], sampling_rate: u32, lo_hz: f64, hi_hz: f64) -> f64 {
    let spectrum = power_spectrum(samples, sampling_rate);
    let total: f64 = spectrum.power.iter().skip(1).sum();
    if total <= 0.0 {
        return 0.0;
    }
    let in_band: f64 = spectrum
        .power
        .iter()
        .enumerate()
        .skip(1)
        .filter(|(i, _)| {
            let f = spectrum.frequency_of(*i);
            f >= lo_hz && f <= hi_hz
        })
        .map(|(_, &p)| p)
        .sum();
    in_band / total
}
