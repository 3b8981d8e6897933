//! R-peak detection
//!
//! Adaptive threshold over the signal's mean and standard deviation with
//! a refractory distance, enough for clean synthetic strips.

use serde::{Deserialize, Serialize};

/// Detection parameters
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PeakConfig {
    /// Threshold is mean + k * std_dev; this is k
    pub threshold_sigmas: f64,
    /// Refractory period in seconds (physiological minimum RR is ~0.2 s)
    pub refractory_s: f64,
}

impl Default for PeakConfig {
    /// Three sigmas keeps T waves below threshold even on slow strips
    /// where long isoelectric stretches pull the deviation down
    fn default() -> Self {
        Self { threshold_sigmas: 3.0, refractory_s: 0.2 }
    }
}

/// Indices of detected R peaks, ascending
pub fn detect_r_peaks(samples: &[f64], sampling_rate: u32, config: &PeakConfig) -> Vec<usize> {
    if samples.len() < 3 {
        return Vec::new();
    }

    let n = samples.len() as f64;
    let mean = samples.iter().sum::<f64>() / n;
    let std_dev =
        (samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n).sqrt();
    let threshold = mean + config.threshold_sigmas * std_dev;

    let refractory = (config.refractory_s * sampling_rate as f64) as usize;
    let mut peaks = Vec::new();
    let mut last: Option<usize> = None;

    for i in 1..samples.len() - 1 {
        let is_local_max = samples[i] >= samples[i - 1] && samples[i] >= samples[i + 1];
        let clear_of_last = last.map_or(true, |p| i - p >= refractory);
        if is_local_max && samples[i] > threshold && clear_of_last {
            peaks.push(i);
            last = Some(i);
        }
    }
    peaks
}
