//! RR interval statistics and QRS width estimation

use serde::{Deserialize, Serialize};

/// Time-domain variability statistics over a strip's RR intervals
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RrStatistics {
    /// Mean RR interval in seconds
    pub mean_rr_s: f64,
    /// Mean ventricular rate in bpm
    pub mean_rate_bpm: f64,
    /// Standard deviation of RR intervals (SDNN) in seconds
    pub sdnn_s: f64,
    /// Root mean square of successive differences in seconds
    pub rmssd_s: f64,
    /// Coefficient of variation (SDNN / mean), dimensionless
    pub cv: f64,
}

/// Interval analysis over detected R peaks
#[derive(Debug, Clone)]
pub struct IntervalAnalysis {
    /// RR intervals in seconds, one fewer than the peaks
    pub rr_intervals_s: Vec<f64>,
}

impl IntervalAnalysis {
    /// Build from peak sample indices; needs at least two peaks
    pub fn from_peaks(peaks: &[usize], sampling_rate: u32) -> Option<Self> {
        if peaks.len() < 2 {
            return None;
        }
        let dt = 1.0 / sampling_rate as f64;
        let rr_intervals_s = peaks.windows(2).map(|w| (w[1] - w[0]) as f64 * dt).collect();
        Some(Self { rr_intervals_s })
    }

    pub fn statistics(&self) -> RrStatistics {
        let rr = &self.rr_intervals_s;
        let n = rr.len() as f64;
        let mean_rr_s = rr.iter().sum::<f64>() / n;
        let sdnn_s =
            (rr.iter().map(|x| (x - mean_rr_s).powi(2)).sum::<f64>() / n).sqrt();

        let rmssd_s = if rr.len() > 1 {
            let sq_diff: f64 = rr.windows(2).map(|w| (w[1] - w[0]).powi(2)).sum();
            (sq_diff / (rr.len() - 1) as f64).sqrt()
        } else {
            0.0
        };

        RrStatistics {
            mean_rr_s,
            mean_rate_bpm: 60.0 / mean_rr_s,
            sdnn_s,
            rmssd_s,
            cv: sdnn_s / mean_rr_s,
        }
    }
}

impl RrStatistics {
    /// JSON rendering for export alongside a strip
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Width of the deflection around `peak` that stays above half the peak
/// amplitude, in seconds. A crude but monotone QRS duration proxy.
pub fn qrs_width_at(samples: &[f64], peak: usize, sampling_rate: u32) -> f64 {
    if peak >= samples.len() {
        return 0.0;
    }
    let half = samples[peak].abs() / 2.0;
    if half == 0.0 {
        return 0.0;
    }

    let mut lo = peak;
    while lo > 0 && samples[lo - 1].abs() > half {
        lo -= 1;
    }
    let mut hi = peak;
    while hi + 1 < samples.len() && samples[hi + 1].abs() > half {
        hi += 1;
    }
    (hi - lo + 1) as f64 / sampling_rate as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regular_peaks_have_zero_variability() {
        let peaks: Vec<usize> = (0..10).map(|i| 100 + i * 400).collect();
        let analysis = IntervalAnalysis::from_peaks(&peaks, 500).unwrap();
        let stats = analysis.statistics();

        assert!((stats.mean_rr_s - 0.8).abs() < 1e-9);
        assert!((stats.mean_rate_bpm - 75.0).abs() < 1e-9);
        assert_eq!(stats.sdnn_s, 0.0);
        assert_eq!(stats.rmssd_s, 0.0);
        assert_eq!(stats.cv, 0.0);
    }

    #[test]
    fn test_alternating_intervals_show_rmssd() {
        // RR alternates 0.6 / 1.0 s (bigeminy-like)
        let mut peaks = vec![0usize];
        for i in 0..8 {
            let step = if i % 2 == 0 { 300 } else { 500 };
            peaks.push(peaks.last().unwrap() + step);
        }
        let stats = IntervalAnalysis::from_peaks(&peaks, 500).unwrap().statistics();

        assert!((stats.mean_rr_s - 0.8).abs() < 1e-9);
        assert!(stats.sdnn_s > 0.15);
        assert!((stats.rmssd_s - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_single_peak_is_not_enough() {
        assert!(IntervalAnalysis::from_peaks(&[42], 500).is_none());
    }

    #[test]
    fn test_statistics_serialize_to_json() {
        let peaks: Vec<usize> = (0..5).map(|i| i * 400).collect();
        let stats = IntervalAnalysis::from_peaks(&peaks, 500).unwrap().statistics();
        let json = stats.to_json().unwrap();
        assert!(json.contains("mean_rate_bpm"));
        assert!(json.contains("sdnn_s"));
    }

    #[test]
    fn test_wider_deflection_measures_wider() {
        let gaussian = |n: usize, center: f64, sigma: f64| -> Vec<f64> {
            (0..n)
                .map(|i| {
                    let d = i as f64 - center;
                    (-(d * d) / (2.0 * sigma * sigma)).exp()
                })
                .collect()
        };
        let narrow = gaussian(400, 200.0, 8.0);
        let wide = gaussian(400, 200.0, 20.0);

        let w_narrow = qrs_width_at(&narrow, 200, 500);
        let w_wide = qrs_width_at(&wide, 200, 500);
        assert!(w_wide > w_narrow * 2.0);
    }
}
