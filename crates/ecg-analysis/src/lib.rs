//! ECG-Analysis: Verification views over generated strips
//!
//! R-peak detection, RR interval statistics and spectral summaries,
//! used to check that generated rhythms carry the statistics their
//! configuration promises.

pub mod intervals;
pub mod peaks;
pub mod spectrum;

pub use intervals::{IntervalAnalysis, RrStatistics};
pub use peaks::{detect_r_peaks, PeakConfig};
pub use spectrum::{band_power, dominant_frequency, power_spectrum, SpectrumAnalysis};
