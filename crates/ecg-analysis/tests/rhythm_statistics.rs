//! End-to-end checks that generated rhythms carry the statistics their
//! names promise, measured with the analysis tools rather than by
//! peeking at generator internals.

use ecg_analysis::{band_power, detect_r_peaks, dominant_frequency, IntervalAnalysis, PeakConfig};
use ecg_core::{Lead, Rhythm, SignalRecord};
use ecg_simulation::{EcgSimulator, SimulatorConfig};

const FS: u32 = 500;

fn generate(rhythm: Rhythm, duration_s: f64, seed: u64) -> SignalRecord {
    let config = SimulatorConfig {
        sampling_rate: FS,
        leads: vec![Lead::II],
        noise_level: 0.0,
        seed: Some(seed),
        ..SimulatorConfig::default()
    };
    let mut sim = EcgSimulator::new(config).unwrap();
    sim.generate(rhythm, duration_s).unwrap()
}

fn rr_cv(rhythm: Rhythm, seed: u64) -> f64 {
    let record = generate(rhythm, 20.0, seed);
    let samples = record.lead(Lead::II).unwrap();
    let peaks = detect_r_peaks(samples, FS, &PeakConfig::default());
    let analysis = IntervalAnalysis::from_peaks(&peaks, FS)
        .unwrap_or_else(|| panic!("too few beats detected for {}", rhythm));
    analysis.statistics().cv
}

#[test]
fn sinus_rate_lands_in_configured_range() {
    let record = generate(Rhythm::NormalSinus, 20.0, 1);
    let samples = record.lead(Lead::II).unwrap();
    let peaks = detect_r_peaks(samples, FS, &PeakConfig::default());
    let stats = IntervalAnalysis::from_peaks(&peaks, FS).unwrap().statistics();

    assert!(
        (55.0..=105.0).contains(&stats.mean_rate_bpm),
        "mean rate {} bpm outside sinus range",
        stats.mean_rate_bpm
    );
}

#[test]
fn bradycardia_is_slower_than_tachycardia() {
    let mean_rate = |rhythm: Rhythm| {
        let record = generate(rhythm, 20.0, 2);
        let samples = record.lead(Lead::II).unwrap();
        let peaks = detect_r_peaks(samples, FS, &PeakConfig::default());
        IntervalAnalysis::from_peaks(&peaks, FS).unwrap().statistics().mean_rate_bpm
    };

    let brady = mean_rate(Rhythm::SinusBradycardia);
    let tachy = mean_rate(Rhythm::SinusTachycardia);
    assert!(brady < 65.0, "bradycardia at {} bpm", brady);
    assert!(tachy > 95.0, "tachycardia at {} bpm", tachy);
}

#[test]
fn afib_rr_variability_exceeds_sinus() {
    let afib = rr_cv(Rhythm::AtrialFibrillation, 3);
    let sinus = rr_cv(Rhythm::NormalSinus, 3);
    assert!(
        afib > 2.0 * sinus,
        "afib CV {} not clearly above sinus CV {}",
        afib,
        sinus
    );
}

#[test]
fn coarse_vf_concentrates_power_at_fibrillation_frequencies() {
    let record = generate(Rhythm::VentricularFibrillationCoarse, 20.0, 4);
    let samples = record.lead(Lead::II).unwrap();

    let dominant = dominant_frequency(samples, FS);
    assert!(
        (2.0..=11.0).contains(&dominant),
        "dominant frequency {}Hz outside fibrillatory band",
        dominant
    );
    assert!(band_power(samples, FS, 2.0, 12.0) > 0.8);
}

#[test]
fn ventricular_tachycardia_widens_the_qrs() {
    let half_max_width = |rhythm: Rhythm| {
        let record = generate(rhythm, 20.0, 5);
        let samples = record.lead(Lead::II).unwrap();
        let peaks = detect_r_peaks(samples, FS, &PeakConfig::default());
        assert!(peaks.len() >= 4);
        let widths: Vec<f64> = peaks
            .iter()
            .map(|&p| ecg_analysis::intervals::qrs_width_at(samples, p, FS))
            .collect();
        widths.iter().sum::<f64>() / widths.len() as f64
    };

    let narrow = half_max_width(Rhythm::NormalSinus);
    let wide = half_max_width(Rhythm::VentricularTachycardiaMono);
    assert!(wide > narrow * 1.5, "wide {}s vs narrow {}s", wide, narrow);
}

#[test]
fn asystole_has_no_detectable_beats() {
    let record = generate(Rhythm::Asystole, 10.0, 6);
    let samples = record.lead(Lead::II).unwrap();
    // nothing rises meaningfully above the agonal baseline
    let max_abs = samples.iter().map(|v| v.abs()).fold(0.0, f64::max);
    assert!(max_abs < 0.05);
}
