//! The simulator facade
//!
//! Owns the rhythm catalog, the active fidelity layer and the random
//! source. Callers pick a rhythm and a duration and get back a finished
//! [`SignalRecord`]; the layer can be swapped mid-session with timing
//! and membrane state carried across the switch.

use ecg_core::{EcgError, EcgResult, Lead, Rhythm, RhythmCatalog, RhythmConfig, SignalRecord};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::biophysical::BiophysicalLayer;
use crate::layer::{GenerationContext, LayerKind, SimulationLayer};
use crate::lookup::LookupLayer;
use crate::noise::NoiseModel;
use crate::parametric::ParametricLayer;

const MIN_SAMPLING_RATE: u32 = 100;
const MAX_SAMPLING_RATE: u32 = 2000;
const SAMPLING_RATE_RANGE: &str = "100-2000Hz";

/// Simulator configuration, deserializable from a config file
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Output sampling rate in Hz
    pub sampling_rate: u32,
    /// Leads to render, in output order
    pub leads: Vec<Lead>,
    /// Dimensionless noise level in [0, 1]
    pub noise_level: f64,
    /// Heart-rate-variability scaling in [0, 1] for regular rhythms
    pub hrv: f64,
    /// Fidelity layer to start with
    pub layer: LayerKind,
    /// RNG seed; None seeds from the OS
    pub seed: Option<u64>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            sampling_rate: 500,
            leads: vec![Lead::II],
            noise_level: 0.1,
            hrv: 0.5,
            layer: LayerKind::Lookup,
            seed: None,
        }
    }
}

impl SimulatorConfig {
    pub fn validate(&self) -> EcgResult<()> {
        if !(MIN_SAMPLING_RATE..=MAX_SAMPLING_RATE).contains(&self.sampling_rate) {
            return Err(EcgError::InvalidSamplingRate {
                rate: self.sampling_rate,
                valid_range: SAMPLING_RATE_RANGE,
            });
        }
        if self.leads.is_empty() {
            return Err(EcgError::InvalidSignalConfig {
                reason: "at least one lead must be requested".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.noise_level) {
            return Err(EcgError::InvalidSignalConfig {
                reason: format!("noise_level {} outside [0, 1]", self.noise_level),
            });
        }
        if !(0.0..=1.0).contains(&self.hrv) {
            return Err(EcgError::InvalidSignalConfig {
                reason: format!("hrv {} outside [0, 1]", self.hrv),
            });
        }
        Ok(())
    }
}

/// Multi-fidelity ECG simulator
pub struct EcgSimulator {
    config: SimulatorConfig,
    catalog: RhythmCatalog,
    layer: Box<dyn SimulationLayer + Send>,
    rng: StdRng,
}

impl EcgSimulator {
    /// Simulator over the built-in catalog
    pub fn new(config: SimulatorConfig) -> EcgResult<Self> {
        Self::with_catalog(config, RhythmCatalog::builtin())
    }

    /// Simulator over an injected catalog
    pub fn with_catalog(config: SimulatorConfig, catalog: RhythmCatalog) -> EcgResult<Self> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let layer = make_layer(config.layer);
        debug!(
            sampling_rate = config.sampling_rate,
            layer = %config.layer,
            rhythms = catalog.len(),
            "simulator ready"
        );
        Ok(Self { config, catalog, layer, rng })
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    pub fn layer_kind(&self) -> LayerKind {
        self.layer.kind()
    }

    /// Catalog entry for a rhythm, if one exists
    pub fn rhythm_info(&self, rhythm: Rhythm) -> Option<&RhythmConfig> {
        self.catalog.get(rhythm)
    }

    /// Generate a strip, falling back to normal sinus when the rhythm
    /// has no catalog entry. The fallback is logged, never silent.
    pub fn generate(&mut self, rhythm: Rhythm, duration_s: f64) -> EcgResult<SignalRecord> {
        let config = match self.catalog.get(rhythm) {
            Some(config) => config.clone(),
            None => {
                warn!(rhythm = %rhythm, "no catalog entry, substituting normal sinus");
                RhythmCatalog::default_sinus()
            }
        };
        self.generate_with(rhythm, &config, duration_s)
    }

    /// Like [`EcgSimulator::generate`] but an unknown rhythm is an error
    pub fn generate_strict(&mut self, rhythm: Rhythm, duration_s: f64) -> EcgResult<SignalRecord> {
        let config = self
            .catalog
            .get(rhythm)
            .cloned()
            .ok_or(EcgError::UnknownRhythm { rhythm })?;
        self.generate_with(rhythm, &config, duration_s)
    }

    /// Generate with an explicit configuration, bypassing the catalog
    pub fn generate_with(
        &mut self,
        rhythm: Rhythm,
        config: &RhythmConfig,
        duration_s: f64,
    ) -> EcgResult<SignalRecord> {
        config.validate()?;
        if !duration_s.is_finite() || duration_s <= 0.0 {
            return Err(EcgError::InvalidSignalConfig {
                reason: format!("duration {}s must be positive and finite", duration_s),
            });
        }
        let num_samples = (duration_s * self.config.sampling_rate as f64).floor() as usize;
        if num_samples == 0 {
            return Err(EcgError::InvalidSignalConfig {
                reason: format!(
                    "duration {}s yields no samples at {}Hz",
                    duration_s, self.config.sampling_rate
                ),
            });
        }

        let channels = self.render(config, num_samples)?;
        SignalRecord::new(rhythm, self.config.sampling_rate, duration_s, channels)
    }

    /// Generate a raw continuation window of `num_samples` samples.
    /// Consecutive calls continue the beat train without a phase jump.
    pub fn generate_chunk(
        &mut self,
        rhythm: Rhythm,
        num_samples: usize,
    ) -> EcgResult<Vec<(Lead, Vec<f64>)>> {
        let config = self
            .catalog
            .get(rhythm)
            .cloned()
            .ok_or(EcgError::UnknownRhythm { rhythm })?;
        if num_samples == 0 {
            return Err(EcgError::InvalidSignalConfig {
                reason: "chunk must contain at least one sample".to_string(),
            });
        }
        self.render(&config, num_samples)
    }

    fn render(
        &mut self,
        config: &RhythmConfig,
        num_samples: usize,
    ) -> EcgResult<Vec<(Lead, Vec<f64>)>> {
        let ctx = GenerationContext {
            config,
            sampling_rate: self.config.sampling_rate,
            num_samples,
            leads: &self.config.leads,
            hrv: self.config.hrv,
            noise: NoiseModel::from_level(self.config.noise_level),
        };
        self.layer.generate(&ctx, &mut self.rng)
    }

    /// Swap the fidelity layer, carrying continuity state across.
    /// A no-op when the requested kind is already active.
    pub fn switch_layer(&mut self, kind: LayerKind) -> EcgResult<()> {
        if kind == self.layer.kind() {
            return Ok(());
        }
        let state = self.layer.export_state();
        let mut next = make_layer(kind);
        next.restore_state(&state)?;
        info!(from = %state.kind, to = %kind, "switched simulation layer");
        self.layer = next;
        Ok(())
    }

    /// Drop all continuity state and reseed the random source
    pub fn reset(&mut self, seed: Option<u64>) {
        self.layer.reset();
        self.rng = match seed.or(self.config.seed) {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
    }
}

fn make_layer(kind: LayerKind) -> Box<dyn SimulationLayer + Send> {
    match kind {
        LayerKind::Lookup => Box::new(LookupLayer::new()),
        LayerKind::Parametric => Box::new(ParametricLayer::new()),
        LayerKind::Biophysical => Box::new(BiophysicalLayer::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_config(seed: u64) -> SimulatorConfig {
        SimulatorConfig {
            noise_level: 0.0,
            seed: Some(seed),
            ..SimulatorConfig::default()
        }
    }

    /// Crude R-peak count: local maxima above threshold with a
    /// refractory distance
    fn count_peaks(samples: &[f64], threshold: f64, min_distance: usize) -> usize {
        let mut count = 0;
        let mut last_peak: Option<usize> = None;
        for i in 1..samples.len().saturating_sub(1) {
            if samples[i] > threshold
                && samples[i] >= samples[i - 1]
                && samples[i] >= samples[i + 1]
                && last_peak.map_or(true, |p| i - p >= min_distance)
            {
                count += 1;
                last_peak = Some(i);
            }
        }
        count
    }

    #[test]
    fn test_sinus_strip_beat_count_in_rate_range() {
        let mut sim = EcgSimulator::new(seeded_config(101)).unwrap();
        let record = sim.generate(Rhythm::NormalSinus, 10.0).unwrap();
        let samples = record.lead(Lead::II).unwrap();
        assert_eq!(samples.len(), 5000);

        // 60-100 bpm over 10 s
        let beats = count_peaks(samples, 0.6, 150);
        assert!((9..=17).contains(&beats), "saw {} beats", beats);
    }

    #[test]
    fn test_same_seed_is_bit_identical() {
        for kind in [LayerKind::Lookup, LayerKind::Parametric, LayerKind::Biophysical] {
            let mut config = seeded_config(77);
            config.layer = kind;
            let mut a = EcgSimulator::new(config.clone()).unwrap();
            let mut b = EcgSimulator::new(config).unwrap();

            let ra = a.generate(Rhythm::AtrialFibrillation, 4.0).unwrap();
            let rb = b.generate(Rhythm::AtrialFibrillation, 4.0).unwrap();
            assert_eq!(ra.lead(Lead::II).unwrap(), rb.lead(Lead::II).unwrap());
        }
    }

    #[test]
    fn test_different_seeds_differ() {
        let mut a = EcgSimulator::new(seeded_config(1)).unwrap();
        let mut b = EcgSimulator::new(seeded_config(2)).unwrap();
        let ra = a.generate(Rhythm::NormalSinus, 5.0).unwrap();
        let rb = b.generate(Rhythm::NormalSinus, 5.0).unwrap();
        assert_ne!(ra.lead(Lead::II).unwrap(), rb.lead(Lead::II).unwrap());
    }

    #[test]
    fn test_afib_rr_spread_exceeds_sinus() {
        let rr_cv = |rhythm: Rhythm| {
            let mut sim = EcgSimulator::new(seeded_config(55)).unwrap();
            let record = sim.generate(rhythm, 10.0).unwrap();
            let samples = record.lead(Lead::II).unwrap();

            let mut peaks = Vec::new();
            let mut last: Option<usize> = None;
            for i in 1..samples.len() - 1 {
                if samples[i] > 0.6
                    && samples[i] >= samples[i - 1]
                    && samples[i] >= samples[i + 1]
                    && last.map_or(true, |p| i - p >= 120)
                {
                    peaks.push(i);
                    last = Some(i);
                }
            }
            let rr: Vec<f64> = peaks.windows(2).map(|w| (w[1] - w[0]) as f64).collect();
            assert!(rr.len() >= 3, "too few intervals for {}", rhythm);
            let mean = rr.iter().sum::<f64>() / rr.len() as f64;
            let var = rr.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / rr.len() as f64;
            var.sqrt() / mean
        };

        assert!(rr_cv(Rhythm::AtrialFibrillation) > rr_cv(Rhythm::NormalSinus));
    }

    #[test]
    fn test_asystole_is_flat() {
        let mut sim = EcgSimulator::new(seeded_config(9)).unwrap();
        let record = sim.generate(Rhythm::Asystole, 5.0).unwrap();
        let samples = record.lead(Lead::II).unwrap();
        assert_eq!(samples.len(), 2500);

        let stats = record.lead_stats(Lead::II).unwrap();
        assert!(stats.peak_to_peak < 0.1);
    }

    #[test]
    fn test_strict_rejects_missing_catalog_entry() {
        let catalog = RhythmCatalog::from_entries([RhythmCatalog::default_sinus()]);
        let mut sim = EcgSimulator::with_catalog(seeded_config(3), catalog).unwrap();

        let err = sim.generate_strict(Rhythm::AtrialFlutter, 2.0).unwrap_err();
        assert_eq!(err, EcgError::UnknownRhythm { rhythm: Rhythm::AtrialFlutter });
    }

    #[test]
    fn test_fallback_substitutes_sinus() {
        let catalog = RhythmCatalog::empty();
        let mut sim = EcgSimulator::with_catalog(seeded_config(3), catalog).unwrap();

        let record = sim.generate(Rhythm::AtrialFlutter, 5.0).unwrap();
        // the record still reports what was asked for
        assert_eq!(record.rhythm, Rhythm::AtrialFlutter);
        // but the waveform is sinus: discrete beats at 60-100 bpm
        let beats = count_peaks(record.lead(Lead::II).unwrap(), 0.6, 150);
        assert!((4..=9).contains(&beats), "saw {} beats", beats);
    }

    #[test]
    fn test_layer_switch_preserves_elapsed_state() {
        let mut sim = EcgSimulator::new(seeded_config(13)).unwrap();
        sim.generate(Rhythm::NormalSinus, 4.0).unwrap();

        sim.switch_layer(LayerKind::Parametric).unwrap();
        assert_eq!(sim.layer_kind(), LayerKind::Parametric);
        let state = sim.layer.export_state();
        assert_eq!(state.elapsed_samples, 2000);
        assert!(state.next_beat_in.is_some());

        sim.switch_layer(LayerKind::Biophysical).unwrap();
        assert_eq!(sim.layer_kind(), LayerKind::Biophysical);
        assert_eq!(sim.layer.export_state().elapsed_samples, 2000);
    }

    #[test]
    fn test_switch_to_same_layer_is_noop() {
        let mut sim = EcgSimulator::new(seeded_config(13)).unwrap();
        sim.switch_layer(LayerKind::Lookup).unwrap();
        assert_eq!(sim.layer_kind(), LayerKind::Lookup);
    }

    #[test]
    fn test_chunked_generation_has_no_phase_jump() {
        let mut config = seeded_config(21);
        config.hrv = 0.0;
        let mut sim = EcgSimulator::with_catalog(config, RhythmCatalog::builtin()).unwrap();

        let mut stitched = Vec::new();
        for _ in 0..4 {
            let chunk = sim.generate_chunk(Rhythm::NormalSinus, 1250).unwrap();
            stitched.extend_from_slice(&chunk[0].1);
        }

        // with zero jitter the stitched RR intervals are all equal
        let mut peaks = Vec::new();
        let mut last: Option<usize> = None;
        for i in 1..stitched.len() - 1 {
            if stitched[i] > 0.6
                && stitched[i] >= stitched[i - 1]
                && stitched[i] >= stitched[i + 1]
                && last.map_or(true, |p| i - p >= 150)
            {
                peaks.push(i);
                last = Some(i);
            }
        }
        let rr: Vec<usize> = peaks.windows(2).map(|w| w[1] - w[0]).collect();
        assert!(rr.len() >= 4);
        for interval in &rr {
            assert!((*interval as i64 - rr[0] as i64).abs() <= 1);
        }
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = SimulatorConfig::default();
        config.sampling_rate = 50;
        assert!(matches!(
            EcgSimulator::new(config.clone()),
            Err(EcgError::InvalidSamplingRate { .. })
        ));

        config.sampling_rate = 500;
        config.leads.clear();
        assert!(EcgSimulator::new(config.clone()).is_err());

        config.leads = vec![Lead::II];
        config.noise_level = 2.0;
        assert!(EcgSimulator::new(config).is_err());
    }

    #[test]
    fn test_zero_duration_rejected() {
        let mut sim = EcgSimulator::new(seeded_config(1)).unwrap();
        assert!(sim.generate(Rhythm::NormalSinus, 0.0).is_err());
        assert!(sim.generate(Rhythm::NormalSinus, f64::NAN).is_err());
    }
}
