//! Biophysical layer: ionic membrane model plus a dipole forward problem
//!
//! A Hodgkin-Huxley style membrane (V, m, h, n) is integrated with
//! explicit Euler at a fixed 0.1 ms step, stimulated at the scheduled
//! beat times. Surface potentials come from convolving the membrane
//! trace with a derivative-of-Gaussian dipole kernel, projecting onto
//! each lead, and smooth-downsampling to the requested rate.

use ecg_core::{EcgError, EcgResult, Lead};
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

use crate::layer::{GenerationContext, LayerKind, LayerState, MembraneState, SimulationLayer};
use crate::schedule::{BeatSchedule, ScheduleCarry};
use crate::template;

/// Integration step in milliseconds
pub const DT_MS: f64 = 0.1;
/// Integrator rate implied by the step size, in Hz
const INTEGRATOR_RATE: f64 = 1000.0 / DT_MS;

// Membrane constants (mS/cm², mV, µF/cm²)
const G_NA: f64 = 120.0;
const G_K: f64 = 36.0;
const G_LEAK: f64 = 0.3;
const E_NA: f64 = 50.0;
const E_K: f64 = -77.0;
const E_LEAK: f64 = -54.4;
const C_M: f64 = 1.0;
const V_REST: f64 = -65.0;

/// Stimulus current and duration that reliably trigger an action potential
const STIM_UA: f64 = 15.0;
const STIM_MS: f64 = 2.0;

/// Width of the dipole projection kernel
const KERNEL_MS: f64 = 30.0;

/// Ionic membrane model state and dynamics
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IonicModel {
    state: MembraneState,
}

impl IonicModel {
    pub fn at_rest() -> Self {
        Self { state: MembraneState::resting() }
    }

    pub fn from_state(state: MembraneState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> MembraneState {
        self.state
    }

    pub fn potential_mv(&self) -> f64 {
        self.state.v_mv
    }

    /// Advance the membrane by one `DT_MS` step under the given stimulus.
    /// Internally subdivided so the sodium upstroke cannot overshoot.
    pub fn step(&mut self, i_stim: f64) {
        const SUBSTEPS: usize = 5;
        let dt = DT_MS / SUBSTEPS as f64;

        for _ in 0..SUBSTEPS {
            let MembraneState { v_mv: v, m, h, n } = self.state;

            let i_na = G_NA * m.powi(3) * h * (v - E_NA);
            let i_k = G_K * n.powi(4) * (v - E_K);
            let i_leak = G_LEAK * (v - E_LEAK);

            let dv = (i_stim - i_na - i_k - i_leak) / C_M;
            let dm = alpha_m(v) * (1.0 - m) - beta_m(v) * m;
            let dh = alpha_h(v) * (1.0 - h) - beta_h(v) * h;
            let dn = alpha_n(v) * (1.0 - n) - beta_n(v) * n;

            self.state.v_mv = v + dt * dv;
            self.state.m = (m + dt * dm).clamp(0.0, 1.0);
            self.state.h = (h + dt * dh).clamp(0.0, 1.0);
            self.state.n = (n + dt * dn).clamp(0.0, 1.0);
        }
    }
}

// Rate functions with the standard removable singularities guarded

fn alpha_m(v: f64) -> f64 {
    let x = v + 40.0;
    if x.abs() < 1e-6 {
        1.0
    } else {
        0.1 * x / (1.0 - (-x / 10.0).exp())
    }
}

fn beta_m(v: f64) -> f64 {
    4.0 * (-(v + 65.0) / 18.0).exp()
}

fn alpha_h(v: f64) -> f64 {
    0.07 * (-(v + 65.0) / 20.0).exp()
}

fn beta_h(v: f64) -> f64 {
    1.0 / (1.0 + (-(v + 35.0) / 10.0).exp())
}

fn alpha_n(v: f64) -> f64 {
    let x = v + 55.0;
    if x.abs() < 1e-6 {
        0.1
    } else {
        0.01 * x / (1.0 - (-x / 10.0).exp())
    }
}

fn beta_n(v: f64) -> f64 {
    0.125 * (-(v + 65.0) / 80.0).exp()
}

/// Ionic-model simulation layer
#[derive(Debug)]
pub struct BiophysicalLayer {
    elapsed_samples: u64,
    carry: Option<ScheduleCarry>,
    membrane: MembraneState,
}

impl Default for BiophysicalLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl BiophysicalLayer {
    pub fn new() -> Self {
        Self { elapsed_samples: 0, carry: None, membrane: MembraneState::resting() }
    }

    /// Integrate the membrane across the whole window, stimulating at
    /// each scheduled beat onset. Returns the trace at integrator rate.
    fn integrate(
        &mut self,
        ctx: &GenerationContext<'_>,
        schedule: &BeatSchedule,
        steps_per_sample: usize,
    ) -> EcgResult<Vec<f64>> {
        let total_steps = ctx.num_samples * steps_per_sample;
        let stim_steps = (STIM_MS / DT_MS) as usize;

        // beat onsets in integrator steps
        let mut stim_windows: Vec<(usize, usize)> = schedule
            .events
            .iter()
            .map(|e| {
                let start = e.offset * steps_per_sample;
                (start, start + stim_steps)
            })
            .collect();
        stim_windows.reverse(); // pop from the front cheaply

        let mut model = IonicModel::from_state(self.membrane);
        let mut trace = Vec::with_capacity(total_steps);
        let mut active: Option<(usize, usize)> = None;

        for step in 0..total_steps {
            if active.map_or(true, |(_, end)| step >= end) {
                active = None;
                if stim_windows.last().is_some_and(|&(start, _)| step >= start) {
                    active = stim_windows.pop();
                }
            }
            let i_stim = match active {
                Some((_, end)) if step < end => STIM_UA,
                _ => 0.0,
            };

            model.step(i_stim);
            let v = model.potential_mv();
            if !v.is_finite() {
                return Err(EcgError::NumericalInstability {
                    rhythm: ctx.config.rhythm,
                    step_ms: DT_MS,
                });
            }
            trace.push(v);
        }

        self.membrane = model.state();
        Ok(trace)
    }
}

/// Derivative-of-Gaussian dipole kernel, peak magnitude 1.0
fn dipole_kernel() -> Vec<f64> {
    let n = (KERNEL_MS / DT_MS) as usize;
    let mut kernel: Vec<f64> = (0..n)
        .map(|i| {
            let x = (i as f64 / (n - 1) as f64) * 6.0 - 3.0;
            -x * (-(x * x) / 2.0).exp()
        })
        .collect();
    let max_abs = kernel.iter().map(|v| v.abs()).fold(0.0, f64::max);
    for v in &mut kernel {
        *v /= max_abs;
    }
    kernel
}

/// Same-length convolution of the membrane trace with the dipole kernel
fn forward_project(trace: &[f64], kernel: &[f64]) -> Vec<f64> {
    let half = kernel.len() / 2;
    let mut out = vec![0.0; trace.len()];
    for (i, o) in out.iter_mut().enumerate() {
        let mut acc = 0.0;
        for (k, &kv) in kernel.iter().enumerate() {
            let j = i as i64 + k as i64 - half as i64;
            if j >= 0 && (j as usize) < trace.len() {
                acc += (trace[j as usize] - V_REST) * kv;
            }
        }
        *o = acc;
    }
    out
}

/// Block-average the integrator-rate signal down to the output rate
fn smooth_downsample(signal: &[f64], factor: usize, num_samples: usize) -> Vec<f64> {
    (0..num_samples)
        .map(|i| {
            let block = &signal[i * factor..((i + 1) * factor).min(signal.len())];
            block.iter().sum::<f64>() / block.len().max(1) as f64
        })
        .collect()
}

impl SimulationLayer for BiophysicalLayer {
    fn kind(&self) -> LayerKind {
        LayerKind::Biophysical
    }

    fn generate(
        &mut self,
        ctx: &GenerationContext<'_>,
        rng: &mut StdRng,
    ) -> EcgResult<Vec<(Lead, Vec<f64>)>> {
        let config = ctx.config;

        // oscillatory and flatline branches never touch the integrator
        if config.baseline.replaces_beats() || config.is_flatline() {
            let mut channels = Vec::with_capacity(ctx.leads.len());
            for &lead in ctx.leads {
                let scale = template::lead_scale(lead);
                let mut buffer = if config.is_flatline() {
                    let residual = Normal::new(0.0, 0.005).unwrap();
                    (0..ctx.num_samples).map(|_| residual.sample(rng)).collect()
                } else {
                    template::render_texture(
                        config.baseline,
                        ctx.sampling_rate,
                        ctx.num_samples,
                        scale.abs(),
                        rng,
                    )
                };
                ctx.noise.apply(&mut buffer, ctx.sampling_rate, rng);
                channels.push((lead, buffer));
            }
            self.elapsed_samples += ctx.num_samples as u64;
            self.carry = None;
            return Ok(channels);
        }

        let steps_per_sample =
            ((INTEGRATOR_RATE / ctx.sampling_rate as f64).round() as usize).max(1);

        let schedule = BeatSchedule::generate_from(
            config,
            ctx.sampling_rate,
            ctx.num_samples,
            ctx.hrv,
            rng,
            self.carry,
        );

        let trace = self.integrate(ctx, &schedule, steps_per_sample)?;
        let projected = forward_project(&trace, &dipole_kernel());
        let downsampled = smooth_downsample(&projected, steps_per_sample, ctx.num_samples);

        // normalize so the dominant deflection matches the configured
        // QRS amplitude in the reference lead
        let max_abs = downsampled.iter().map(|v| v.abs()).fold(0.0, f64::max);
        let gain = if max_abs > 0.0 { config.qrs.amplitude_mv / max_abs } else { 0.0 };

        let mut channels = Vec::with_capacity(ctx.leads.len());
        for &lead in ctx.leads {
            let scale = template::lead_scale(lead);
            let mut buffer: Vec<f64> =
                downsampled.iter().map(|&v| v * gain * scale).collect();
            ctx.noise.apply(&mut buffer, ctx.sampling_rate, rng);
            channels.push((lead, buffer));
        }

        self.elapsed_samples += ctx.num_samples as u64;
        self.carry =
            Some(ScheduleCarry { next_beat_in: schedule.next_beat_in, rate_bpm: schedule.rate_bpm });

        Ok(channels)
    }

    fn export_state(&self) -> LayerState {
        LayerState {
            kind: LayerKind::Biophysical,
            elapsed_samples: self.elapsed_samples,
            next_beat_in: self.carry.map(|c| c.next_beat_in as u64),
            rate_bpm: self.carry.map(|c| c.rate_bpm),
            membrane: Some(self.membrane),
        }
    }

    fn restore_state(&mut self, state: &LayerState) -> EcgResult<()> {
        state.validate()?;
        self.elapsed_samples = state.elapsed_samples;
        self.carry = state.schedule_carry();
        // snapshots from the other layers carry no membrane; start at rest
        self.membrane = state.membrane.unwrap_or_else(MembraneState::resting);
        Ok(())
    }

    fn reset(&mut self) {
        self.elapsed_samples = 0;
        self.carry = None;
        self.membrane = MembraneState::resting();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noise::NoiseModel;
    use ecg_core::{Rhythm, RhythmCatalog, RhythmConfig};
    use rand::SeedableRng;

    fn context<'a>(
        config: &'a RhythmConfig,
        leads: &'a [Lead],
        num_samples: usize,
    ) -> GenerationContext<'a> {
        GenerationContext {
            config,
            sampling_rate: 500,
            num_samples,
            leads,
            hrv: 1.0,
            noise: NoiseModel::from_level(0.0),
        }
    }

    #[test]
    fn test_membrane_stays_at_rest_without_stimulus() {
        let mut model = IonicModel::at_rest();
        for _ in 0..5000 {
            model.step(0.0);
        }
        assert!((model.potential_mv() - V_REST).abs() < 5.0);
    }

    #[test]
    fn test_suprathreshold_stimulus_fires_action_potential() {
        let mut model = IonicModel::at_rest();
        let mut peak = f64::NEG_INFINITY;
        for step in 0..3000 {
            let i_stim = if step < (STIM_MS / DT_MS) as usize { STIM_UA } else { 0.0 };
            model.step(i_stim);
            peak = peak.max(model.potential_mv());
        }
        // overshoot past 0 mV is the signature of a real spike
        assert!(peak > 0.0, "peak was {}", peak);
        // and the membrane repolarizes afterwards
        assert!(model.potential_mv() < -50.0);
    }

    #[test]
    fn test_gates_stay_in_unit_interval() {
        let mut model = IonicModel::at_rest();
        for step in 0..10_000 {
            let i_stim = if step % 2000 < 20 { STIM_UA } else { 0.0 };
            model.step(i_stim);
            let s = model.state();
            for gate in [s.m, s.h, s.n] {
                assert!((0.0..=1.0).contains(&gate));
            }
            assert!(s.v_mv.is_finite());
        }
    }

    #[test]
    fn test_rate_functions_finite_at_singular_points() {
        for v in [-40.0, -55.0, -40.000001, -54.999999] {
            assert!(alpha_m(v).is_finite());
            assert!(alpha_n(v).is_finite());
        }
        assert!((alpha_m(-40.0) - 1.0).abs() < 1e-9);
        assert!((alpha_n(-55.0) - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_generated_strip_matches_request() {
        let catalog = RhythmCatalog::builtin();
        let config = catalog.get(Rhythm::NormalSinus).unwrap();
        let leads = [Lead::II, Lead::V1];
        let mut layer = BiophysicalLayer::new();
        let mut rng = StdRng::seed_from_u64(8);

        let channels = layer.generate(&context(config, &leads, 2500), &mut rng).unwrap();
        assert_eq!(channels.len(), 2);
        for (_, samples) in &channels {
            assert_eq!(samples.len(), 2500);
            assert!(samples.iter().all(|v| v.is_finite()));
        }

        // lead II deflections reach the configured QRS amplitude
        let max_abs = channels[0].1.iter().map(|v| v.abs()).fold(0.0, f64::max);
        assert!((max_abs - config.qrs.amplitude_mv).abs() < 0.05);
    }

    #[test]
    fn test_membrane_state_carries_across_windows() {
        let catalog = RhythmCatalog::builtin();
        let config = catalog.get(Rhythm::NormalSinus).unwrap();
        let leads = [Lead::II];
        let mut layer = BiophysicalLayer::new();
        let mut rng = StdRng::seed_from_u64(8);

        layer.generate(&context(config, &leads, 1000), &mut rng).unwrap();
        let state = layer.export_state();
        let membrane = state.membrane.unwrap();
        assert!(membrane.v_mv.is_finite());
        state.validate().unwrap();

        let mut fresh = BiophysicalLayer::new();
        fresh.restore_state(&state).unwrap();
        assert_eq!(fresh.export_state(), state);
    }

    #[test]
    fn test_vf_uses_oscillators_not_integrator() {
        let catalog = RhythmCatalog::builtin();
        let config = catalog.get(Rhythm::VentricularFibrillationFine).unwrap();
        let leads = [Lead::II];
        let mut layer = BiophysicalLayer::new();
        let mut rng = StdRng::seed_from_u64(8);

        let channels = layer.generate(&context(config, &leads, 2500), &mut rng).unwrap();
        let samples = &channels[0].1;
        // fine VF stays low amplitude and never rests
        let max_abs = samples.iter().map(|v| v.abs()).fold(0.0, f64::max);
        assert!(max_abs < 0.5);
        assert!(!samples.windows(250).any(|w| w.iter().all(|v| v.abs() < 0.005)));
    }
}
