//! Parametric layer: sum-of-Gaussians morphology synthesis
//!
//! Each wave is a continuous Gaussian component positioned from the
//! rhythm's interval parameters, with small per-beat variation in
//! amplitude and width. Smoother than the lookup layer and the beats
//! are no longer copies of each other.

use ecg_core::{EcgResult, Lead, RhythmConfig, WaveParams, WaveShape};
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

use crate::layer::{GenerationContext, LayerKind, LayerState, SimulationLayer};
use crate::schedule::{BeatClass, BeatSchedule, ScheduleCarry};
use crate::template;

/// Fractional per-beat amplitude variation (one sigma)
const BEAT_AMPLITUDE_JITTER: f64 = 0.03;
/// Fractional per-beat width variation (one sigma)
const BEAT_WIDTH_JITTER: f64 = 0.02;
/// Respiratory amplitude modulation depth
const RESPIRATORY_MODULATION: f64 = 0.02;
const RESPIRATORY_FREQ_HZ: f64 = 0.25;

/// One Gaussian component of a beat, in seconds relative to QRS onset
#[derive(Debug, Clone, Copy)]
struct GaussianWave {
    center_s: f64,
    sigma_s: f64,
    amplitude_mv: f64,
}

impl GaussianWave {
    fn value_at(&self, t_s: f64) -> f64 {
        let d = t_s - self.center_s;
        self.amplitude_mv * (-(d * d) / (2.0 * self.sigma_s * self.sigma_s)).exp()
    }
}

/// Gaussian-synthesis simulation layer
#[derive(Debug, Default)]
pub struct ParametricLayer {
    elapsed_samples: u64,
    carry: Option<ScheduleCarry>,
}

impl ParametricLayer {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Decompose one wave descriptor into Gaussian components.
/// `center_s` is where the wave's midpoint sits relative to QRS onset.
fn wave_components(params: &WaveParams, center_s: f64, out: &mut Vec<GaussianWave>) {
    let dur = params.duration_ms / 1000.0;
    if dur <= 0.0 || params.amplitude_mv == 0.0 {
        return;
    }
    let amp = params.amplitude_mv * params.polarity;
    let start = center_s - dur / 2.0;

    // (position, height, width) as fractions of the wave duration
    let parts: &[(f64, f64, f64)] = match params.shape {
        WaveShape::Gaussian | WaveShape::Triangle | WaveShape::Sine => {
            &[(0.5, 1.0, 0.18)]
        }
        // skewed single lobe approximating the ramp
        WaveShape::Sawtooth => &[(0.7, 1.0, 0.22)],
        WaveShape::Qrs => &[(0.25, -0.15, 0.06), (0.5, 1.0, 0.08), (0.75, -0.25, 0.06)],
        WaveShape::WideQrs => &[(0.45, 1.0, 0.16), (0.85, -0.45, 0.12)],
        WaveShape::Delta => &[(0.2, 0.3, 0.15), (0.55, 1.0, 0.09), (0.8, -0.2, 0.06)],
        WaveShape::Brugada => &[(0.2, 0.6, 0.05), (0.45, 1.0, 0.06), (0.7, 0.45, 0.15)],
    };

    let skew_shift = 0.25 * params.skew.clamp(-1.0, 1.0) * dur;
    for &(pos, height, width) in parts {
        out.push(GaussianWave {
            center_s: start + pos * dur + skew_shift,
            sigma_s: width * dur,
            amplitude_mv: amp * height,
        });
    }
}

/// All Gaussian components of one beat, with per-beat variation applied
fn beat_components(
    config: &RhythmConfig,
    class: BeatClass,
    rng: &mut StdRng,
) -> Vec<GaussianWave> {
    let amp_jitter = Normal::new(1.0, BEAT_AMPLITUDE_JITTER).unwrap();
    let width_jitter = Normal::new(1.0, BEAT_WIDTH_JITTER).unwrap();

    let (qrs, t_wave, p_wave) = match class {
        BeatClass::Normal => (config.qrs, config.t_wave, config.p_wave),
        BeatClass::Ectopic => (
            WaveParams::new(1.8, 140.0, WaveShape::WideQrs),
            Some(WaveParams::new(0.5, 140.0, WaveShape::Gaussian).inverted()),
            None,
        ),
    };

    let mut components = Vec::new();

    if let (Some(p), Some(pr_ms)) = (p_wave, config.pr_interval_ms) {
        wave_components(&p, -pr_ms / 1000.0 + p.duration_ms / 2000.0, &mut components);
    }

    wave_components(&qrs, qrs.duration_ms / 2000.0, &mut components);

    if let Some(t) = t_wave {
        let qt_s = config.qt_interval_ms.unwrap_or(400.0) / 1000.0;
        // slightly asymmetric T, steeper on the downslope
        let t = t.with_skew(0.3);
        wave_components(&t, qt_s - t.duration_ms / 2000.0, &mut components);
    }

    let amp_factor = amp_jitter.sample(rng).clamp(0.8, 1.2);
    let width_factor = width_jitter.sample(rng).clamp(0.9, 1.1);
    for c in &mut components {
        c.amplitude_mv *= amp_factor;
        c.sigma_s *= width_factor;
    }
    components
}

impl SimulationLayer for ParametricLayer {
    fn kind(&self) -> LayerKind {
        LayerKind::Parametric
    }

    fn generate(
        &mut self,
        ctx: &GenerationContext<'_>,
        rng: &mut StdRng,
    ) -> EcgResult<Vec<(Lead, Vec<f64>)>> {
        let config = ctx.config;
        let dt = 1.0 / ctx.sampling_rate as f64;

        let schedule = if config.is_flatline() || config.baseline.replaces_beats() {
            None
        } else {
            Some(BeatSchedule::generate_from(
                config,
                ctx.sampling_rate,
                ctx.num_samples,
                ctx.hrv,
                rng,
                self.carry,
            ))
        };

        // Gaussian components per beat, shared across leads so every
        // lead shows the same beat-to-beat variation
        let beats: Vec<(usize, Vec<GaussianWave>)> = schedule
            .as_ref()
            .map(|s| {
                s.events
                    .iter()
                    .map(|e| (e.offset, beat_components(config, e.class, rng)))
                    .collect()
            })
            .unwrap_or_default();

        let mut channels = Vec::with_capacity(ctx.leads.len());
        for &lead in ctx.leads {
            let scale = template::lead_scale(lead);

            let mut buffer = if schedule.is_some() {
                let mut buffer = vec![0.0; ctx.num_samples];
                for (onset, components) in &beats {
                    render_beat(&mut buffer, *onset, components, dt, scale);
                }
                let texture = template::render_texture(
                    config.baseline,
                    ctx.sampling_rate,
                    ctx.num_samples,
                    scale.abs(),
                    rng,
                );
                for (i, (v, t)) in buffer.iter_mut().zip(&texture).enumerate() {
                    let breath = 1.0
                        + RESPIRATORY_MODULATION
                            * (std::f64::consts::TAU * RESPIRATORY_FREQ_HZ * i as f64 * dt).sin();
                    *v = *v * breath + t;
                }
                buffer
            } else if config.baseline.replaces_beats() {
                template::render_texture(
                    config.baseline,
                    ctx.sampling_rate,
                    ctx.num_samples,
                    scale.abs(),
                    rng,
                )
            } else {
                // asystole
                let residual = Normal::new(0.0, 0.005).unwrap();
                (0..ctx.num_samples).map(|_| residual.sample(rng)).collect()
            };

            ctx.noise.apply(&mut buffer, ctx.sampling_rate, rng);
            channels.push((lead, buffer));
        }

        self.elapsed_samples += ctx.num_samples as u64;
        self.carry = schedule
            .map(|s| ScheduleCarry { next_beat_in: s.next_beat_in, rate_bpm: s.rate_bpm });

        Ok(channels)
    }

    fn export_state(&self) -> LayerState {
        LayerState {
            kind: LayerKind::Parametric,
            elapsed_samples: self.elapsed_samples,
            next_beat_in: self.carry.map(|c| c.next_beat_in as u64),
            rate_bpm: self.carry.map(|c| c.rate_bpm),
            membrane: None,
        }
    }

    fn restore_state(&mut self, state: &LayerState) -> EcgResult<()> {
        state.validate()?;
        self.elapsed_samples = state.elapsed_samples;
        self.carry = state.schedule_carry();
        Ok(())
    }

    fn reset(&mut self) {
        self.elapsed_samples = 0;
        self.carry = None;
    }
}

/// Evaluate one beat's components into the buffer around its onset
fn render_beat(
    buffer: &mut [f64],
    onset: usize,
    components: &[GaussianWave],
    dt: f64,
    scale: f64,
) {
    for c in components {
        // evaluate only within four sigma of the component
        let span = 4.0 * c.sigma_s;
        let lo_s = c.center_s - span;
        let hi_s = c.center_s + span;
        let lo = ((onset as f64 * dt + lo_s) / dt).floor().max(0.0) as usize;
        let hi = (((onset as f64 * dt + hi_s) / dt).ceil() as usize).min(buffer.len());
        for (i, v) in buffer.iter_mut().enumerate().take(hi).skip(lo) {
            let t_rel = i as f64 * dt - onset as f64 * dt;
            *v += scale * c.value_at(t_rel);
        }
    }
}
