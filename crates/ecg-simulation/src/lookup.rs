//! Lookup layer: template-fragment composition
//!
//! Fastest fidelity level. Beats are stamped from pre-shaped wave
//! fragments; no morphology is synthesized per sample.

use ecg_core::{EcgResult, Lead};
use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::layer::{GenerationContext, LayerKind, LayerState, SimulationLayer};
use crate::schedule::{BeatSchedule, ScheduleCarry};
use crate::template;

/// Residual electrical activity on an asystolic strip, in mV
const AGONAL_NOISE_MV: f64 = 0.005;

/// Template-based simulation layer
#[derive(Debug, Default)]
pub struct LookupLayer {
    elapsed_samples: u64,
    carry: Option<ScheduleCarry>,
}

impl LookupLayer {
    pub fn new() -> Self {
        Self::default()
    }

    fn render_lead(
        &self,
        ctx: &GenerationContext<'_>,
        lead: Lead,
        schedule: Option<&BeatSchedule>,
        rng: &mut StdRng,
    ) -> Vec<f64> {
        let scale = template::lead_scale(lead);
        let config = ctx.config;

        let mut buffer = if let Some(schedule) = schedule {
            let mut buffer = template::render_beat_train(
                schedule,
                config,
                ctx.sampling_rate,
                ctx.num_samples,
                scale,
            );
            let texture = template::render_texture(
                config.baseline,
                ctx.sampling_rate,
                ctx.num_samples,
                scale.abs(),
                rng,
            );
            for (v, t) in buffer.iter_mut().zip(&texture) {
                *v += t;
            }
            buffer
        } else if config.baseline.replaces_beats() {
            // VF and torsades have no discrete beats at this level
            template::render_texture(
                config.baseline,
                ctx.sampling_rate,
                ctx.num_samples,
                scale.abs(),
                rng,
            )
        } else {
            flatline(ctx.num_samples, rng)
        };

        ctx.noise.apply(&mut buffer, ctx.sampling_rate, rng);
        buffer
    }
}

impl SimulationLayer for LookupLayer {
    fn kind(&self) -> LayerKind {
        LayerKind::Lookup
    }

    fn generate(
        &mut self,
        ctx: &GenerationContext<'_>,
        rng: &mut StdRng,
    ) -> EcgResult<Vec<(Lead, Vec<f64>)>> {
        let schedule = if ctx.config.is_flatline() || ctx.config.baseline.replaces_beats() {
            None
        } else {
            Some(BeatSchedule::generate_from(
                ctx.config,
                ctx.sampling_rate,
                ctx.num_samples,
                ctx.hrv,
                rng,
                self.carry,
            ))
        };

        let channels = ctx
            .leads
            .iter()
            .map(|&lead| (lead, self.render_lead(ctx, lead, schedule.as_ref(), rng)))
            .collect();

        self.elapsed_samples += ctx.num_samples as u64;
        self.carry = schedule
            .map(|s| ScheduleCarry { next_beat_in: s.next_beat_in, rate_bpm: s.rate_bpm });

        Ok(channels)
    }

    fn export_state(&self) -> LayerState {
        LayerState {
            kind: LayerKind::Lookup,
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

/// Near-zero agonal baseline for asystole; never digitally silent
fn flatline(num_samples: usize, rng: &mut StdRng) -> Vec<f64> {
    let residual = Normal::new(0.0, AGONAL_NOISE_MV).unwrap();
    let drift_phase: f64 = rng.gen_range(0.0..std::f64::consts::TAU);
    (0..num_samples)
        .map(|i| {
            let drift = AGONAL_NOISE_MV * (i as f64 * 0.001 + drift_phase).sin();
            drift + residual.sample(rng)
        })
        .collect()
}
