//! The simulation layer abstraction
//!
//! All three fidelity levels implement [`SimulationLayer`]; the facade
//! swaps them at runtime and carries state across the switch.

use ecg_core::{EcgError, EcgResult, Lead, RhythmConfig};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::noise::NoiseModel;
use crate::schedule::ScheduleCarry;

/// Which fidelity level a layer implements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayerKind {
    /// Template-fragment composition (fastest)
    Lookup,
    /// Sum-of-Gaussians morphology synthesis
    Parametric,
    /// Ionic membrane model with a dipole forward problem (slowest)
    Biophysical,
}

impl LayerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LayerKind::Lookup => "lookup",
            LayerKind::Parametric => "parametric",
            LayerKind::Biophysical => "biophysical",
        }
    }
}

impl std::fmt::Display for LayerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Everything a layer needs to produce one window of samples
#[derive(Debug, Clone, Copy)]
pub struct GenerationContext<'a> {
    /// Resolved rhythm configuration
    pub config: &'a RhythmConfig,
    /// Sampling rate in Hz
    pub sampling_rate: u32,
    /// Window length in samples
    pub num_samples: usize,
    /// Leads to render
    pub leads: &'a [Lead],
    /// HRV scaling in [0, 1] for the regular regime
    pub hrv: f64,
    /// Additive noise model
    pub noise: NoiseModel,
}

/// Membrane variables of the ionic model, snapshotted between windows
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MembraneState {
    /// Membrane potential in mV
    pub v_mv: f64,
    /// Sodium activation gate
    pub m: f64,
    /// Sodium inactivation gate
    pub h: f64,
    /// Potassium activation gate
    pub n: f64,
}

impl MembraneState {
    /// Resting state of the membrane model
    pub fn resting() -> Self {
        Self { v_mv: -65.0, m: 0.05, h: 0.6, n: 0.32 }
    }
}

/// Snapshot of a layer's continuity state.
///
/// Transferable between layers of different kinds: the timing fields are
/// universal, the membrane fields only matter to the biophysical layer
/// (which re-derives them from rest when absent).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerState {
    /// Kind of the layer that produced this snapshot
    pub kind: LayerKind,
    /// Total samples generated so far
    pub elapsed_samples: u64,
    /// Beat-train continuation point, if a train is in flight
    pub next_beat_in: Option<u64>,
    /// Rate the previous window used, in bpm
    pub rate_bpm: Option<f64>,
    /// Membrane snapshot from the biophysical layer
    pub membrane: Option<MembraneState>,
}

impl LayerState {
    /// Fresh state for a layer that has not generated anything yet
    pub fn initial(kind: LayerKind) -> Self {
        Self { kind, elapsed_samples: 0, next_beat_in: None, rate_bpm: None, membrane: None }
    }

    /// Reject snapshots that cannot have come from a healthy layer
    pub fn validate(&self) -> EcgResult<()> {
        if let Some(rate) = self.rate_bpm {
            if !rate.is_finite() || rate < 0.0 {
                return Err(EcgError::InvalidLayerState {
                    reason: format!("rate_bpm {} is not a finite non-negative rate", rate),
                });
            }
        }
        if let Some(m) = &self.membrane {
            if !m.v_mv.is_finite() || !(-150.0..=100.0).contains(&m.v_mv) {
                return Err(EcgError::InvalidLayerState {
                    reason: format!("membrane potential {}mV outside plausible range", m.v_mv),
                });
            }
            for (name, gate) in [("m", m.m), ("h", m.h), ("n", m.n)] {
                if !(0.0..=1.0).contains(&gate) {
                    return Err(EcgError::InvalidLayerState {
                        reason: format!("gating variable {}={} outside [0, 1]", name, gate),
                    });
                }
            }
        }
        Ok(())
    }

    /// Timing carry for the shared beat scheduler, if one is in flight
    pub fn schedule_carry(&self) -> Option<ScheduleCarry> {
        match (self.next_beat_in, self.rate_bpm) {
            (Some(next), Some(rate)) => {
                Some(ScheduleCarry { next_beat_in: next as usize, rate_bpm: rate })
            }
            _ => None,
        }
    }
}

/// One fidelity level of the simulator
pub trait SimulationLayer {
    /// Which fidelity level this layer implements
    fn kind(&self) -> LayerKind;

    /// Produce one window of samples for every requested lead, in
    /// request order. The caller supplies the random source so the same
    /// seed reproduces the same output bit for bit.
    fn generate(
        &mut self,
        ctx: &GenerationContext<'_>,
        rng: &mut StdRng,
    ) -> EcgResult<Vec<(Lead, Vec<f64>)>>;

    /// Snapshot continuity state for a layer switch or chunk boundary
    fn export_state(&self) -> LayerState;

    /// Adopt continuity state from another layer. Implementations must
    /// validate before accepting; a rejected snapshot leaves the layer
    /// unchanged.
    fn restore_state(&mut self, state: &LayerState) -> EcgResult<()>;

    /// Forget all continuity state
    fn reset(&mut self);
}
