//! ECG-Simulation: Multi-fidelity synthetic electrocardiogram generation
//!
//! Three interchangeable layers produce waveforms for the same rhythm
//! taxonomy at increasing physiological fidelity:
//!
//! - [`LookupLayer`]: fast template-fragment composition
//! - [`ParametricLayer`]: sum-of-Gaussians morphology synthesis
//! - [`BiophysicalLayer`]: ionic membrane model plus a dipole forward problem
//!
//! [`EcgSimulator`] is the facade: it owns the catalog, the random source
//! and the active layer, and returns finished [`ecg_core::SignalRecord`]s.

pub mod biophysical;
pub mod layer;
pub mod lookup;
pub mod noise;
pub mod parametric;
pub mod schedule;
pub mod simulator;
pub mod template;

pub use biophysical::BiophysicalLayer;
pub use layer::{GenerationContext, LayerKind, LayerState, MembraneState, SimulationLayer};
pub use lookup::LookupLayer;
pub use noise::NoiseModel;
pub use parametric::ParametricLayer;
pub use schedule::{BeatClass, BeatEvent, BeatSchedule, ScheduleCarry};
pub use simulator::{EcgSimulator, SimulatorConfig};
