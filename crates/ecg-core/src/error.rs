//! Error handling for the cardiosim workspace
//!
//! One error type covers catalog lookups, record construction and the
//! numerical failure modes of the simulation layers.

use core::fmt;

use crate::lead::Lead;
use crate::rhythm::Rhythm;

/// Result type alias for cardiosim operations
pub type EcgResult<T> = Result<T, EcgError>;

/// Error type for all cardiosim operations
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum EcgError {
    /// Requested rhythm has no entry in the active catalog
    UnknownRhythm {
        /// The rhythm that was requested
        rhythm: Rhythm,
    },

    /// Requested lead is not present in a signal record
    UnknownLead {
        /// The lead that was requested
        requested: Lead,
        /// Leads the record actually contains
        available: Vec<Lead>,
    },

    /// Invalid generation parameters (duration, noise level, hrv, ...)
    InvalidSignalConfig {
        /// Description of the configuration error
        reason: String,
    },

    /// Lead sample buffers of unequal length, or length not matching
    /// duration * sampling_rate
    InconsistentRecord {
        /// Description of the inconsistency
        reason: String,
    },

    /// Sampling rate outside the supported range
    InvalidSamplingRate {
        /// Provided sampling rate in Hz
        rate: u32,
        /// Valid range description
        valid_range: &'static str,
    },

    /// Layer state snapshot rejected on transfer
    InvalidLayerState {
        /// Description of the rejected field
        reason: String,
    },

    /// The ionic integrator produced non-finite values despite clamping
    NumericalInstability {
        /// Rhythm being simulated when the integrator diverged
        rhythm: Rhythm,
        /// Integration step size in milliseconds
        step_ms: f64,
    },

    /// General simulation failure
    SimulationError {
        /// Description of the failure
        reason: String,
    },
}

impl fmt::Display for EcgError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EcgError::UnknownRhythm { rhythm } => {
                write!(f, "Unknown rhythm: no catalog entry for '{}'", rhythm.as_str())
            }
            EcgError::UnknownLead { requested, available } => {
                let names: Vec<&str> = available.iter().map(|l| l.as_str()).collect();
                write!(
                    f,
                    "Lead {} not found in record; available leads: [{}]",
                    requested,
                    names.join(", ")
                )
            }
            EcgError::InvalidSignalConfig { reason } => {
                write!(f, "Invalid signal configuration: {}", reason)
            }
            EcgError::InconsistentRecord { reason } => {
                write!(f, "Inconsistent signal record: {}", reason)
            }
            EcgError::InvalidSamplingRate { rate, valid_range } => {
                write!(f, "Invalid sampling rate: {}Hz, valid range: {}", rate, valid_range)
            }
            EcgError::InvalidLayerState { reason } => {
                write!(f, "Invalid layer state: {}", reason)
            }
            EcgError::NumericalInstability { rhythm, step_ms } => {
                write!(
                    f,
                    "Ionic integrator diverged for rhythm '{}' at step size {}ms",
                    rhythm.as_str(),
                    step_ms
                )
            }
            EcgError::SimulationError { reason } => {
                write!(f, "Simulation error: {}", reason)
            }
        }
    }
}

impl std::error::Error for EcgError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_lead_display_names_both_sides() {
        let error = EcgError::UnknownLead {
            requested: Lead::V3,
            available: vec![Lead::I, Lead::II],
        };
        let display = format!("{}", error);
        assert!(display.contains("V3"));
        assert!(display.contains("I, II"));
    }

    #[test]
    fn test_error_equality() {
        let error1 = EcgError::InvalidSignalConfig { reason: "test".to_string() };
        let error2 = EcgError::InvalidSignalConfig { reason: "test".to_string() };
        assert_eq!(error1, error2);
    }

    #[test]
    fn test_unknown_rhythm_display() {
        let error = EcgError::UnknownRhythm { rhythm: Rhythm::Asystole };
        assert!(format!("{}", error).contains("asystole"));
    }
}
