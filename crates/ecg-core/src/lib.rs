//! ECG-Core: Foundation types for synthetic electrocardiogram generation
//!
//! Rhythm taxonomy, per-rhythm configuration records, the signal container
//! and the error type shared by every crate in the workspace.

pub mod catalog;
pub mod error;
pub mod lead;
pub mod rhythm;
pub mod signal_record;

pub use catalog::RhythmCatalog;
pub use error::{EcgError, EcgResult};
pub use lead::Lead;
pub use rhythm::*;
pub use signal_record::*;
