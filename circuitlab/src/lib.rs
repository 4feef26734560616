//! circuitlab - virtual electronics lab engine
//!
//! Students place equipment on a canvas, wire it together and are scored
//! against an instructor's reference circuit.
//!
//! # Quick Start
//!
//! ```no_run
//! use circuitlab::{LabCore, LabDocument, StepProgress};
//! use std::path::Path;
//!
//! let reference = LabDocument::from_path(Path::new("reference.json")).unwrap();
//! let candidate = LabDocument::from_path(Path::new("candidate.json")).unwrap();
//!
//! let report = LabCore::score_documents(&reference, &candidate, StepProgress::new(3, 3));
//! println!("{}/100", report.score);
//! for line in report.feedback.iter().chain(&report.errors) {
//!     println!("{}", line);
//! }
//! ```
//!
//! # Features
//!
//! - **Composition editor**: placements, wires, cascade delete
//! - **Save reconciliation**: local to permanent identities across three writes
//! - **Scoring**: quantity, type coverage, connectivity and step checks
//! - **Storage**: in-memory and SQLite backends

pub mod catalog;
pub mod composition;
pub mod config;
pub mod core;
pub mod document;
pub mod save;
pub mod scoring;
pub mod session;
pub mod steps;

// Re-export main types
pub use catalog::{Configuration, EquipmentCatalog, EquipmentType, EquipmentTypeId};
pub use composition::{
    Composition, CompositionError, Identity, PlacementInstance, Position, WireConnection,
    WireOptions,
};
pub use config::LabConfig;
pub use core::{Inspection, LabCore, LabError};
pub use document::LabDocument;
pub use save::{
    MemoryBackend, PersistenceBackend, SaveError, SaveOutcome, SaveReconciler, SqliteBackend,
};
pub use scoring::{Check, ScoreReport, ScoringEngine, ScoringInput};
pub use session::LabSession;
pub use steps::{ExperimentStep, StepList, StepProgress};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        Composition, EquipmentCatalog, Identity, LabCore, LabDocument, LabError, LabSession,
        ScoreReport, ScoringEngine, StepProgress, WireOptions,
    };
}
