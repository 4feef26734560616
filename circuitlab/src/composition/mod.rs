//! Circuit Composition Module
//!
//! In-memory model of one circuit: equipment placed on a canvas and the
//! wires between them. The same types describe an instructor's reference
//! circuit and a student's candidate.

pub mod identity;
pub mod model;
pub mod editor;
pub mod graph;

pub use identity::{Identity, LocalToken, PersistedId};
pub use model::{PlacementInstance, Position, WireConnection};
pub use editor::{Composition, CompositionError, WireOptions};
pub use graph::{CompositionGraph, CompositionStats};
