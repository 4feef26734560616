//! Save Reconciliation Module
//!
//! Persists a lab's placements, wires and steps and swaps client-side
//! identities for permanent ones.
//!
//! ```text
//!  SaveTicket ──▶ persist_placements ──▶ IdentityMap ──▶ persist_connections ──▶ persist_steps
//!  (snapshot)        (ordered ids)       (zip by pos)      (rewritten wires)
//! ```
//!
//! Backends:
//! - [`MemoryBackend`] - in-process, with fault injection for tests
//! - [`SqliteBackend`] - rusqlite file or in-memory database

pub mod backend;
pub mod identity_map;
pub mod memory;
pub mod reconcile;
pub mod sqlite;

pub use backend::{PersistenceBackend, StoreError, StoredLab};
pub use identity_map::IdentityMap;
pub use memory::{Fault, MemoryBackend};
pub use reconcile::{SaveError, SaveGuard, SaveOutcome, SaveReconciler, SaveStep, SaveTicket};
pub use sqlite::SqliteBackend;
