//! Persistence backend trait
//!
//! The storage layer is external; this trait is the contract the save
//! protocol relies on. Implementations must honour two rules:
//!
//! - `persist_placements` returns exactly one id per submitted placement,
//!   in submission order. Position is the only correlation key.
//! - A placement submitted with a `Persisted` identity is an update and gets
//!   the same id back, so re-running a save after a partial failure does not
//!   duplicate equipment.

use async_trait::async_trait;
use thiserror::Error;

use crate::composition::{PersistedId, PlacementInstance, WireConnection};
use crate::steps::ExperimentStep;

/// Errors raised by a storage backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Lock error: {0}")]
    Lock(String),

    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

/// Everything stored for one lab.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoredLab {
    pub placements: Vec<PlacementInstance>,
    pub connections: Vec<WireConnection>,
    pub steps: Vec<ExperimentStep>,
}

/// Storage used by the save protocol. Each call replaces the stored set of
/// its kind for the lab.
#[async_trait]
pub trait PersistenceBackend: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &str;

    /// Store placements; returns permanent ids in submission order.
    async fn persist_placements(
        &self,
        lab_id: &str,
        placements: &[PlacementInstance],
    ) -> Result<Vec<PersistedId>, StoreError>;

    async fn persist_connections(
        &self,
        lab_id: &str,
        connections: &[WireConnection],
    ) -> Result<(), StoreError>;

    async fn persist_steps(&self, lab_id: &str, steps: &[ExperimentStep]) -> Result<(), StoreError>;

    /// Read back what is stored for a lab.
    async fn load_lab(&self, lab_id: &str) -> Result<StoredLab, StoreError>;
}
