//! Save reconciliation protocol
//!
//! Turns a snapshot holding local identities into stored data with permanent
//! identities, in three sequential writes:
//!
//! 1. placements, in snapshot order, returning permanent ids in that order
//! 2. wires, with endpoints rewritten through the resulting [`IdentityMap`]
//! 3. experiment steps
//!
//! The writes are not transactional. A failure after step 1 leaves the
//! placements stored; the error carries the identity map so the caller can
//! adopt the permanent ids before retrying.

use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

use super::backend::{PersistenceBackend, StoreError};
use super::identity_map::IdentityMap;
use crate::composition::{PlacementInstance, WireConnection};
use crate::steps::ExperimentStep;

/// Which write of the protocol failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStep {
    Placements,
    Connections,
    Steps,
}

impl fmt::Display for SaveStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveStep::Placements => write!(f, "placements"),
            SaveStep::Connections => write!(f, "connections"),
            SaveStep::Steps => write!(f, "steps"),
        }
    }
}

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("A save is already in progress")]
    InProgress,

    #[error("Saving placements failed: {source}")]
    Placements {
        #[source]
        source: StoreError,
    },

    #[error("Backend returned {returned} ids for {submitted} placements")]
    CorrelationMismatch { submitted: usize, returned: usize },

    #[error("Saving connections failed (placements were saved): {source}")]
    Connections {
        identities: IdentityMap,
        #[source]
        source: StoreError,
    },

    #[error("Saving steps failed (placements and connections were saved): {source}")]
    Steps {
        identities: IdentityMap,
        #[source]
        source: StoreError,
    },
}

impl SaveError {
    /// The write that failed, if the failure came from the backend.
    pub fn step(&self) -> Option<SaveStep> {
        match self {
            SaveError::InProgress => None,
            SaveError::Placements { .. } | SaveError::CorrelationMismatch { .. } => {
                Some(SaveStep::Placements)
            }
            SaveError::Connections { .. } => Some(SaveStep::Connections),
            SaveError::Steps { .. } => Some(SaveStep::Steps),
        }
    }

    /// Permanent identities already stored before the failure.
    pub fn persisted_identities(&self) -> Option<&IdentityMap> {
        match self {
            SaveError::Connections { identities, .. } | SaveError::Steps { identities, .. } => {
                Some(identities)
            }
            _ => None,
        }
    }
}

/// Clears the in-flight flag when dropped.
#[derive(Debug)]
pub struct SaveGuard {
    flag: Arc<AtomicBool>,
}

impl SaveGuard {
    /// Claim `flag`, or fail if another save holds it.
    pub fn acquire(flag: &Arc<AtomicBool>) -> Result<Self, SaveError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| SaveError::InProgress)?;
        Ok(Self { flag: flag.clone() })
    }
}

impl Drop for SaveGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Owned snapshot of what to save. Holding a ticket blocks further saves of
/// the same session; editing continues on the live state.
#[derive(Debug)]
pub struct SaveTicket {
    pub lab_id: String,
    pub placements: Vec<PlacementInstance>,
    pub connections: Vec<WireConnection>,
    pub steps: Vec<ExperimentStep>,
    _guard: Option<SaveGuard>,
}

impl SaveTicket {
    /// A ticket not tied to any session.
    pub fn detached(
        lab_id: impl Into<String>,
        placements: Vec<PlacementInstance>,
        connections: Vec<WireConnection>,
        steps: Vec<ExperimentStep>,
    ) -> Self {
        Self {
            lab_id: lab_id.into(),
            placements,
            connections,
            steps,
            _guard: None,
        }
    }

    pub(crate) fn guarded(mut self, guard: SaveGuard) -> Self {
        self._guard = Some(guard);
        self
    }
}

/// Result of a fully successful save.
#[derive(Debug, Clone)]
pub struct SaveOutcome {
    pub lab_id: String,
    pub identities: IdentityMap,
    /// Saved placements, now with permanent identities
    pub placements: Vec<PlacementInstance>,
    /// Saved wires, endpoints rewritten
    pub connections: Vec<WireConnection>,
    pub saved_at: DateTime<Utc>,
}

/// Runs the protocol against a backend.
pub struct SaveReconciler {
    backend: Arc<dyn PersistenceBackend>,
}

impl SaveReconciler {
    pub fn new(backend: Arc<dyn PersistenceBackend>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &Arc<dyn PersistenceBackend> {
        &self.backend
    }

    pub async fn save(&self, ticket: SaveTicket) -> Result<SaveOutcome, SaveError> {
        let lab_id = ticket.lab_id.as_str();
        tracing::info!(
            "Saving lab {} via {}: {} placements, {} connections, {} steps",
            lab_id,
            self.backend.name(),
            ticket.placements.len(),
            ticket.connections.len(),
            ticket.steps.len()
        );

        let returned = self
            .backend
            .persist_placements(lab_id, &ticket.placements)
            .await
            .map_err(|source| SaveError::Placements { source })?;

        let identities = IdentityMap::correlate(&ticket.placements, &returned).ok_or_else(|| {
            tracing::warn!(
                "Backend returned {} ids for {} placements; refusing to map identities",
                returned.len(),
                ticket.placements.len()
            );
            SaveError::CorrelationMismatch {
                submitted: ticket.placements.len(),
                returned: returned.len(),
            }
        })?;

        let connections = identities.rewrite_connections(&ticket.connections);
        if let Err(source) = self.backend.persist_connections(lab_id, &connections).await {
            return Err(SaveError::Connections { identities, source });
        }

        if let Err(source) = self.backend.persist_steps(lab_id, &ticket.steps).await {
            return Err(SaveError::Steps { identities, source });
        }

        let placements = ticket
            .placements
            .iter()
            .map(|p| PlacementInstance {
                identity: identities.rewrite(&p.identity),
                ..p.clone()
            })
            .collect();

        tracing::info!("Saved lab {} ({} identities mapped)", lab_id, identities.len());
        Ok(SaveOutcome {
            lab_id: ticket.lab_id.clone(),
            identities,
            placements,
            connections,
            saved_at: Utc::now(),
        })
    }
}
