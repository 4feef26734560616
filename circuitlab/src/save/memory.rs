//! In-memory persistence backend
//!
//! Hands out sequential ids (`p1`, `p2`, … for placements, `w1`, … for
//! wires). Faults can be queued to exercise partial-save handling.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::{Mutex, RwLock};

use super::backend::{PersistenceBackend, StoreError, StoredLab};
use crate::composition::{Identity, PersistedId, PlacementInstance, WireConnection};
use crate::steps::ExperimentStep;

/// Failure the backend should produce on its next matching call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    FailPlacements,
    FailConnections,
    FailSteps,
    /// Return one id fewer than submitted
    DropPlacementId,
}

#[derive(Default)]
struct Counters {
    placements: u64,
    wires: u64,
}

#[derive(Default)]
pub struct MemoryBackend {
    labs: RwLock<HashMap<String, StoredLab>>,
    counters: Mutex<Counters>,
    faults: Mutex<Vec<Fault>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a fault; it fires once.
    pub async fn inject(&self, fault: Fault) {
        self.faults.lock().await.push(fault);
    }

    async fn take_fault(&self, fault: Fault) -> bool {
        let mut faults = self.faults.lock().await;
        match faults.iter().position(|f| *f == fault) {
            Some(pos) => {
                faults.remove(pos);
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl PersistenceBackend for MemoryBackend {
    fn name(&self) -> &str {
        "memory"
    }

    async fn persist_placements(
        &self,
        lab_id: &str,
        placements: &[PlacementInstance],
    ) -> Result<Vec<PersistedId>, StoreError> {
        if self.take_fault(Fault::FailPlacements).await {
            return Err(StoreError::Unavailable("placements write failed".to_string()));
        }

        let mut ids = Vec::with_capacity(placements.len());
        let mut stored = Vec::with_capacity(placements.len());
        {
            let mut counters = self.counters.lock().await;
            for placement in placements {
                let permanent = match &placement.identity {
                    Identity::Persisted(id) => id.clone(),
                    Identity::Local(_) => {
                        counters.placements += 1;
                        PersistedId::new(format!("p{}", counters.placements))
                    }
                };
                stored.push(PlacementInstance {
                    identity: Identity::Persisted(permanent.clone()),
                    ..placement.clone()
                });
                ids.push(permanent);
            }
        }

        self.labs
            .write()
            .await
            .entry(lab_id.to_string())
            .or_default()
            .placements = stored;

        if self.take_fault(Fault::DropPlacementId).await {
            ids.pop();
        }
        Ok(ids)
    }

    async fn persist_connections(
        &self,
        lab_id: &str,
        connections: &[WireConnection],
    ) -> Result<(), StoreError> {
        if self.take_fault(Fault::FailConnections).await {
            return Err(StoreError::Unavailable("connections write failed".to_string()));
        }

        let mut stored = Vec::with_capacity(connections.len());
        {
            let mut counters = self.counters.lock().await;
            for wire in connections {
                let identity = match &wire.identity {
                    Identity::Persisted(_) => wire.identity.clone(),
                    Identity::Local(_) => {
                        counters.wires += 1;
                        Identity::persisted(format!("w{}", counters.wires))
                    }
                };
                stored.push(WireConnection {
                    identity,
                    ..wire.clone()
                });
            }
        }

        self.labs
            .write()
            .await
            .entry(lab_id.to_string())
            .or_default()
            .connections = stored;
        Ok(())
    }

    async fn persist_steps(&self, lab_id: &str, steps: &[ExperimentStep]) -> Result<(), StoreError> {
        if self.take_fault(Fault::FailSteps).await {
            return Err(StoreError::Unavailable("steps write failed".to_string()));
        }
        self.labs
            .write()
            .await
            .entry(lab_id.to_string())
            .or_default()
            .steps = steps.to_vec();
        Ok(())
    }

    async fn load_lab(&self, lab_id: &str) -> Result<StoredLab, StoreError> {
        Ok(self.labs.read().await.get(lab_id).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_persisted_placements_keep_their_id() {
        let backend = MemoryBackend::new();
        let first = backend
            .persist_placements(
                "lab-1",
                &[PlacementInstance::new(Identity::local("temp-1"), "resistor")],
            )
            .await
            .unwrap();
        assert_eq!(first, vec![PersistedId::from("p1")]);

        let again = backend
            .persist_placements(
                "lab-1",
                &[
                    PlacementInstance::new(Identity::persisted("p1"), "resistor"),
                    PlacementInstance::new(Identity::local("temp-2"), "led"),
                ],
            )
            .await
            .unwrap();
        assert_eq!(again, vec![PersistedId::from("p1"), PersistedId::from("p2")]);

        let stored = backend.load_lab("lab-1").await.unwrap();
        assert_eq!(stored.placements.len(), 2);
    }

    #[tokio::test]
    async fn test_faults_fire_once() {
        let backend = MemoryBackend::new();
        backend.inject(Fault::FailSteps).await;

        assert!(backend.persist_steps("lab-1", &[]).await.is_err());
        assert!(backend.persist_steps("lab-1", &[]).await.is_ok());
    }

    #[tokio::test]
    async fn test_unknown_lab_loads_empty() {
        let backend = MemoryBackend::new();
        assert_eq!(backend.load_lab("nope").await.unwrap(), StoredLab::default());
    }
}
