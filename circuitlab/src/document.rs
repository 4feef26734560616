//! JSON lab documents
//!
//! A [`LabDocument`] is the on-disk form of a lab: its equipment catalog,
//! the placed circuit and the experiment procedure. The CLI reads reference
//! and candidate circuits from these files.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::catalog::{EquipmentCatalog, EquipmentType};
use crate::composition::{Composition, PlacementInstance, WireConnection};
use crate::core::LabError;
use crate::save::{SaveOutcome, SaveTicket, StoredLab};
use crate::session::LabSession;
use crate::steps::{ExperimentStep, StepList};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabDocument {
    pub lab_id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub catalog: Vec<EquipmentType>,

    #[serde(default)]
    pub placements: Vec<PlacementInstance>,

    #[serde(default)]
    pub connections: Vec<WireConnection>,

    #[serde(default)]
    pub steps: Vec<ExperimentStep>,
}

impl LabDocument {
    pub fn new(lab_id: impl Into<String>) -> Self {
        Self {
            lab_id: lab_id.into(),
            ..Self::default()
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, LabError> {
        let content = std::fs::read_to_string(path)?;
        let document = Self::from_json(&content)?;
        tracing::debug!(
            "Loaded lab {} from {} ({} placements)",
            document.lab_id,
            path.display(),
            document.placements.len()
        );
        Ok(document)
    }

    pub fn from_json(content: &str) -> Result<Self, LabError> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn to_json(&self) -> Result<String, LabError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_to(&self, path: &Path) -> Result<(), LabError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Rebuild a document from what a backend has stored.
    pub fn from_stored(lab_id: impl Into<String>, stored: StoredLab) -> Self {
        Self {
            lab_id: lab_id.into(),
            placements: stored.placements,
            connections: stored.connections,
            steps: stored.steps,
            ..Self::default()
        }
    }

    pub fn catalog(&self) -> EquipmentCatalog {
        EquipmentCatalog::from_types(self.catalog.iter().cloned())
    }

    /// The circuit as a composition. Placements without a display name pick
    /// one up from the catalog. Wires are taken as stored.
    pub fn composition(&self) -> Composition {
        let catalog = self.catalog();
        let placements = self
            .placements
            .iter()
            .cloned()
            .map(|mut p| {
                if p.display_name.is_none() {
                    p.display_name = catalog.get(&p.equipment_type_id).map(|t| t.name.clone());
                }
                p
            })
            .collect();
        Composition::from_parts(placements, self.connections.clone())
    }

    pub fn step_list(&self) -> StepList {
        StepList::from_steps(self.steps.clone())
    }

    pub fn into_session(self) -> LabSession {
        let catalog = self.catalog();
        let composition = self.composition();
        let steps = self.step_list();
        LabSession::from_parts(self.lab_id, catalog, composition, steps)
    }

    /// A detached save ticket for the document's current contents.
    pub fn to_ticket(&self) -> SaveTicket {
        SaveTicket::detached(
            self.lab_id.clone(),
            self.placements.clone(),
            self.connections.clone(),
            self.step_list().as_slice().to_vec(),
        )
    }

    /// Copy of this document carrying the identities assigned by a save.
    pub fn with_reconciled(&self, outcome: &SaveOutcome) -> Self {
        Self {
            placements: outcome.placements.clone(),
            connections: outcome.connections.clone(),
            ..self.clone()
        }
    }
}
