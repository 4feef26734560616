//! Editing session for one lab.
//!
//! A [`LabSession`] owns the live composition and step list. Saving works on
//! a snapshot: [`LabSession::begin_save`] hands out a [`SaveTicket`] and the
//! session stays editable while the ticket is being persisted. Only one
//! ticket may be alive at a time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::catalog::{Configuration, EquipmentCatalog, EquipmentTypeId};
use crate::composition::{
    Composition, CompositionError, Identity, PlacementInstance, WireConnection, WireOptions,
};
use crate::config::LabConfig;
use crate::save::{IdentityMap, SaveError, SaveGuard, SaveOutcome, SaveReconciler, SaveTicket};
use crate::steps::{ExperimentStep, StepList, StepPatch};

pub struct LabSession {
    lab_id: String,
    catalog: EquipmentCatalog,
    composition: Composition,
    steps: StepList,
    save_in_flight: Arc<AtomicBool>,
}

impl LabSession {
    pub fn new(lab_id: impl Into<String>, catalog: EquipmentCatalog) -> Self {
        Self::from_parts(lab_id, catalog, Composition::new(), StepList::new())
    }

    pub fn from_parts(
        lab_id: impl Into<String>,
        catalog: EquipmentCatalog,
        composition: Composition,
        steps: StepList,
    ) -> Self {
        Self {
            lab_id: lab_id.into(),
            catalog,
            composition,
            steps,
            save_in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_config(mut self, config: &LabConfig) -> Self {
        self.composition.set_options(config.editor.clone());
        self
    }

    pub fn lab_id(&self) -> &str {
        &self.lab_id
    }

    pub fn catalog(&self) -> &EquipmentCatalog {
        &self.catalog
    }

    pub fn composition(&self) -> &Composition {
        &self.composition
    }

    pub fn steps(&self) -> &StepList {
        &self.steps
    }

    pub fn steps_mut(&mut self) -> &mut StepList {
        &mut self.steps
    }

    // Editing

    pub fn add_placement(
        &mut self,
        equipment_type_id: &EquipmentTypeId,
        x: f64,
        y: f64,
    ) -> Result<Identity, CompositionError> {
        self.composition
            .add_placement(&self.catalog, equipment_type_id, x, y)
            .map(|p| p.identity.clone())
    }

    pub fn move_placement(&mut self, id: &Identity, x: f64, y: f64) -> Result<(), CompositionError> {
        self.composition.move_placement(id, x, y)
    }

    pub fn configure_placement(
        &mut self,
        id: &Identity,
        configuration: Configuration,
    ) -> Result<(), CompositionError> {
        self.composition.configure_placement(id, configuration)
    }

    pub fn remove_placement(&mut self, id: &Identity) -> Result<PlacementInstance, CompositionError> {
        self.composition.remove_placement(id)
    }

    pub fn connect(
        &mut self,
        source: &Identity,
        target: &Identity,
        options: WireOptions,
    ) -> Result<Identity, CompositionError> {
        self.composition
            .connect(source, target, options)
            .map(|c| c.identity.clone())
    }

    pub fn disconnect(&mut self, connection_id: &Identity) -> Result<WireConnection, CompositionError> {
        self.composition.disconnect(connection_id)
    }

    pub fn add_step(&mut self, description: impl Into<String>) -> &ExperimentStep {
        self.steps.add_step(description)
    }

    pub fn update_step(&mut self, index: usize, patch: StepPatch) -> bool {
        self.steps.update_step(index, patch)
    }

    pub fn remove_step(&mut self, index: usize) -> Option<ExperimentStep> {
        self.steps.remove_step(index)
    }

    // Saving

    pub fn is_saving(&self) -> bool {
        self.save_in_flight.load(Ordering::Acquire)
    }

    /// Snapshot the current state for saving.
    ///
    /// Fails with [`SaveError::InProgress`] while an earlier ticket is alive.
    pub fn begin_save(&self) -> Result<SaveTicket, SaveError> {
        let guard = SaveGuard::acquire(&self.save_in_flight)?;
        let ticket = SaveTicket::detached(
            self.lab_id.clone(),
            self.composition.placements().to_vec(),
            self.composition.connections().to_vec(),
            self.steps.as_slice().to_vec(),
        );
        Ok(ticket.guarded(guard))
    }

    /// Adopt the permanent identities of a completed save.
    ///
    /// Edits made while the save ran are kept; placements added in the
    /// meantime stay local until the next save.
    pub fn finish_save(&mut self, outcome: &SaveOutcome) {
        self.adopt(&outcome.identities);
    }

    /// Adopt whatever identities a partially failed save managed to store.
    /// Returns `true` if there was anything to adopt.
    pub fn recover_from(&mut self, error: &SaveError) -> bool {
        match error.persisted_identities() {
            Some(identities) => {
                tracing::info!(
                    "Adopting {} identities from failed {} save",
                    identities.len(),
                    error
                        .step()
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| "unknown".to_string())
                );
                self.adopt(identities);
                true
            }
            None => false,
        }
    }

    fn adopt(&mut self, identities: &IdentityMap) {
        self.composition.apply_identities(identities);
    }

    /// Snapshot, save and adopt in one go. Partial failures are adopted
    /// before the error is returned.
    pub async fn save_with(&mut self, reconciler: &SaveReconciler) -> Result<SaveOutcome, SaveError> {
        let ticket = self.begin_save()?;
        match reconciler.save(ticket).await {
            Ok(outcome) => {
                self.finish_save(&outcome);
                Ok(outcome)
            }
            Err(error) => {
                self.recover_from(&error);
                Err(error)
            }
        }
    }
}
