//! Core lab operations shared by the CLI and embedding applications.
//! No terminal or runtime setup here.

use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

use crate::composition::{CompositionError, CompositionStats, Identity};
use crate::document::LabDocument;
use crate::save::{PersistenceBackend, SaveError, SaveReconciler, StoreError};
use crate::scoring::{ScoreReport, ScoringEngine};
use crate::steps::StepProgress;

#[derive(Debug, thiserror::Error)]
pub enum LabError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Composition(#[from] CompositionError),
    #[error(transparent)]
    Save(#[from] SaveError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Structural summary of one lab document.
#[derive(Debug, Clone, Serialize)]
pub struct Inspection {
    pub lab_id: String,
    pub stats: CompositionStats,
    /// Wires whose endpoints are missing or identical
    pub unresolved: Vec<Identity>,
    /// Placements not attached to any wire
    pub isolated: Vec<Identity>,
    pub local_placements: usize,
    pub steps: usize,
}

/// Core lab API used by the CLI.
pub struct LabCore;

impl LabCore {
    /// Score a candidate circuit against a reference with the default checks.
    pub fn score_documents(
        reference: &LabDocument,
        candidate: &LabDocument,
        progress: StepProgress,
    ) -> ScoreReport {
        let reference = reference.composition();
        let candidate = candidate.composition();
        ScoringEngine::with_default_checks().score_compositions(&candidate, &reference, progress)
    }

    /// Load both documents from disk and score them.
    ///
    /// When `progress` is `None` the reference's step list counts as the
    /// total with nothing completed.
    pub fn score_files(
        reference: &Path,
        candidate: &Path,
        progress: Option<StepProgress>,
    ) -> Result<ScoreReport, LabError> {
        let reference = LabDocument::from_path(reference)?;
        let candidate = LabDocument::from_path(candidate)?;
        let progress = progress.unwrap_or_else(|| StepProgress::new(0, reference.steps.len()));
        Ok(Self::score_documents(&reference, &candidate, progress))
    }

    pub fn inspect(document: &LabDocument) -> Inspection {
        let composition = document.composition();
        let graph = composition.graph();
        Inspection {
            lab_id: document.lab_id.clone(),
            stats: graph.stats(),
            unresolved: composition
                .unresolved_connections()
                .into_iter()
                .map(|c| c.identity.clone())
                .collect(),
            isolated: graph
                .isolated_placements()
                .into_iter()
                .map(|p| p.identity.clone())
                .collect(),
            local_placements: composition
                .placements()
                .iter()
                .filter(|p| p.identity.is_local())
                .count(),
            steps: document.steps.len(),
        }
    }

    /// Run the save protocol for a document and return it with permanent
    /// identities.
    pub async fn save_document(
        document: &LabDocument,
        backend: Arc<dyn PersistenceBackend>,
    ) -> Result<LabDocument, LabError> {
        let reconciler = SaveReconciler::new(backend);
        let outcome = reconciler.save(document.to_ticket()).await?;
        Ok(document.with_reconciled(&outcome))
    }
}
