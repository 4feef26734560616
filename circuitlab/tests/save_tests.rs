//! Save reconciliation against the memory and SQLite backends

use circuitlab::composition::PlacementInstance;
use circuitlab::save::{
    Fault, MemoryBackend, PersistenceBackend, SaveError, SaveReconciler, SaveStep, SaveTicket,
    SqliteBackend,
};
use circuitlab::{Identity, LabCore, LabDocument, WireConnection};
use std::path::PathBuf;
use std::sync::Arc;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn draft() -> LabDocument {
    LabDocument::from_path(&fixture_path("draft_lab.json")).unwrap()
}

#[tokio::test]
async fn test_local_identities_become_permanent() {
    let backend = Arc::new(MemoryBackend::new());
    let reconciler = SaveReconciler::new(backend.clone());

    let outcome = reconciler.save(draft().to_ticket()).await.unwrap();

    let ids: Vec<&Identity> = outcome.placements.iter().map(|p| &p.identity).collect();
    assert_eq!(
        ids,
        vec![
            &Identity::persisted("p1"),
            &Identity::persisted("p2"),
            &Identity::persisted("p3"),
        ]
    );
    assert_eq!(outcome.connections[0].source, Identity::persisted("p1"));
    assert_eq!(outcome.connections[0].target, Identity::persisted("p2"));
    assert_eq!(outcome.connections[1].source, Identity::persisted("p2"));
    assert_eq!(outcome.connections[1].target, Identity::persisted("p3"));
    assert_eq!(outcome.identities.len(), 3);

    let stored = backend.load_lab("ohms-law-draft").await.unwrap();
    assert_eq!(stored.placements.len(), 3);
    assert_eq!(stored.connections.len(), 2);
    assert_eq!(stored.connections[1].target, Identity::persisted("p3"));
    assert_eq!(stored.steps.len(), 2);
}

#[tokio::test]
async fn test_short_id_list_stops_the_save() {
    let backend = Arc::new(MemoryBackend::new());
    backend.inject(Fault::DropPlacementId).await;
    let reconciler = SaveReconciler::new(backend.clone());

    let err = reconciler.save(draft().to_ticket()).await.unwrap_err();
    assert!(matches!(
        err,
        SaveError::CorrelationMismatch {
            submitted: 3,
            returned: 2
        }
    ));
    assert_eq!(err.step(), Some(SaveStep::Placements));

    // Nothing past the placement write happened
    let stored = backend.load_lab("ohms-law-draft").await.unwrap();
    assert!(stored.connections.is_empty());
    assert!(stored.steps.is_empty());
}

#[tokio::test]
async fn test_connection_failure_carries_identities_and_retry_is_idempotent() {
    let backend = Arc::new(MemoryBackend::new());
    backend.inject(Fault::FailConnections).await;
    let reconciler = SaveReconciler::new(backend.clone());

    let mut session = draft().into_session();
    let err = session.save_with(&reconciler).await.unwrap_err();
    assert_eq!(err.step(), Some(SaveStep::Connections));
    assert_eq!(err.persisted_identities().map(|m| m.len()), Some(3));

    // The session adopted the permanent ids before the error came back
    assert!(session
        .composition()
        .placements()
        .iter()
        .all(|p| p.identity.is_persisted()));

    session.save_with(&reconciler).await.unwrap();
    let stored = backend.load_lab("ohms-law-draft").await.unwrap();
    let ids: Vec<String> = stored
        .placements
        .iter()
        .map(|p| p.identity.to_string())
        .collect();
    assert_eq!(ids, vec!["p1", "p2", "p3"]);
    assert_eq!(stored.connections.len(), 2);
}

#[tokio::test]
async fn test_placement_failure_returns_no_identities() {
    let backend = Arc::new(MemoryBackend::new());
    backend.inject(Fault::FailPlacements).await;
    let reconciler = SaveReconciler::new(backend);

    let mut session = draft().into_session();
    let err = session.save_with(&reconciler).await.unwrap_err();
    assert!(matches!(err, SaveError::Placements { .. }));
    assert!(err.persisted_identities().is_none());
    assert!(session
        .composition()
        .placements()
        .iter()
        .all(|p| p.identity.is_local()));
    assert!(!session.is_saving());
}

#[tokio::test]
async fn test_dangling_wire_keeps_its_endpoint() {
    let ticket = SaveTicket::detached(
        "dangling",
        vec![PlacementInstance::new(Identity::local("temp-1"), "resistor")],
        vec![WireConnection::new(
            Identity::local("w"),
            Identity::local("temp-1"),
            Identity::local("removed"),
        )],
        Vec::new(),
    );

    let outcome = SaveReconciler::new(Arc::new(MemoryBackend::new()))
        .save(ticket)
        .await
        .unwrap();
    assert_eq!(outcome.connections[0].source, Identity::persisted("p1"));
    assert_eq!(outcome.connections[0].target, Identity::local("removed"));
}

#[tokio::test]
async fn test_sqlite_save_and_reload() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("labs.db");

    let saved = {
        let backend = Arc::new(SqliteBackend::open(&db_path).unwrap());
        LabCore::save_document(&draft(), backend).await.unwrap()
    };
    assert!(saved.placements.iter().all(|p| p.identity.is_persisted()));

    // A fresh connection sees the same data
    let backend = SqliteBackend::open(&db_path).unwrap();
    let stored = backend.load_lab("ohms-law-draft").await.unwrap();
    let reloaded = LabDocument::from_stored("ohms-law-draft", stored);

    let saved_ids: Vec<&Identity> = saved.placements.iter().map(|p| &p.identity).collect();
    let reloaded_ids: Vec<&Identity> = reloaded.placements.iter().map(|p| &p.identity).collect();
    assert_eq!(saved_ids, reloaded_ids);
    assert_eq!(reloaded.connections.len(), 2);
    assert_eq!(reloaded.connections[0].source, saved.placements[0].identity);
    assert_eq!(reloaded.steps[1].unit.as_deref(), Some("A"));
    assert!(reloaded.composition().unresolved_connections().is_empty());

    // Saving the reconciled document again keeps every id
    let resaved = LabCore::save_document(&saved, Arc::new(backend)).await.unwrap();
    let resaved_ids: Vec<&Identity> = resaved.placements.iter().map(|p| &p.identity).collect();
    assert_eq!(resaved_ids, saved_ids);
}

#[tokio::test]
async fn test_sqlite_labs_sharing_ids_stay_separate() {
    let dir = tempfile::tempdir().unwrap();
    let backend = Arc::new(SqliteBackend::open(&dir.path().join("labs.db")).unwrap());

    let reference = LabDocument::from_path(&fixture_path("reference_lab.json")).unwrap();
    let mut attempt = reference.clone();
    attempt.lab_id = "student-attempt".to_string();

    LabCore::save_document(&reference, backend.clone()).await.unwrap();
    LabCore::save_document(&attempt, backend.clone()).await.unwrap();

    let stored = backend.load_lab("ohms-law").await.unwrap();
    assert_eq!(stored.placements.len(), 3);
    assert_eq!(stored.connections.len(), 3);
    assert_eq!(stored.steps.len(), 3);

    let copied = backend.load_lab("student-attempt").await.unwrap();
    assert_eq!(copied.placements.len(), 3);
    assert_eq!(copied.connections.len(), 3);

    // Replacing one lab's placements leaves the other untouched
    attempt.placements.truncate(1);
    LabCore::save_document(&attempt, backend.clone()).await.unwrap();
    assert_eq!(backend.load_lab("ohms-law").await.unwrap().placements.len(), 3);
    assert_eq!(backend.load_lab("student-attempt").await.unwrap().placements.len(), 1);
}
