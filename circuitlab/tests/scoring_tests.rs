//! Scoring against the fixture labs

use circuitlab::prelude::*;
use circuitlab::scoring::Verdict;
use std::path::PathBuf;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn load(name: &str) -> LabDocument {
    LabDocument::from_path(&fixture_path(name)).unwrap()
}

#[test]
fn test_complete_candidate_scores_full_marks() {
    let report = LabCore::score_documents(
        &load("reference_lab.json"),
        &load("candidate_complete.json"),
        StepProgress::new(3, 3),
    );

    assert!(report.is_valid);
    assert_eq!(report.score, 100);
    assert!(report.errors.is_empty());
    assert_eq!(
        report.feedback,
        vec![
            "✓ You have placed 3 equipment items",
            "✓ All required equipment types are present",
            "✓ You have 3 connections",
            "✓ All steps completed",
        ]
    );
}

#[test]
fn test_missing_equipment_and_wires() {
    let report = LabCore::score_documents(
        &load("reference_lab.json"),
        &load("candidate_missing.json"),
        StepProgress::new(3, 3),
    );

    assert!(!report.is_valid);
    assert_eq!(report.score, 25);
    assert_eq!(
        report.errors,
        vec![
            "✗ Missing equipment: You have 1/3 items",
            "✗ Missing equipment: Power Supply, LED",
            "✗ Missing connections: You have 0/3 connections",
        ]
    );
    assert_eq!(report.feedback, vec!["✓ All steps completed"]);
}

#[test]
fn test_unwired_reference_with_no_candidate_wires() {
    let reference = load("reference_unwired.json");
    let mut candidate = reference.clone();
    candidate.lab_id = "student".to_string();

    let report = LabCore::score_documents(&reference, &candidate, StepProgress::new(0, 0));

    assert!(report.is_valid);
    assert_eq!(report.score, 100);
    assert!(report.feedback.contains(&"ℹ No connections created yet".to_string()));

    let note = report
        .outcomes
        .iter()
        .find(|o| o.check_id == "connections")
        .unwrap();
    assert_eq!(note.verdict, Verdict::Note);
}

#[test]
fn test_incomplete_steps_cost_one_point() {
    let report = LabCore::score_documents(
        &load("reference_lab.json"),
        &load("candidate_complete.json"),
        StepProgress::new(2, 3),
    );

    assert_eq!(report.score, 75);
    assert_eq!(report.errors, vec!["✗ Complete all steps: 2/3 done"]);
}

#[test]
fn test_scoring_is_deterministic() {
    let reference = load("reference_lab.json").composition();
    let candidate = load("candidate_missing.json").composition();
    let engine = ScoringEngine::with_default_checks();

    let first = engine.score_compositions(&candidate, &reference, StepProgress::new(1, 3));
    for _ in 0..10 {
        let again = engine.score_compositions(&candidate, &reference, StepProgress::new(1, 3));
        assert_eq!(again, first);
    }
}

#[test]
fn test_score_files_takes_step_total_from_reference() {
    let mut candidate = load("candidate_complete.json");
    candidate.steps.clear();
    let dir = tempfile::tempdir().unwrap();
    let candidate_path = dir.path().join("candidate.json");
    candidate.write_to(&candidate_path).unwrap();

    let report =
        LabCore::score_files(&fixture_path("reference_lab.json"), &candidate_path, None).unwrap();

    assert_eq!(report.score, 75);
    assert_eq!(report.errors, vec!["✗ Complete all steps: 0/3 done"]);
}

#[test]
fn test_report_serializes_for_the_frontend() {
    let report = LabCore::score_documents(
        &load("reference_lab.json"),
        &load("candidate_missing.json"),
        StepProgress::new(3, 3),
    );
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["isValid"], false);
    assert_eq!(json["score"], 25);
    assert_eq!(json["errors"].as_array().unwrap().len(), 3);
    assert_eq!(json["feedback"].as_array().unwrap().len(), 1);
}
