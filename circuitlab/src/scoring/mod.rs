//! Validation/Scoring Engine
//!
//! Compares a student's candidate circuit against the instructor's reference
//! and produces a score out of 100 with itemized feedback. Scoring is a pure
//! function of its inputs: no I/O, no clock, no randomness.
//!
//! Each [`Check`] contributes one point. Checks run in registration order,
//! all of them, every time; `score = round(100 * passed / checks)`.

pub mod checks;

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::composition::{Composition, PlacementInstance, WireConnection};
use crate::steps::StepProgress;

pub use checks::{ConnectivityCheck, QuantityCheck, StepCompletionCheck, TypeCoverageCheck};

/// Borrowed snapshot of everything a check may look at.
#[derive(Debug, Clone, Copy)]
pub struct ScoringInput<'a> {
    pub candidate_placements: &'a [PlacementInstance],
    pub candidate_connections: &'a [WireConnection],
    pub reference_placements: &'a [PlacementInstance],
    pub reference_connections: &'a [WireConnection],
    pub progress: StepProgress,
}

impl<'a> ScoringInput<'a> {
    pub fn new(
        candidate_placements: &'a [PlacementInstance],
        candidate_connections: &'a [WireConnection],
        reference_placements: &'a [PlacementInstance],
        reference_connections: &'a [WireConnection],
        progress: StepProgress,
    ) -> Self {
        Self {
            candidate_placements,
            candidate_connections,
            reference_placements,
            reference_connections,
            progress,
        }
    }

    pub fn from_compositions(
        candidate: &'a Composition,
        reference: &'a Composition,
        progress: StepProgress,
    ) -> Self {
        Self::new(
            candidate.placements(),
            candidate.connections(),
            reference.placements(),
            reference.connections(),
            progress,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Pass,
    /// Passes, with an informational rather than congratulatory message
    Note,
    Fail,
}

impl Verdict {
    pub fn is_passing(&self) -> bool {
        !matches!(self, Verdict::Fail)
    }
}

/// Result of a single check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckOutcome {
    pub check_id: String,
    pub verdict: Verdict,
    pub message: String,
}

impl CheckOutcome {
    pub fn pass(check_id: &str, message: impl Into<String>) -> Self {
        Self::with_verdict(check_id, Verdict::Pass, message)
    }

    pub fn note(check_id: &str, message: impl Into<String>) -> Self {
        Self::with_verdict(check_id, Verdict::Note, message)
    }

    pub fn fail(check_id: &str, message: impl Into<String>) -> Self {
        Self::with_verdict(check_id, Verdict::Fail, message)
    }

    fn with_verdict(check_id: &str, verdict: Verdict, message: impl Into<String>) -> Self {
        Self {
            check_id: check_id.to_string(),
            verdict,
            message: message.into(),
        }
    }
}

pub trait Check: Send + Sync {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn evaluate(&self, input: &ScoringInput<'_>) -> CheckOutcome;
}

/// Final report shown to the student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreReport {
    pub is_valid: bool,
    /// 0..=100
    pub score: u8,
    /// Passing messages, in check order
    pub feedback: Vec<String>,
    /// Failing messages, in check order
    pub errors: Vec<String>,
    #[serde(skip)]
    pub outcomes: Vec<CheckOutcome>,
}

impl ScoreReport {
    pub fn passed_checks(&self) -> usize {
        self.outcomes.iter().filter(|o| o.verdict.is_passing()).count()
    }

    pub fn total_checks(&self) -> usize {
        self.outcomes.len()
    }
}

pub struct ScoringEngine {
    checks: Vec<Arc<dyn Check>>,
}

impl ScoringEngine {
    pub fn new() -> Self {
        Self { checks: Vec::new() }
    }

    /// Quantity, type coverage, connectivity, step completion.
    pub fn with_default_checks() -> Self {
        let mut engine = Self::new();
        engine.add_check(Arc::new(QuantityCheck));
        engine.add_check(Arc::new(TypeCoverageCheck));
        engine.add_check(Arc::new(ConnectivityCheck));
        engine.add_check(Arc::new(StepCompletionCheck));
        engine
    }

    pub fn add_check(&mut self, check: Arc<dyn Check>) {
        self.checks.push(check);
    }

    pub fn checks(&self) -> impl Iterator<Item = &dyn Check> {
        self.checks.iter().map(|c| c.as_ref())
    }

    pub fn score(&self, input: &ScoringInput<'_>) -> ScoreReport {
        let outcomes: Vec<CheckOutcome> = self.checks.iter().map(|c| c.evaluate(input)).collect();

        let mut feedback = Vec::new();
        let mut errors = Vec::new();
        for outcome in &outcomes {
            match outcome.verdict {
                Verdict::Pass | Verdict::Note => feedback.push(outcome.message.clone()),
                Verdict::Fail => errors.push(outcome.message.clone()),
            }
        }

        let total = outcomes.len();
        let passed = total - errors.len();
        let score = if total == 0 {
            100
        } else {
            (100.0 * passed as f64 / total as f64).round() as u8
        };

        tracing::debug!("Scored {}/{} checks -> {}", passed, total, score);
        ScoreReport {
            is_valid: passed == total,
            score,
            feedback,
            errors,
            outcomes,
        }
    }

    pub fn score_compositions(
        &self,
        candidate: &Composition,
        reference: &Composition,
        progress: StepProgress,
    ) -> ScoreReport {
        self.score(&ScoringInput::from_compositions(candidate, reference, progress))
    }
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self::with_default_checks()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composition::Identity;

    struct AlwaysFails;

    impl Check for AlwaysFails {
        fn id(&self) -> &str {
            "always_fails"
        }
        fn name(&self) -> &str {
            "Always fails"
        }
        fn description(&self) -> &str {
            "Test check"
        }
        fn evaluate(&self, _input: &ScoringInput<'_>) -> CheckOutcome {
            CheckOutcome::fail(self.id(), "nope")
        }
    }

    #[test]
    fn test_empty_inputs_only_fail_steps() {
        let engine = ScoringEngine::with_default_checks();
        let input = ScoringInput::new(&[], &[], &[], &[], StepProgress::new(0, 2));
        let report = engine.score(&input);

        assert_eq!(report.total_checks(), 4);
        assert_eq!(report.passed_checks(), 3);
        assert_eq!(report.score, 75);
        assert!(!report.is_valid);
        assert_eq!(report.errors, vec!["✗ Complete all steps: 0/2 done"]);
    }

    #[test]
    fn test_custom_check_changes_denominator() {
        let mut engine = ScoringEngine::with_default_checks();
        engine.add_check(Arc::new(AlwaysFails));

        let reference = vec![PlacementInstance::new(Identity::persisted("r"), "led")];
        let candidate = reference.clone();
        let input = ScoringInput::new(&candidate, &[], &reference, &[], StepProgress::new(1, 1));
        let report = engine.score(&input);

        assert_eq!(report.score, 80);
        assert_eq!(report.errors.last().map(String::as_str), Some("nope"));
    }

    #[test]
    fn test_report_json_shape() {
        let report = ScoringEngine::default().score(&ScoringInput::new(
            &[],
            &[],
            &[],
            &[],
            StepProgress::new(0, 0),
        ));
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["isValid"], true);
        assert_eq!(json["score"], 100);
        assert!(json.get("outcomes").is_none());
        assert_eq!(json["feedback"].as_array().unwrap().len(), 4);
    }
}
