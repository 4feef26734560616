//! Built-in scoring checks, in report order.

use std::collections::HashSet;

use super::{Check, CheckOutcome, ScoringInput};

/// Candidate has at least as many placements as the reference.
pub struct QuantityCheck;

impl Check for QuantityCheck {
    fn id(&self) -> &str {
        "equipment_quantity"
    }

    fn name(&self) -> &str {
        "Equipment quantity"
    }

    fn description(&self) -> &str {
        "At least as many equipment items as the reference circuit"
    }

    fn evaluate(&self, input: &ScoringInput<'_>) -> CheckOutcome {
        let placed = input.candidate_placements.len();
        let expected = input.reference_placements.len();
        if placed >= expected {
            CheckOutcome::pass(self.id(), format!("✓ You have placed {} equipment items", placed))
        } else {
            CheckOutcome::fail(
                self.id(),
                format!("✗ Missing equipment: You have {}/{} items", placed, expected),
            )
        }
    }
}

/// Every equipment type used by the reference appears in the candidate.
pub struct TypeCoverageCheck;

impl Check for TypeCoverageCheck {
    fn id(&self) -> &str {
        "equipment_types"
    }

    fn name(&self) -> &str {
        "Equipment types"
    }

    fn description(&self) -> &str {
        "Every required equipment type is placed at least once"
    }

    fn evaluate(&self, input: &ScoringInput<'_>) -> CheckOutcome {
        let placed: HashSet<_> = input
            .candidate_placements
            .iter()
            .map(|p| &p.equipment_type_id)
            .collect();

        let mut seen = HashSet::new();
        let mut missing: Vec<&str> = Vec::new();
        for reference in input.reference_placements {
            if !placed.contains(&reference.equipment_type_id)
                && seen.insert(&reference.equipment_type_id)
            {
                missing.push(reference.label());
            }
        }

        if missing.is_empty() {
            CheckOutcome::pass(self.id(), "✓ All required equipment types are present")
        } else {
            CheckOutcome::fail(
                self.id(),
                format!("✗ Missing equipment: {}", missing.join(", ")),
            )
        }
    }
}

/// Wire count against the reference.
///
/// A reference without wires cannot be under-wired: the check passes, with a
/// positive note if the candidate wired anything and an informational note
/// otherwise.
pub struct ConnectivityCheck;

impl Check for ConnectivityCheck {
    fn id(&self) -> &str {
        "connections"
    }

    fn name(&self) -> &str {
        "Connections"
    }

    fn description(&self) -> &str {
        "At least as many wires as the reference circuit"
    }

    fn evaluate(&self, input: &ScoringInput<'_>) -> CheckOutcome {
        let wired = input.candidate_connections.len();
        let expected = input.reference_connections.len();

        if expected == 0 {
            return if wired > 0 {
                CheckOutcome::pass(self.id(), format!("✓ You have created {} connections", wired))
            } else {
                CheckOutcome::note(self.id(), "ℹ No connections created yet")
            };
        }

        if wired >= expected {
            CheckOutcome::pass(self.id(), format!("✓ You have {} connections", wired))
        } else {
            CheckOutcome::fail(
                self.id(),
                format!("✗ Missing connections: You have {}/{} connections", wired, expected),
            )
        }
    }
}

/// All procedure steps are marked complete.
pub struct StepCompletionCheck;

impl Check for StepCompletionCheck {
    fn id(&self) -> &str {
        "steps"
    }

    fn name(&self) -> &str {
        "Step completion"
    }

    fn description(&self) -> &str {
        "Every experiment step is marked complete"
    }

    fn evaluate(&self, input: &ScoringInput<'_>) -> CheckOutcome {
        let progress = input.progress;
        if progress.is_complete() {
            CheckOutcome::pass(self.id(), "✓ All steps completed")
        } else {
            CheckOutcome::fail(
                self.id(),
                format!(
                    "✗ Complete all steps: {}/{} done",
                    progress.completed, progress.total
                ),
            )
        }
    }
}
