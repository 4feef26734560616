//! Experiment steps and step progress.

use serde::{Deserialize, Serialize};

/// Inclusive numeric range a measurement must land in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerance {
    pub min: f64,
    pub max: f64,
}

impl Tolerance {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// One entry of an experiment procedure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentStep {
    /// 1-based position in the procedure
    pub step_number: u32,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub procedure: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tolerance: Option<Tolerance>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl ExperimentStep {
    pub fn new(step_number: u32, description: impl Into<String>) -> Self {
        Self {
            step_number,
            description: description.into(),
            procedure: None,
            tolerance: None,
            unit: None,
        }
    }

    pub fn with_tolerance(mut self, min: f64, max: f64, unit: impl Into<String>) -> Self {
        self.tolerance = Some(Tolerance::new(min, max));
        self.unit = Some(unit.into());
        self
    }

    /// `None` when the step has no tolerance to check against.
    pub fn accepts(&self, measured: f64) -> Option<bool> {
        self.tolerance.map(|t| t.contains(measured))
    }
}

/// Partial update for [`StepList::update_step`].
#[derive(Debug, Clone, Default)]
pub struct StepPatch {
    pub description: Option<String>,
    pub procedure: Option<String>,
    pub tolerance: Option<Tolerance>,
    pub unit: Option<String>,
}

/// Ordered procedure, kept numbered 1..=n.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepList {
    steps: Vec<ExperimentStep>,
}

impl StepList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_steps(mut steps: Vec<ExperimentStep>) -> Self {
        steps.sort_by_key(|s| s.step_number);
        let mut list = Self { steps };
        list.renumber();
        list
    }

    pub fn add_step(&mut self, description: impl Into<String>) -> &ExperimentStep {
        let number = self.steps.len() as u32 + 1;
        self.steps.push(ExperimentStep::new(number, description));
        &self.steps[self.steps.len() - 1]
    }

    /// Apply a patch. Returns `false` if `index` is out of range.
    pub fn update_step(&mut self, index: usize, patch: StepPatch) -> bool {
        let Some(step) = self.steps.get_mut(index) else {
            return false;
        };
        if let Some(description) = patch.description {
            step.description = description;
        }
        if let Some(procedure) = patch.procedure {
            step.procedure = Some(procedure);
        }
        if let Some(tolerance) = patch.tolerance {
            step.tolerance = Some(tolerance);
        }
        if let Some(unit) = patch.unit {
            step.unit = Some(unit);
        }
        true
    }

    /// Remove a step and renumber the rest.
    pub fn remove_step(&mut self, index: usize) -> Option<ExperimentStep> {
        if index >= self.steps.len() {
            return None;
        }
        let removed = self.steps.remove(index);
        self.renumber();
        Some(removed)
    }

    fn renumber(&mut self) {
        for (i, step) in self.steps.iter_mut().enumerate() {
            step.step_number = i as u32 + 1;
        }
    }

    pub fn as_slice(&self) -> &[ExperimentStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Completed/total step counts reported by the step tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StepProgress {
    pub completed: usize,
    pub total: usize,
}

impl StepProgress {
    pub fn new(completed: usize, total: usize) -> Self {
        Self { completed, total }
    }

    pub fn is_complete(&self) -> bool {
        self.completed == self.total
    }

    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.completed as f64 / self.total as f64 * 100.0
        }
    }
}
