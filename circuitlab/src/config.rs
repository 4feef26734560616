//! Runtime configuration shared by the library and the CLI.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::LabError;

/// Defaults applied by the composition editor when the caller leaves a
/// wire attribute unspecified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorOptions {
    pub default_wire_color: String,
    pub default_source_terminal: String,
    pub default_target_terminal: String,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            default_wire_color: "#22c55e".to_string(),
            default_source_terminal: "right".to_string(),
            default_target_terminal: "left".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringOptions {
    /// Minimum score the CLI accepts before exiting non-zero
    pub pass_threshold: u8,
}

impl Default for ScoringOptions {
    fn default() -> Self {
        Self { pass_threshold: 100 }
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabConfig {
    pub editor: EditorOptions,
    pub scoring: ScoringOptions,
}

impl LabConfig {
    /// Load a JSON config file. Missing keys fall back to defaults.
    pub fn from_path(path: &Path) -> Result<Self, LabError> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&content)?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }
}
