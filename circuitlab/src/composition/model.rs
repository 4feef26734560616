//! Placement and wire data types

use serde::{Deserialize, Serialize};

use super::identity::Identity;
use crate::catalog::{Configuration, EquipmentTypeId};

/// Canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// One equipment instance placed on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementInstance {
    pub identity: Identity,

    /// Catalog type; fixed once the placement exists
    pub equipment_type_id: EquipmentTypeId,

    pub position: Position,

    /// Stacking order at insertion time
    #[serde(default)]
    pub depth_order: i64,

    #[serde(default)]
    pub configuration: Configuration,

    /// Type display name captured from the catalog
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl PlacementInstance {
    pub fn new(identity: Identity, equipment_type_id: impl Into<EquipmentTypeId>) -> Self {
        Self {
            identity,
            equipment_type_id: equipment_type_id.into(),
            position: Position::default(),
            depth_order: 0,
            configuration: Configuration::new(),
            display_name: None,
        }
    }

    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.position = Position::new(x, y);
        self
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Name used in student feedback; falls back to the type id.
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .unwrap_or_else(|| self.equipment_type_id.as_str())
    }
}

/// A wire between two placements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireConnection {
    pub identity: Identity,

    pub source: Identity,
    pub target: Identity,

    /// Named attachment point on the source; the default terminal when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_terminal: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_terminal: Option<String>,

    /// Display only, never compared during scoring
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl WireConnection {
    pub fn new(identity: Identity, source: Identity, target: Identity) -> Self {
        Self {
            identity,
            source,
            target,
            source_terminal: None,
            target_terminal: None,
            color: None,
        }
    }

    pub fn with_terminals(
        mut self,
        source_terminal: impl Into<String>,
        target_terminal: impl Into<String>,
    ) -> Self {
        self.source_terminal = Some(source_terminal.into());
        self.target_terminal = Some(target_terminal.into());
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn touches(&self, placement: &Identity) -> bool {
        &self.source == placement || &self.target == placement
    }
}
