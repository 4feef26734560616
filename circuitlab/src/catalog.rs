//! Equipment catalog
//!
//! Read-only list of equipment *types* that can be dropped on a canvas. The
//! catalog is owned by the surrounding application; the composition editor
//! only looks types up and clones their default configuration.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Opaque, equipment-specific key/value configuration.
pub type Configuration = BTreeMap<String, serde_json::Value>;

/// Identifier of an equipment type (e.g. `"resistor"`, `"power-supply"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EquipmentTypeId(String);

impl EquipmentTypeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EquipmentTypeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for EquipmentTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentType {
    pub id: EquipmentTypeId,

    /// Display name shown to students
    pub name: String,

    /// Coarse category, e.g. `POWER_SUPPLY`, `MEASUREMENT`, `PASSIVE`
    #[serde(default = "default_category")]
    pub category: String,

    /// Template cloned into every new placement of this type
    #[serde(default)]
    pub default_configuration: Configuration,
}

fn default_category() -> String {
    "GENERAL".to_string()
}

impl EquipmentType {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: EquipmentTypeId::new(id),
            name: name.into(),
            category: default_category(),
            default_configuration: Configuration::new(),
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_default(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.default_configuration.insert(key.into(), value);
        self
    }
}

/// Lookup table over equipment types, preserving catalog order.
#[derive(Debug, Clone, Default)]
pub struct EquipmentCatalog {
    types: Vec<EquipmentType>,
    index: HashMap<EquipmentTypeId, usize>,
}

impl EquipmentCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog; later duplicates of an id replace earlier ones.
    pub fn from_types(types: impl IntoIterator<Item = EquipmentType>) -> Self {
        let mut catalog = Self::new();
        for equipment in types {
            catalog.insert(equipment);
        }
        catalog
    }

    pub fn insert(&mut self, equipment: EquipmentType) {
        match self.index.get(&equipment.id) {
            Some(&pos) => self.types[pos] = equipment,
            None => {
                self.index.insert(equipment.id.clone(), self.types.len());
                self.types.push(equipment);
            }
        }
    }

    pub fn get(&self, id: &EquipmentTypeId) -> Option<&EquipmentType> {
        self.index.get(id).map(|&pos| &self.types[pos])
    }

    pub fn contains(&self, id: &EquipmentTypeId) -> bool {
        self.index.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EquipmentType> {
        self.types.iter()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
