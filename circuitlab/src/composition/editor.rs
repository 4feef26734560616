//! Composition aggregate
//!
//! A [`Composition`] owns the placements and wires of one circuit and is the
//! only place they are mutated. Every public mutation either succeeds and
//! leaves the invariants intact, or fails and changes nothing:
//!
//! - every wire endpoint names a placement in this composition
//! - no wire connects a placement to itself
//!
//! The two exceptions are [`Composition::replace_connections`] and
//! [`Composition::from_parts`], which take data as given. Use
//! [`Composition::unresolved_connections`] to find wires that slipped through.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::identity::Identity;
use super::model::{PlacementInstance, Position, WireConnection};
use crate::catalog::{Configuration, EquipmentCatalog, EquipmentTypeId};
use crate::config::EditorOptions;
use crate::save::IdentityMap;

/// Editor input errors. A failed operation is a no-op.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompositionError {
    #[error("Unknown equipment type: {0}")]
    UnknownEquipmentType(EquipmentTypeId),

    #[error("Not found: {0}")]
    NotFound(Identity),

    #[error("Unknown wire endpoint: {0}")]
    UnknownEndpoint(Identity),

    #[error("Cannot connect {0} to itself")]
    SelfConnection(Identity),
}

/// Optional wire attributes for [`Composition::connect`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WireOptions {
    pub source_terminal: Option<String>,
    pub target_terminal: Option<String>,
    pub color: Option<String>,
}

impl WireOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn terminals(mut self, source: impl Into<String>, target: impl Into<String>) -> Self {
        self.source_terminal = Some(source.into());
        self.target_terminal = Some(target.into());
        self
    }

    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}

/// Placements plus the wires between them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Composition {
    placements: Vec<PlacementInstance>,
    connections: Vec<WireConnection>,
    #[serde(skip)]
    options: EditorOptions,
}

impl Composition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: EditorOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Wrap already-stored data without validating it.
    pub fn from_parts(
        placements: Vec<PlacementInstance>,
        connections: Vec<WireConnection>,
    ) -> Self {
        Self {
            placements,
            connections,
            options: EditorOptions::default(),
        }
    }

    pub fn set_options(&mut self, options: EditorOptions) {
        self.options = options;
    }

    pub fn options(&self) -> &EditorOptions {
        &self.options
    }

    // -- reads ---------------------------------------------------------------

    pub fn placements(&self) -> &[PlacementInstance] {
        &self.placements
    }

    pub fn connections(&self) -> &[WireConnection] {
        &self.connections
    }

    pub fn placement(&self, id: &Identity) -> Option<&PlacementInstance> {
        self.placements.iter().find(|p| &p.identity == id)
    }

    pub fn connection(&self, id: &Identity) -> Option<&WireConnection> {
        self.connections.iter().find(|c| &c.identity == id)
    }

    pub fn contains_placement(&self, id: &Identity) -> bool {
        self.placements.iter().any(|p| &p.identity == id)
    }

    /// Wires attached to a placement, in insertion order.
    pub fn connections_for(&self, id: &Identity) -> Vec<&WireConnection> {
        self.connections.iter().filter(|c| c.touches(id)).collect()
    }

    /// Wires whose endpoints are missing or identical.
    pub fn unresolved_connections(&self) -> Vec<&WireConnection> {
        self.connections
            .iter()
            .filter(|c| {
                c.source == c.target
                    || !self.contains_placement(&c.source)
                    || !self.contains_placement(&c.target)
            })
            .collect()
    }

    /// Source terminal of a wire, resolving the default.
    pub fn source_terminal<'a>(&'a self, wire: &'a WireConnection) -> &'a str {
        wire.source_terminal
            .as_deref()
            .unwrap_or(&self.options.default_source_terminal)
    }

    /// Target terminal of a wire, resolving the default.
    pub fn target_terminal<'a>(&'a self, wire: &'a WireConnection) -> &'a str {
        wire.target_terminal
            .as_deref()
            .unwrap_or(&self.options.default_target_terminal)
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty() && self.connections.is_empty()
    }

    // -- placements ----------------------------------------------------------

    /// Drop a new equipment instance onto the canvas.
    pub fn add_placement(
        &mut self,
        catalog: &EquipmentCatalog,
        equipment_type_id: &EquipmentTypeId,
        x: f64,
        y: f64,
    ) -> Result<&PlacementInstance, CompositionError> {
        let equipment = catalog
            .get(equipment_type_id)
            .ok_or_else(|| CompositionError::UnknownEquipmentType(equipment_type_id.clone()))?;

        let placement = PlacementInstance {
            identity: Identity::new_local(),
            equipment_type_id: equipment.id.clone(),
            position: Position::new(x, y),
            depth_order: self.placements.len() as i64,
            configuration: equipment.default_configuration.clone(),
            display_name: Some(equipment.name.clone()),
        };
        tracing::debug!(
            "Placed {} as {} at ({}, {})",
            equipment.id,
            placement.identity,
            x,
            y
        );

        self.placements.push(placement);
        let last = self.placements.len() - 1;
        Ok(&self.placements[last])
    }

    pub fn move_placement(&mut self, id: &Identity, x: f64, y: f64) -> Result<(), CompositionError> {
        let placement = self.placement_mut(id)?;
        placement.position = Position::new(x, y);
        Ok(())
    }

    /// Replace a placement's configuration wholesale.
    pub fn configure_placement(
        &mut self,
        id: &Identity,
        configuration: Configuration,
    ) -> Result<(), CompositionError> {
        let placement = self.placement_mut(id)?;
        placement.configuration = configuration;
        Ok(())
    }

    /// Remove a placement together with every wire attached to it.
    pub fn remove_placement(&mut self, id: &Identity) -> Result<PlacementInstance, CompositionError> {
        let index = self
            .placements
            .iter()
            .position(|p| &p.identity == id)
            .ok_or_else(|| CompositionError::NotFound(id.clone()))?;

        let removed = self.placements.remove(index);
        let before = self.connections.len();
        self.connections.retain(|c| !c.touches(id));
        tracing::debug!(
            "Removed {} and {} attached wire(s)",
            id,
            before - self.connections.len()
        );
        Ok(removed)
    }

    fn placement_mut(&mut self, id: &Identity) -> Result<&mut PlacementInstance, CompositionError> {
        self.placements
            .iter_mut()
            .find(|p| &p.identity == id)
            .ok_or_else(|| CompositionError::NotFound(id.clone()))
    }

    // -- wires ---------------------------------------------------------------

    /// Wire two distinct placements together.
    pub fn connect(
        &mut self,
        source: &Identity,
        target: &Identity,
        options: WireOptions,
    ) -> Result<&WireConnection, CompositionError> {
        if !self.contains_placement(source) {
            return Err(CompositionError::UnknownEndpoint(source.clone()));
        }
        if !self.contains_placement(target) {
            return Err(CompositionError::UnknownEndpoint(target.clone()));
        }
        if source == target {
            return Err(CompositionError::SelfConnection(source.clone()));
        }

        let wire = WireConnection {
            identity: Identity::new_local(),
            source: source.clone(),
            target: target.clone(),
            source_terminal: options.source_terminal,
            target_terminal: options.target_terminal,
            color: Some(
                options
                    .color
                    .unwrap_or_else(|| self.options.default_wire_color.clone()),
            ),
        };
        tracing::debug!("Connected {} -> {} as {}", source, target, wire.identity);

        self.connections.push(wire);
        let last = self.connections.len() - 1;
        Ok(&self.connections[last])
    }

    pub fn disconnect(&mut self, connection_id: &Identity) -> Result<WireConnection, CompositionError> {
        let index = self
            .connections
            .iter()
            .position(|c| &c.identity == connection_id)
            .ok_or_else(|| CompositionError::NotFound(connection_id.clone()))?;
        Ok(self.connections.remove(index))
    }

    /// Swap in a whole wire set. Endpoints are not re-validated.
    pub fn replace_connections(&mut self, connections: Vec<WireConnection>) {
        self.connections = connections;
    }

    // -- reconciliation ------------------------------------------------------

    /// Adopt permanent identities handed back by a save.
    ///
    /// Placements and wire endpoints found in `identities` are rewritten;
    /// anything added after the save snapshot keeps its local identity.
    pub fn apply_identities(&mut self, identities: &IdentityMap) {
        for placement in &mut self.placements {
            if let Some(permanent) = identities.get(&placement.identity) {
                placement.identity = Identity::Persisted(permanent.clone());
            }
        }
        let rewritten = identities.rewrite_connections(&self.connections);
        self.replace_connections(rewritten);
    }
}
