//! Graph view over a composition
//!
//! Builds a petgraph `UnGraph` with one node per placement and one edge per
//! resolvable wire. Used for connectivity summaries; scoring itself is
//! count/set based and does not need it.

use petgraph::algo::connected_components;
use petgraph::graph::{NodeIndex, UnGraph};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::editor::Composition;
use super::identity::Identity;
use super::model::{PlacementInstance, WireConnection};

/// Read-only graph borrowed from a [`Composition`].
pub struct CompositionGraph<'a> {
    graph: UnGraph<&'a PlacementInstance, &'a WireConnection>,
    indices: HashMap<&'a Identity, NodeIndex>,
    skipped_wires: usize,
}

impl<'a> CompositionGraph<'a> {
    pub fn build(composition: &'a Composition) -> Self {
        let mut graph = UnGraph::new_undirected();
        let mut indices = HashMap::new();

        for placement in composition.placements() {
            let idx = graph.add_node(placement);
            indices.insert(&placement.identity, idx);
        }

        let mut skipped_wires = 0;
        for wire in composition.connections() {
            match (indices.get(&wire.source), indices.get(&wire.target)) {
                (Some(&a), Some(&b)) if a != b => {
                    graph.add_edge(a, b, wire);
                }
                _ => skipped_wires += 1,
            }
        }

        Self {
            graph,
            indices,
            skipped_wires,
        }
    }

    /// Placements directly wired to `id`, de-duplicated.
    pub fn neighbors(&self, id: &Identity) -> Vec<&'a PlacementInstance> {
        let Some(&idx) = self.indices.get(id) else {
            return Vec::new();
        };

        let mut seen = Vec::new();
        for n in self.graph.neighbors(idx) {
            if !seen.contains(&n) {
                seen.push(n);
            }
        }
        seen.sort();
        seen.into_iter().map(|n| self.graph[n]).collect()
    }

    /// Placements with no resolvable wire attached.
    pub fn isolated_placements(&self) -> Vec<&'a PlacementInstance> {
        self.graph
            .node_indices()
            .filter(|&n| self.graph.neighbors(n).next().is_none())
            .map(|n| self.graph[n])
            .collect()
    }

    pub fn stats(&self) -> CompositionStats {
        CompositionStats {
            placement_count: self.graph.node_count(),
            connection_count: self.graph.edge_count() + self.skipped_wires,
            unresolved_count: self.skipped_wires,
            isolated_count: self.isolated_placements().len(),
            connected_groups: connected_components(&self.graph),
        }
    }
}

/// Summary numbers for a composition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositionStats {
    pub placement_count: usize,
    pub connection_count: usize,
    pub unresolved_count: usize,
    pub isolated_count: usize,
    pub connected_groups: usize,
}

impl Composition {
    pub fn graph(&self) -> CompositionGraph<'_> {
        CompositionGraph::build(self)
    }

    pub fn stats(&self) -> CompositionStats {
        self.graph().stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composition::model::WireConnection;

    fn sample() -> Composition {
        let placements = vec![
            PlacementInstance::new(Identity::persisted("p1"), "power-supply"),
            PlacementInstance::new(Identity::persisted("p2"), "resistor"),
            PlacementInstance::new(Identity::persisted("p3"), "led"),
            PlacementInstance::new(Identity::persisted("p4"), "multimeter"),
        ];
        let connections = vec![
            WireConnection::new(Identity::persisted("w1"), Identity::persisted("p1"), Identity::persisted("p2")),
            WireConnection::new(Identity::persisted("w2"), Identity::persisted("p2"), Identity::persisted("p3")),
            WireConnection::new(Identity::persisted("w3"), Identity::persisted("p3"), Identity::persisted("p1")),
            WireConnection::new(Identity::persisted("w4"), Identity::persisted("p3"), Identity::local("gone")),
        ];
        Composition::from_parts(placements, connections)
    }

    #[test]
    fn test_stats() {
        let composition = sample();
        let stats = composition.stats();

        assert_eq!(stats.placement_count, 4);
        assert_eq!(stats.connection_count, 4);
        assert_eq!(stats.unresolved_count, 1);
        assert_eq!(stats.isolated_count, 1);
        // {p1, p2, p3} and {p4}
        assert_eq!(stats.connected_groups, 2);
    }

    #[test]
    fn test_neighbors() {
        let composition = sample();
        let graph = composition.graph();

        let names: Vec<&str> = graph
            .neighbors(&Identity::persisted("p3"))
            .iter()
            .map(|p| p.equipment_type_id.as_str())
            .collect();
        assert_eq!(names, vec!["power-supply", "resistor"]);
        assert!(graph.neighbors(&Identity::persisted("nope")).is_empty());
    }

    #[test]
    fn test_isolated() {
        let composition = sample();
        let graph = composition.graph();
        let isolated = graph.isolated_placements();
        assert_eq!(isolated.len(), 1);
        assert_eq!(isolated[0].identity, Identity::persisted("p4"));
    }
}
