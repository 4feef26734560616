//! Old identity -> permanent identity mapping produced by a save.

use std::collections::HashMap;

use crate::composition::{Identity, PersistedId, PlacementInstance, WireConnection};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdentityMap {
    entries: HashMap<Identity, PersistedId>,
}

impl IdentityMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pair submitted placements with the ids the backend returned, by
    /// position. Returns `None` when the lengths disagree.
    pub fn correlate(submitted: &[PlacementInstance], returned: &[PersistedId]) -> Option<Self> {
        if submitted.len() != returned.len() {
            return None;
        }
        let entries = submitted
            .iter()
            .zip(returned)
            .map(|(placement, permanent)| (placement.identity.clone(), permanent.clone()))
            .collect();
        Some(Self { entries })
    }

    pub fn insert(&mut self, old: Identity, permanent: PersistedId) {
        self.entries.insert(old, permanent);
    }

    pub fn get(&self, old: &Identity) -> Option<&PersistedId> {
        self.entries.get(old)
    }

    /// Mapped identity, or `old` itself when it is not in the map.
    pub fn rewrite(&self, old: &Identity) -> Identity {
        match self.entries.get(old) {
            Some(permanent) => Identity::Persisted(permanent.clone()),
            None => old.clone(),
        }
    }

    /// Rewrite wire endpoints. Unknown endpoints are kept as they are so
    /// that later validation reports them as unresolved.
    pub fn rewrite_connections(&self, connections: &[WireConnection]) -> Vec<WireConnection> {
        connections
            .iter()
            .map(|wire| {
                for endpoint in [&wire.source, &wire.target] {
                    if !self.entries.contains_key(endpoint) {
                        tracing::warn!(
                            "Wire {} endpoint {} has no permanent identity; keeping it",
                            wire.identity,
                            endpoint
                        );
                    }
                }
                WireConnection {
                    source: self.rewrite(&wire.source),
                    target: self.rewrite(&wire.target),
                    ..wire.clone()
                }
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Identity, &PersistedId)> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placements(ids: &[&str]) -> Vec<PlacementInstance> {
        ids.iter()
            .map(|id| PlacementInstance::new(Identity::local(*id), "resistor"))
            .collect()
    }

    fn wire(id: &str, source: Identity, target: Identity) -> WireConnection {
        WireConnection::new(Identity::local(id), source, target)
    }

    #[test]
    fn test_correlate_by_position() {
        let submitted = placements(&["temp-1", "temp-2", "temp-3"]);
        let returned = vec![PersistedId::from("p1"), PersistedId::from("p2"), PersistedId::from("p3")];

        let map = IdentityMap::correlate(&submitted, &returned).unwrap();
        assert_eq!(map.len(), 3);
        assert_eq!(map.get(&Identity::local("temp-2")), Some(&PersistedId::from("p2")));
    }

    #[test]
    fn test_correlate_rejects_length_mismatch() {
        let submitted = placements(&["temp-1", "temp-2"]);
        let returned = vec![PersistedId::from("p1")];
        assert!(IdentityMap::correlate(&submitted, &returned).is_none());
    }

    #[test]
    fn test_rewrite_keeps_unknown_endpoints() {
        let mut map = IdentityMap::new();
        map.insert(Identity::local("temp-1"), PersistedId::from("p1"));

        let rewritten = map.rewrite_connections(&[wire(
            "w1",
            Identity::local("temp-1"),
            Identity::local("stray"),
        )]);

        assert_eq!(rewritten.len(), 1);
        assert_eq!(rewritten[0].source, Identity::persisted("p1"));
        assert_eq!(rewritten[0].target, Identity::local("stray"));
        assert_eq!(rewritten[0].identity, Identity::local("w1"));
    }

    #[test]
    fn test_empty_map_is_identity() {
        let map = IdentityMap::new();
        let wires = vec![wire("w1", Identity::persisted("a"), Identity::persisted("b"))];
        assert_eq!(map.rewrite_connections(&wires), wires);
    }
}
