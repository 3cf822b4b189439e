//! Role-labelled anchorage relation between parts.

use super::PartId;
use std::collections::{BTreeMap, BTreeSet};

/// One edge seen from one side: the other part and the role.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AnchorageEdge {
    pub part: PartId,
    pub role: String,
}

impl AnchorageEdge {
    pub fn new(part: PartId, role: impl Into<String>) -> Self {
        Self {
            part,
            role: role.into(),
        }
    }
}

/// Bidirectional many-to-many anchorage relation.
///
/// Both adjacency maps are updated by the same call, and empty entries are
/// pruned so that `detach(attach(g))` equals `g` structurally.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnchorageGraph {
    anchorages: BTreeMap<PartId, BTreeSet<AnchorageEdge>>,
    anchoreds: BTreeMap<PartId, BTreeSet<AnchorageEdge>>,
}

impl AnchorageGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Anchors `anchored` to `anchorage` under `role`.
    ///
    /// Returns `false` when the edge already existed.
    pub fn attach(&mut self, anchored: PartId, anchorage: PartId, role: &str) -> bool {
        let inserted = self
            .anchorages
            .entry(anchored)
            .or_default()
            .insert(AnchorageEdge::new(anchorage, role));
        self.anchoreds
            .entry(anchorage)
            .or_default()
            .insert(AnchorageEdge::new(anchored, role));
        inserted
    }

    /// Removes the edge. Returns `false` when it did not exist.
    pub fn detach(&mut self, anchored: PartId, anchorage: PartId, role: &str) -> bool {
        let removed = remove_edge(
            &mut self.anchorages,
            anchored,
            &AnchorageEdge::new(anchorage, role),
        );
        remove_edge(
            &mut self.anchoreds,
            anchorage,
            &AnchorageEdge::new(anchored, role),
        );
        removed
    }

    pub fn contains(&self, anchored: PartId, anchorage: PartId, role: &str) -> bool {
        self.anchorages
            .get(&anchored)
            .is_some_and(|edges| edges.contains(&AnchorageEdge::new(anchorage, role)))
    }

    /// Parts `anchored` depends on.
    pub fn anchorages(&self, anchored: PartId) -> Vec<AnchorageEdge> {
        self.anchorages
            .get(&anchored)
            .map(|edges| edges.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Parts depending on `anchorage`.
    pub fn anchoreds(&self, anchorage: PartId) -> Vec<AnchorageEdge> {
        self.anchoreds
            .get(&anchorage)
            .map(|edges| edges.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn has_anchorages(&self, anchored: PartId) -> bool {
        self.anchorages.contains_key(&anchored)
    }

    /// Removes every edge touching `part`, returned as
    /// `(anchored, anchorage, role)` triples.
    pub fn remove_part(&mut self, part: PartId) -> Vec<(PartId, PartId, String)> {
        let mut removed = Vec::new();
        for edge in self.anchorages(part) {
            self.detach(part, edge.part, &edge.role);
            removed.push((part, edge.part, edge.role));
        }
        for edge in self.anchoreds(part) {
            self.detach(edge.part, part, &edge.role);
            removed.push((edge.part, part, edge.role));
        }
        removed
    }

    /// Edges present on one side only. Empty for a consistent graph.
    pub fn dangling_edges(&self) -> Vec<(PartId, PartId, String)> {
        let mut dangling = Vec::new();
        for (anchored, edges) in &self.anchorages {
            for edge in edges {
                let back_edge = AnchorageEdge::new(*anchored, edge.role.as_str());
                let mirrored = self
                    .anchoreds
                    .get(&edge.part)
                    .is_some_and(|back| back.contains(&back_edge));
                if !mirrored {
                    dangling.push((*anchored, edge.part, edge.role.clone()));
                }
            }
        }
        for (anchorage, edges) in &self.anchoreds {
            for edge in edges {
                let back_edge = AnchorageEdge::new(*anchorage, edge.role.as_str());
                let mirrored = self
                    .anchorages
                    .get(&edge.part)
                    .is_some_and(|back| back.contains(&back_edge));
                if !mirrored {
                    dangling.push((edge.part, *anchorage, edge.role.clone()));
                }
            }
        }
        dangling
    }

    pub fn edge_count(&self) -> usize {
        self.anchorages.values().map(BTreeSet::len).sum()
    }
}

fn remove_edge(
    map: &mut BTreeMap<PartId, BTreeSet<AnchorageEdge>>,
    key: PartId,
    edge: &AnchorageEdge,
) -> bool {
    let Some(edges) = map.get_mut(&key) else {
        return false;
    };
    let removed = edges.remove(edge);
    if edges.is_empty() {
        map.remove(&key);
    }
    removed
}
