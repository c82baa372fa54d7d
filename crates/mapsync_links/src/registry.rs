//! Link registry: groups live linked groups by link id.
//!
//! Membership is derived from the scene on demand and never cached across
//! calls, so it always reflects current scene content. Callers scan once per
//! flush or operation.

use std::collections::BTreeMap;

use mapsync_scene::{NodeData, NodeId, Scene};

use crate::codec::LINK_ID_KEY;

/// All live linked groups, keyed by link id.
#[derive(Debug, Clone, Default)]
pub struct LinkRegistry {
    /// Members keyed by link id, in scene traversal order.
    sets: BTreeMap<String, Vec<NodeId>>,
}

impl LinkRegistry {
    /// Scan the whole scene depth-first and collect every group that carries
    /// a link id. Non-group nodes are not descended into.
    #[must_use]
    pub fn scan(scene: &Scene) -> Self {
        let mut sets: BTreeMap<String, Vec<NodeId>> = BTreeMap::new();
        scene.traverse(|id, node| match &node.data {
            NodeData::Root => true,
            NodeData::Group(keys) => {
                let link_id = keys.get(LINK_ID_KEY);
                if !link_id.is_empty() {
                    sets.entry(link_id.to_string()).or_default().push(id);
                }
                true
            }
            _ => false,
        });
        Self { sets }
    }

    /// Returns the members of a link set.
    #[must_use]
    pub fn get(&self, link_id: &str) -> Option<&[NodeId]> {
        self.sets.get(link_id).map(Vec::as_slice)
    }

    /// Returns `true` if `link_id` names a set with at least two members.
    #[must_use]
    pub fn is_linked(&self, link_id: &str) -> bool {
        self.get(link_id).is_some_and(|members| members.len() >= 2)
    }

    /// Iterate over `(link id, members)` in link id order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[NodeId])> {
        self.sets.iter().map(|(id, members)| (id.as_str(), members.as_slice()))
    }

    /// Returns the number of distinct link ids.
    #[must_use]
    pub fn set_count(&self) -> usize {
        self.sets.len()
    }

    /// Returns the total number of linked groups across all sets.
    #[must_use]
    pub fn total_members(&self) -> usize {
        self.sets.values().map(Vec::len).sum()
    }
}
