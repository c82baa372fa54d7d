//! Dirty tracking: which linked groups changed during the current command.

use std::collections::BTreeSet;

use mapsync_scene::{NodeId, Scene};
use tracing::trace;

use crate::link::is_linked_group;
use crate::system::LinkedGroups;

/// The set of linked groups touched since the last command boundary.
#[derive(Debug, Default)]
pub struct DirtyTracker {
    groups: BTreeSet<NodeId>,
}

impl DirtyTracker {
    /// Create an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `group`. Returns `true` if it was not already dirty.
    pub fn insert(&mut self, group: NodeId) -> bool {
        self.groups.insert(group)
    }

    /// Returns `true` if `group` is dirty.
    #[must_use]
    pub fn contains(&self, group: NodeId) -> bool {
        self.groups.contains(&group)
    }

    /// Returns the number of dirty groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Returns `true` if nothing is dirty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Forget every dirty group.
    pub fn clear(&mut self) {
        self.groups.clear();
    }

    /// Iterate over the dirty groups in handle order.
    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.groups.iter().copied()
    }

    /// Snapshot and clear the dirty set.
    pub fn take(&mut self) -> Vec<NodeId> {
        std::mem::take(&mut self.groups).into_iter().collect()
    }
}

impl LinkedGroups {
    /// Record that `node` changed.
    ///
    /// The change is attributed to the nearest enclosing group of the live
    /// node (the node itself if it is a group).
    pub fn mark_node_changed(&mut self, scene: &Scene, node: NodeId) {
        if !self.batcher.accepts_marks() || self.session.is_transforming(node) {
            return;
        }
        if !scene.is_live(node) {
            return;
        }
        let path = scene.path(node);
        if let Some(&group) = path.iter().rev().find(|&&n| scene.is_group(n)) {
            self.mark_group_changed(scene, group);
        }
    }

    /// Record that `group` changed.
    ///
    /// Ignored outside a command, while a flush is writing, for unlinked
    /// groups and for groups inside an active transform gesture.
    pub fn mark_group_changed(&mut self, scene: &Scene, group: NodeId) {
        if !self.batcher.accepts_marks() {
            return;
        }
        if !is_linked_group(scene, group) || self.session.is_transforming(group) {
            return;
        }
        if self.dirty.insert(group) {
            trace!(%group, "linked group marked dirty");
        }
    }
}
