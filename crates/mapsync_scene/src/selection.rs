//! Selection state.

use serde::{Deserialize, Serialize};

use crate::node::NodeId;

/// What kind of things clicks select.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionMode {
    /// Whole entities.
    Entity,
    /// Primitives and groups.
    #[default]
    Primitive,
    /// Faces, edges or vertices of primitives.
    Component,
}

/// The set of selected nodes, in selection order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    mode: SelectionMode,
    selected: Vec<NodeId>,
}

impl Selection {
    /// Create an empty selection in primitive mode.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current selection mode.
    #[must_use]
    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    /// Change the selection mode.
    pub fn set_mode(&mut self, mode: SelectionMode) {
        self.mode = mode;
    }

    /// Select a node. Selecting an already-selected node is a no-op.
    pub fn select(&mut self, node: NodeId) {
        if !self.selected.contains(&node) {
            self.selected.push(node);
        }
    }

    /// Deselect a node.
    pub fn deselect(&mut self, node: NodeId) {
        self.selected.retain(|&n| n != node);
    }

    /// Deselect everything.
    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// Returns `true` if `node` is selected.
    #[must_use]
    pub fn is_selected(&self, node: NodeId) -> bool {
        self.selected.contains(&node)
    }

    /// Returns the selected nodes in selection order.
    #[must_use]
    pub fn selected(&self) -> &[NodeId] {
        &self.selected
    }

    /// Returns the most recently selected node.
    #[must_use]
    pub fn ultimate(&self) -> Option<NodeId> {
        self.selected.last().copied()
    }

    /// Returns the number of selected nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.selected.len()
    }

    /// Returns `true` if nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }
}
