//! The scene arena.
//!
//! The [`Scene`] owns every node. Nodes reachable from the root are *live*;
//! detached subtrees (fresh clones) exist in the arena but are not part of
//! the map until inserted under a container.
//!
//! Erased nodes are removed from the arena; their handles are never handed
//! out again. Deserialized scenes are checked for consistent, acyclic
//! parent/child links before use.

use std::collections::{BTreeMap, BTreeSet};

use glam::Mat4;
use serde::{Deserialize, Serialize};

use crate::eclass::{EntityClass, EntityClassRegistry};
use crate::error::SceneError;
use crate::keys::EntityKeys;
use crate::node::{Node, NodeData, NodeId};
use crate::primitive::{Brush, Patch};
use crate::selection::Selection;

/// A map scene: node arena, entity classes and selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawScene")]
pub struct Scene {
    /// Nodes by handle. Erased nodes are removed.
    nodes: BTreeMap<NodeId, Node>,
    /// The next handle to allocate.
    next_id: u32,
    root: NodeId,
    classes: EntityClassRegistry,
    selection: Selection,
}

/// Unchecked on-disk form of a [`Scene`].
#[derive(Deserialize)]
struct RawScene {
    nodes: BTreeMap<NodeId, Node>,
    #[serde(default)]
    next_id: u32,
    root: NodeId,
    #[serde(default)]
    classes: EntityClassRegistry,
    #[serde(default)]
    selection: Selection,
}

impl TryFrom<RawScene> for Scene {
    type Error = SceneError;

    fn try_from(raw: RawScene) -> Result<Self, Self::Error> {
        let past_last = match raw.nodes.keys().next_back() {
            Some(last) => last.0.checked_add(1).ok_or(SceneError::HandlesExhausted)?,
            None => 0,
        };
        let scene = Self {
            nodes: raw.nodes,
            next_id: raw.next_id.max(past_last),
            root: raw.root,
            classes: raw.classes,
            selection: raw.selection,
        };
        scene.validate()?;
        Ok(scene)
    }
}

impl Scene {
    /// Create a scene containing only the root node.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: BTreeMap::from([(NodeId(0), Node::new(NodeData::Root))]),
            next_id: 1,
            root: NodeId(0),
            classes: EntityClassRegistry::new(),
            selection: Selection::new(),
        }
    }

    /// Returns the root handle.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Returns the node for `id`, if it exists.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Mutable access to the node for `id`.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    /// Returns `true` if `id` refers to a node in the arena.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    /// Returns the number of nodes in the arena, live or detached.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn allocate(&mut self, node: Node) -> Result<NodeId, SceneError> {
        let id = NodeId(self.next_id);
        self.next_id = self
            .next_id
            .checked_add(1)
            .ok_or(SceneError::HandlesExhausted)?;
        self.nodes.insert(id, node);
        Ok(id)
    }

    /// Check that the root is a root node, that parent and child links agree,
    /// that every node has at most one parent and that no node is its own
    /// ancestor.
    ///
    /// # Errors
    ///
    /// Returns the first inconsistency found.
    pub fn validate(&self) -> Result<(), SceneError> {
        match self.nodes.get(&self.root) {
            Some(node) if matches!(node.data, NodeData::Root) && node.parent.is_none() => {}
            _ => return Err(SceneError::InvalidRoot(self.root)),
        }

        let mut claimed = BTreeSet::new();
        for (&id, node) in &self.nodes {
            if !node.children.is_empty() && !node.is_container() {
                return Err(SceneError::NotAContainer(id));
            }
            for &child in &node.children {
                if !claimed.insert(child) {
                    return Err(SceneError::MultipleParents(child));
                }
                let linked_back = self
                    .nodes
                    .get(&child)
                    .is_some_and(|c| c.parent == Some(id));
                if !linked_back {
                    return Err(SceneError::BrokenLink { parent: id, child });
                }
            }
            if let Some(parent) = node.parent {
                let listed = self
                    .nodes
                    .get(&parent)
                    .is_some_and(|p| p.children.contains(&id));
                if !listed {
                    return Err(SceneError::BrokenLink { parent, child: id });
                }
            }
        }

        let mut settled = BTreeSet::new();
        for &start in self.nodes.keys() {
            let mut trail = BTreeSet::new();
            let mut current = Some(start);
            while let Some(id) = current {
                if settled.contains(&id) {
                    break;
                }
                if !trail.insert(id) {
                    return Err(SceneError::Cycle(id));
                }
                current = self.nodes.get(&id).and_then(Node::parent);
            }
            settled.extend(trail);
        }
        Ok(())
    }

    fn get(&self, id: NodeId) -> Result<&Node, SceneError> {
        self.node(id).ok_or(SceneError::UnknownNode(id))
    }

    fn get_mut(&mut self, id: NodeId) -> Result<&mut Node, SceneError> {
        self.node_mut(id).ok_or(SceneError::UnknownNode(id))
    }

    // -- Construction --

    /// Create a node under `parent`.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError`] if `parent` is unknown or cannot hold children.
    pub fn spawn(&mut self, parent: NodeId, data: NodeData) -> Result<NodeId, SceneError> {
        if !self.get(parent)?.is_container() {
            return Err(SceneError::NotAContainer(parent));
        }
        let id = self.allocate(Node::new(data))?;
        self.attach(parent, id);
        Ok(id)
    }

    /// Create a group entity under `parent`.
    ///
    /// # Errors
    ///
    /// See [`Scene::spawn`].
    pub fn add_group(&mut self, parent: NodeId, keys: EntityKeys) -> Result<NodeId, SceneError> {
        self.spawn(parent, NodeData::Group(keys))
    }

    /// Create a point entity under `parent`.
    ///
    /// # Errors
    ///
    /// See [`Scene::spawn`].
    pub fn add_point(&mut self, parent: NodeId, keys: EntityKeys) -> Result<NodeId, SceneError> {
        self.spawn(parent, NodeData::Point(keys))
    }

    /// Create a brush under `parent`.
    ///
    /// # Errors
    ///
    /// See [`Scene::spawn`].
    pub fn add_brush(&mut self, parent: NodeId, brush: Brush) -> Result<NodeId, SceneError> {
        self.spawn(parent, NodeData::Brush(brush))
    }

    /// Create a patch under `parent`.
    ///
    /// # Errors
    ///
    /// See [`Scene::spawn`].
    pub fn add_patch(&mut self, parent: NodeId, patch: Patch) -> Result<NodeId, SceneError> {
        self.spawn(parent, NodeData::Patch(patch))
    }

    // -- Queries --

    /// Returns `true` if `id` is a group entity.
    #[must_use]
    pub fn is_group(&self, id: NodeId) -> bool {
        self.node(id).is_some_and(Node::is_group)
    }

    /// Returns the entity keys of a group or point entity.
    #[must_use]
    pub fn entity(&self, id: NodeId) -> Option<&EntityKeys> {
        self.node(id).and_then(Node::entity)
    }

    /// Mutable access to the entity keys of a group or point entity.
    pub fn entity_mut(&mut self, id: NodeId) -> Option<&mut EntityKeys> {
        self.node_mut(id).and_then(Node::entity_mut)
    }

    /// Returns the entity class of `id`, resolved through its `classname`.
    #[must_use]
    pub fn entity_class(&self, id: NodeId) -> &EntityClass {
        self.classes
            .get(self.entity(id).map_or("", EntityKeys::classname))
    }

    /// Returns the entity class registry.
    #[must_use]
    pub fn classes(&self) -> &EntityClassRegistry {
        &self.classes
    }

    /// Mutable access to the entity class registry.
    pub fn classes_mut(&mut self) -> &mut EntityClassRegistry {
        &mut self.classes
    }

    /// Returns the parent of `id`.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(Node::parent)
    }

    /// Returns the direct children of `id` (empty for unknown nodes).
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(Node::children).unwrap_or_default()
    }

    /// Returns `true` if `id` is reachable from the root.
    #[must_use]
    pub fn is_live(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            if current == self.root {
                return true;
            }
            match self.parent(current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// Returns the chain of nodes from the topmost ancestor down to `id`.
    #[must_use]
    pub fn path(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = Vec::new();
        let mut current = Some(id).filter(|&n| self.contains(n));
        while let Some(node) = current {
            path.push(node);
            current = self.parent(node);
        }
        path.reverse();
        path
    }

    /// Returns the local-to-parent matrix of a group.
    #[must_use]
    pub fn local_to_parent(&self, id: NodeId) -> Option<Mat4> {
        self.node(id).and_then(Node::local_to_parent)
    }

    /// Replace the local-to-parent matrix of a group.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::NoTransform`] if `id` is not a group.
    pub fn set_local_to_parent(&mut self, id: NodeId, matrix: Mat4) -> Result<(), SceneError> {
        let node = self.get_mut(id)?;
        match node.transform.as_mut() {
            Some(transform) => {
                *transform = matrix;
                Ok(())
            }
            None => Err(SceneError::NoTransform(id)),
        }
    }

    // -- Traversal --

    /// Depth-first, pre-order walk over the live scene.
    ///
    /// The visitor returns `true` to descend into the node's children.
    pub fn traverse<F>(&self, visitor: F)
    where
        F: FnMut(NodeId, &Node) -> bool,
    {
        self.traverse_from(self.root, visitor);
    }

    /// Depth-first, pre-order walk starting at `start` (inclusive).
    pub fn traverse_from<F>(&self, start: NodeId, mut visitor: F)
    where
        F: FnMut(NodeId, &Node) -> bool,
    {
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            let Some(node) = self.node(id) else {
                continue;
            };
            if visitor(id, node) {
                stack.extend(node.children.iter().rev().copied());
            }
        }
    }

    // -- Mutation --

    fn attach(&mut self, parent: NodeId, child: NodeId) {
        if let Some(node) = self.node_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.node_mut(parent) {
            node.children.push(child);
        }
    }

    /// Deep-clone `id` and its descendants into new, detached arena entries.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError`] if `id` is unknown or is the root.
    pub fn clone_subtree(&mut self, id: NodeId) -> Result<NodeId, SceneError> {
        if id == self.root {
            return Err(SceneError::RootNotMovable);
        }
        let mut copy = self.get(id)?.clone();
        copy.parent = None;
        let children = std::mem::take(&mut copy.children);
        let clone = self.allocate(copy)?;
        for child in children {
            let child_clone = self.clone_subtree(child)?;
            self.attach(clone, child_clone);
        }
        Ok(clone)
    }

    fn check_insertable(&self, parent: NodeId, child: NodeId) -> Result<(), SceneError> {
        if !self.get(parent)?.is_container() {
            return Err(SceneError::NotAContainer(parent));
        }
        if child == self.root {
            return Err(SceneError::RootNotMovable);
        }
        if self.get(child)?.parent.is_some() {
            return Err(SceneError::AlreadyAttached(child));
        }
        Ok(())
    }

    /// Attach the detached node `child` as the last child of `parent`.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError`] if either node is unknown, `parent` cannot
    /// hold children or `child` is already attached.
    pub fn insert_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), SceneError> {
        self.check_insertable(parent, child)?;
        self.attach(parent, child);
        Ok(())
    }

    /// Remove `child` from `parent` and free it together with its
    /// descendants. Erased nodes are also deselected.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError`] if `child` is not a child of `parent`.
    pub fn erase_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), SceneError> {
        let node = self.get_mut(parent)?;
        let Some(pos) = node.children.iter().position(|&c| c == child) else {
            return Err(SceneError::NotAChild { parent, child });
        };
        node.children.remove(pos);
        self.free_subtree(child);
        Ok(())
    }

    fn free_subtree(&mut self, id: NodeId) {
        let mut doomed = Vec::new();
        self.traverse_from(id, |node_id, _| {
            doomed.push(node_id);
            true
        });
        for node_id in doomed {
            self.selection.deselect(node_id);
            self.nodes.remove(&node_id);
        }
    }

    /// Replace all children of `parent` with `children` (detached nodes).
    ///
    /// Every new child is validated before anything is erased, so on error
    /// the scene is unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError`] if `parent` cannot hold children or any new
    /// child is unknown or already attached.
    pub fn replace_children(
        &mut self,
        parent: NodeId,
        children: &[NodeId],
    ) -> Result<(), SceneError> {
        for &child in children {
            self.check_insertable(parent, child)?;
        }
        let existing = std::mem::take(&mut self.get_mut(parent)?.children);
        for old in existing {
            self.free_subtree(old);
        }
        for &child in children {
            self.attach(parent, child);
        }
        Ok(())
    }

    // -- Selection --

    /// Returns the selection.
    #[must_use]
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Mutable access to the selection.
    pub fn selection_mut(&mut self) -> &mut Selection {
        &mut self.selection
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}
