//! Node handles and payloads.
//!
//! A [`NodeId`] is a lightweight key into the [`Scene`](crate::Scene)
//! arena. Handles are never reused: once a node is erased its entry is
//! dropped and the id is not allocated again, so a stale handle can be
//! detected instead of aliasing a new node.

use glam::Mat4;
use serde::{Deserialize, Serialize};

use crate::keys::EntityKeys;
use crate::primitive::{Brush, Patch};

/// A stable handle to a node in the scene arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Create a handle from a raw arena index.
    #[must_use]
    pub const fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Returns the arena index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Node({})", self.0)
    }
}

/// What a node is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum NodeData {
    /// The scene root. Holds children but carries no entity.
    Root,
    /// A group entity: an entity that owns child primitives and entities.
    Group(EntityKeys),
    /// A point entity.
    Point(EntityKeys),
    /// A brush primitive.
    Brush(Brush),
    /// A patch primitive.
    Patch(Patch),
}

/// A node in the scene arena.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// The node payload.
    pub data: NodeData,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    /// Local-to-parent placement; present only on groups.
    pub(crate) transform: Option<Mat4>,
}

impl Node {
    pub(crate) fn new(data: NodeData) -> Self {
        let transform = matches!(data, NodeData::Group(_)).then_some(Mat4::IDENTITY);
        Self {
            data,
            parent: None,
            children: Vec::new(),
            transform,
        }
    }

    /// Returns the parent handle, if attached.
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Returns the direct children in insertion order.
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Returns `true` for group entities.
    #[must_use]
    pub fn is_group(&self) -> bool {
        matches!(self.data, NodeData::Group(_))
    }

    /// Returns `true` if the node may hold children.
    #[must_use]
    pub fn is_container(&self) -> bool {
        matches!(self.data, NodeData::Root | NodeData::Group(_))
    }

    /// Returns the entity keys for groups and point entities.
    #[must_use]
    pub fn entity(&self) -> Option<&EntityKeys> {
        match &self.data {
            NodeData::Group(keys) | NodeData::Point(keys) => Some(keys),
            _ => None,
        }
    }

    /// Mutable access to the entity keys for groups and point entities.
    pub fn entity_mut(&mut self) -> Option<&mut EntityKeys> {
        match &mut self.data {
            NodeData::Group(keys) | NodeData::Point(keys) => Some(keys),
            _ => None,
        }
    }

    /// Returns the local-to-parent matrix of a group.
    #[must_use]
    pub fn local_to_parent(&self) -> Option<Mat4> {
        self.transform
    }
}
