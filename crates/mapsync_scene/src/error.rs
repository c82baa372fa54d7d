//! Scene-graph error types.

use crate::node::NodeId;

/// Errors that can occur while editing the scene graph.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SceneError {
    /// The handle does not refer to a node in the arena (never allocated or
    /// already erased).
    #[error("unknown node: {0}")]
    UnknownNode(NodeId),

    /// The node cannot hold children.
    #[error("{0} is not a container")]
    NotAContainer(NodeId),

    /// The node has no local-to-parent transform (only groups do).
    #[error("{0} has no transform")]
    NoTransform(NodeId),

    /// The node is already attached to a parent.
    #[error("{0} already has a parent")]
    AlreadyAttached(NodeId),

    /// The node is not a child of the given parent.
    #[error("{child} is not a child of {parent}")]
    NotAChild {
        /// The expected parent.
        parent: NodeId,
        /// The node that was not found among its children.
        child: NodeId,
    },

    /// The scene root cannot be cloned, moved or erased.
    #[error("the scene root cannot be moved")]
    RootNotMovable,

    /// The root handle is missing, is not a root node or has a parent.
    #[error("{0} is not a valid scene root")]
    InvalidRoot(NodeId),

    /// A parent and child disagree about their link.
    #[error("broken link between {parent} and {child}")]
    BrokenLink {
        /// The parent side of the link.
        parent: NodeId,
        /// The child side of the link.
        child: NodeId,
    },

    /// The node is listed as a child more than once.
    #[error("{0} has more than one parent")]
    MultipleParents(NodeId),

    /// The node is its own ancestor.
    #[error("{0} is its own ancestor")]
    Cycle(NodeId),

    /// Every node handle has been allocated.
    #[error("node handles exhausted")]
    HandlesExhausted,
}
