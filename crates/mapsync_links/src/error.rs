//! Error types for the linked-group engine.
//!
//! Every error is recovered locally: validation failures abort an operation
//! before it mutates anything, geometry and consistency failures skip one
//! group or link set while the rest of the work proceeds.

use mapsync_scene::{NodeId, SceneError};

/// A user operation was invoked with an unsuitable selection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The selection system is not in primitive mode.
    #[error("select a group in primitive mode")]
    NotPrimitiveMode,

    /// Zero, several, or non-group nodes are selected.
    #[error("select exactly one group")]
    NotExactlyOneGroup,

    /// The selected group is not placed in the map.
    #[error("selected group is not part of the map")]
    GroupNotPlaced,

    /// The selection is empty or contains something other than groups.
    #[error("selection must be groups")]
    SelectionNotGroups,

    /// A selected group does not belong to a link set with two or more
    /// members.
    #[error("selection must be linked")]
    SelectionNotLinked,

    /// A selected group carries no link id.
    #[error("selection must be linked groups")]
    SelectionNotLinkedGroups,
}

/// Errors produced by the linked-group engine.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LinkedGroupsError {
    /// The operation was rejected before any mutation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A group transform could not be inverted; that group's update was
    /// skipped.
    #[error("group transformation of {group} is not invertible")]
    Geometry {
        /// The group whose transform is singular.
        group: NodeId,
    },

    /// More than one member of a link set changed within one command, so
    /// there is no single source of truth.
    #[error("multiple groups modified for link id '{link_id}' ({dirty} dirty)")]
    Consistency {
        /// The affected link id.
        link_id: String,
        /// How many members were dirtied.
        dirty: usize,
    },

    /// A scene-graph edit failed.
    #[error("scene error: {0}")]
    Scene(#[from] SceneError),
}

/// Errors produced while parsing a serialised transform.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// The value does not hold exactly 16 tokens.
    #[error("expected 16 values, found {0}")]
    WrongTokenCount(usize),

    /// A token is not a finite decimal number.
    #[error("invalid number '{0}'")]
    InvalidNumber(String),
}
