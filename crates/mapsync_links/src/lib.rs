//! # mapsync_links
//!
//! Linked groups: several copies of one map group that stay identical up to
//! their own placement. Editing any copy rewrites the others.
//!
//! Each linked group carries two entity keys:
//!
//! - `_tb_linked_group_id`: the link id shared by every copy.
//! - `_tb_transformation`: the copy's accumulated placement, serialised by
//!   [`codec`].
//!
//! The [`LinkedGroups`] service ties the pieces together:
//!
//! - [`dirty`]: edits inside a command mark their enclosing linked group.
//! - [`command`]: when the command closes, each link set with exactly one
//!   dirty member is rebuilt from it ([`propagate`]).
//! - [`session`]: interactive drags fold their net motion into the dragged
//!   group's transform key once.
//! - [`operations`]: create a linked duplicate, select linked groups,
//!   separate linked groups.

pub mod angles;
pub mod codec;
pub mod command;
pub mod config;
pub mod dirty;
pub mod entity_transform;
pub mod error;
pub mod link;
pub mod operations;
pub mod propagate;
pub mod registry;
pub mod session;
pub mod system;

#[cfg(test)]
mod fixtures;

pub use codec::{
    LINK_ID_KEY, TRANSFORM_KEY, format_transform, parse_transform, read_transform, write_transform,
};
pub use command::{CommandBatcher, CommandState, FlushReport, Propagation};
pub use config::LinkedGroupsConfig;
pub use dirty::DirtyTracker;
pub use entity_transform::{transform_entity, transform_node};
pub use error::{CodecError, LinkedGroupsError, ValidationError};
pub use link::{generate_link_id, is_linked_group, link_id};
pub use propagate::update_from_source;
pub use registry::LinkRegistry;
pub use session::{TransformReport, TransformSession};
pub use system::LinkedGroups;
