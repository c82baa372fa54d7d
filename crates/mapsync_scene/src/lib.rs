//! # mapsync_scene
//!
//! The scene-side collaborators of the linked-group engine, modelled as an
//! arena: every node lives in one [`Scene`] and is addressed by a stable
//! [`NodeId`]. Parent/child relationships are index links, and cloning a
//! subtree allocates fresh arena entries.
//!
//! This crate provides:
//!
//! - [`NodeId`] / [`Node`] / [`NodeData`]: handles and payloads (root,
//!   groups, point entities, brushes, patches).
//! - [`EntityKeys`]: ordered entity key-value storage.
//! - [`EntityClass`] / [`EntityClassRegistry`]: per-class angle flags.
//! - [`Brush`] / [`Patch`]: primitive geometry with affine transforms.
//! - [`Scene`]: traversal, deep clone, child insert/erase, liveness.
//! - [`Selection`]: the selected node set and the selection mode.

pub mod eclass;
pub mod error;
pub mod keys;
pub mod node;
pub mod primitive;
pub mod scene;
pub mod selection;

pub use eclass::{EntityClass, EntityClassRegistry};
pub use error::SceneError;
pub use keys::EntityKeys;
pub use node::{Node, NodeData, NodeId};
pub use primitive::{Brush, Face, Patch, PatchControl};
pub use scene::Scene;
pub use selection::{Selection, SelectionMode};
