//! Link keys on group entities.

use mapsync_scene::{EntityKeys, NodeId, Scene};
use uuid::Uuid;

use crate::codec::{LINK_ID_KEY, TRANSFORM_KEY, write_transform};

/// Generate a fresh link id: a random UUID v4 in lowercase hyphenated form
/// (`8-4-4-4-12` hex digits).
#[must_use]
pub fn generate_link_id() -> String {
    Uuid::new_v4().to_string()
}

/// Returns the link id of `node`, or `""` if it has none.
#[must_use]
pub fn link_id(scene: &Scene, node: NodeId) -> &str {
    scene.entity(node).map_or("", |keys| keys.get(LINK_ID_KEY))
}

/// Returns `true` if `node` is a group carrying a non-empty link id.
#[must_use]
pub fn is_linked_group(scene: &Scene, node: NodeId) -> bool {
    scene.is_group(node) && !link_id(scene, node).is_empty()
}

/// Assign `id` as the link id of `node`.
pub fn set_link_id(scene: &mut Scene, node: NodeId, id: &str) {
    if let Some(keys) = scene.entity_mut(node) {
        keys.set(LINK_ID_KEY, id);
    }
}

/// Remove both link keys from an entity.
pub fn clear_link_keys(keys: &mut EntityKeys) {
    keys.set(LINK_ID_KEY, "");
    keys.set(TRANSFORM_KEY, "");
}

/// Capture the current placement of a group as its transform key, unless it
/// already has one.
pub fn ensure_transform_key(scene: &mut Scene, node: NodeId) {
    let Some(placement) = scene.local_to_parent(node) else {
        return;
    };
    if let Some(keys) = scene.entity_mut(node)
        && !keys.has(TRANSFORM_KEY)
    {
        write_transform(keys, placement);
    }
}
