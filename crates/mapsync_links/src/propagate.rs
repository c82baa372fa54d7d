//! Propagation: rebuild every member of a link set from one source.
//!
//! The source group's children are deep-cloned once per target, carried
//! through `target_transform * inverse(source_transform)` and swapped in for
//! the target's children. This is a full overwrite: target-only edits are
//! discarded.

use mapsync_math::affine_inverse;
use mapsync_scene::{NodeId, Scene};
use tracing::debug;

use crate::codec::read_transform;
use crate::config::LinkedGroupsConfig;
use crate::entity_transform::transform_node;
use crate::error::LinkedGroupsError;

/// Returns `true` if one of `a` and `b` contains the other.
fn related(scene: &Scene, a: NodeId, b: NodeId) -> bool {
    scene.path(a).contains(&b) || scene.path(b).contains(&a)
}

/// Overwrite the children of every member of `members` except `source` with
/// transformed clones of the source's children.
///
/// Members that are missing, not entities, or nested inside (or around) the
/// source are skipped. Returns the targets that were rebuilt.
///
/// # Errors
///
/// Returns [`LinkedGroupsError::Geometry`] without touching the scene if the
/// source's transform key is not invertible, and
/// [`LinkedGroupsError::Scene`] if a clone could not be built or inserted.
pub fn update_from_source(
    scene: &mut Scene,
    source: NodeId,
    members: &[NodeId],
    config: &LinkedGroupsConfig,
) -> Result<Vec<NodeId>, LinkedGroupsError> {
    let Some(source_keys) = scene.entity(source) else {
        return Ok(Vec::new());
    };
    let source_transform = read_transform(source_keys);
    let source_inverse =
        affine_inverse(source_transform).ok_or(LinkedGroupsError::Geometry { group: source })?;

    let source_children = scene.children(source).to_vec();
    let mut updated = Vec::new();
    for &target in members {
        if target == source {
            continue;
        }
        let Some(target_keys) = scene.entity(target) else {
            continue;
        };
        if related(scene, source, target) {
            debug!(%source, %target, "skipping nested link set member");
            continue;
        }
        let delta = read_transform(target_keys) * source_inverse;

        let mut clones = Vec::with_capacity(source_children.len());
        for &child in &source_children {
            let clone = scene.clone_subtree(child)?;
            transform_node(scene, clone, delta, config)?;
            clones.push(clone);
        }
        scene.replace_children(target, &clones)?;

        debug!(%source, %target, children = clones.len(), "rebuilt linked group");
        updated.push(target);
    }
    Ok(updated)
}
