//! Applying a rigid delta to entities and whole subtrees.
//!
//! Orientation is composed rather than overwritten: the rotational part of
//! the delta is multiplied onto the entity's current orientation, which is
//! read from (and written back to) whichever representation the entity
//! already uses.

use glam::{Mat3, Mat4};
use mapsync_math::{
    IDENTITY_EPSILON, euler_degrees_from_rotation, orthonormalize, rotation_from_euler_degrees_quantised,
    rotation_part, snapped_to_zero,
};
use mapsync_scene::{EntityClass, EntityKeys, NodeData, NodeId, Scene, SceneError};

use crate::angles::{
    ANGLE_KEY, ANGLES_KEY, ORIGIN_KEY, read_angle, read_angles, read_direction_angle, read_origin,
    read_rotation, rotation_key, write_angles, write_origin, write_rotation,
};
use crate::codec::{LINK_ID_KEY, read_transform, write_transform};
use crate::config::LinkedGroupsConfig;

/// Returns `true` if the entity's keys or class carry an orientation.
#[must_use]
pub fn supports_angles(keys: &EntityKeys, class: &EntityClass) -> bool {
    rotation_key(keys).is_some()
        || keys.has(ANGLES_KEY)
        || keys.has(ANGLE_KEY)
        || class.supports_angles()
}

fn current_rotation(keys: &EntityKeys, class: &EntityClass, quake1_bug: bool) -> Mat3 {
    if let Some(key) = rotation_key(keys) {
        return read_rotation(keys.get(key));
    }
    let angles = if keys.has(ANGLES_KEY) {
        read_angles(keys.get(ANGLES_KEY), quake1_bug)
    } else if keys.has(ANGLE_KEY) {
        if class.has_direction_key {
            read_direction_angle(keys.get(ANGLE_KEY))
        } else {
            read_angle(keys.get(ANGLE_KEY))
        }
    } else {
        glam::Vec3::ZERO
    };
    rotation_from_euler_degrees_quantised(angles)
}

/// Apply `delta` to an entity's position, orientation and, for nested
/// linked groups, its transform key.
pub fn transform_entity(
    keys: &mut EntityKeys,
    class: &EntityClass,
    delta: Mat4,
    config: &LinkedGroupsConfig,
) {
    if keys.has(ORIGIN_KEY) || class.fixedsize {
        let origin = read_origin(keys.get(ORIGIN_KEY));
        write_origin(keys, ORIGIN_KEY, delta.transform_point3(origin));
    }

    let delta_rotation = rotation_part(delta);
    if supports_angles(keys, class) && !delta_rotation.abs_diff_eq(Mat3::IDENTITY, IDENTITY_EPSILON)
    {
        let quake1_bug = config.quake1_angles_bug();
        let current = current_rotation(keys, class, quake1_bug);
        let updated = orthonormalize(delta_rotation * current);
        match rotation_key(keys) {
            Some(key) => write_rotation(keys, key, updated),
            None => {
                let angles = snapped_to_zero(
                    euler_degrees_from_rotation(updated),
                    config.angle_snap_epsilon,
                );
                write_angles(keys, angles, quake1_bug);
            }
        }
    }

    if keys.has(LINK_ID_KEY) {
        let updated = delta * read_transform(keys);
        write_transform(keys, updated);
    }
}

/// Apply `delta` to `node` and everything below it.
///
/// Brushes and patches are transformed geometrically, entities through
/// [`transform_entity`]. Groups additionally move their placement.
///
/// # Errors
///
/// Returns [`SceneError::UnknownNode`] if `node` or a descendant is missing.
pub fn transform_node(
    scene: &mut Scene,
    node: NodeId,
    delta: Mat4,
    config: &LinkedGroupsConfig,
) -> Result<(), SceneError> {
    let class = scene.entity_class(node).clone();
    let entry = scene.node_mut(node).ok_or(SceneError::UnknownNode(node))?;
    let is_group = entry.is_group();
    match &mut entry.data {
        NodeData::Root => {}
        NodeData::Brush(brush) => brush.transform(delta),
        NodeData::Patch(patch) => patch.transform(delta),
        NodeData::Point(keys) | NodeData::Group(keys) => {
            transform_entity(keys, &class, delta, config);
        }
    }
    if !is_group {
        return Ok(());
    }

    if let Some(placement) = scene.local_to_parent(node) {
        scene.set_local_to_parent(node, delta * placement)?;
    }
    for child in scene.children(node).to_vec() {
        transform_node(scene, child, delta, config)?;
    }
    Ok(())
}
