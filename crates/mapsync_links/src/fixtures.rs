//! Small maps for engine tests.

use glam::{Mat4, Vec3};
use mapsync_scene::{Brush, EntityClass, EntityKeys, NodeId, Scene};

use crate::codec::{LINK_ID_KEY, write_transform};

/// An empty map with the entity classes the tests use.
pub(crate) fn scene() -> Scene {
    let mut scene = Scene::new();
    let classes = scene.classes_mut();
    classes.register(EntityClass::new("func_group"));
    classes.register(EntityClass::new("info_player_start").point().with_angles());
    classes.register(EntityClass::new("light").point());
    classes.register(EntityClass::new("misc_model").point().with_angles_key());
    scene
}

/// An 8-unit cube at the map origin.
pub(crate) fn unit_brush() -> Brush {
    Brush::cuboid(Vec3::ZERO, Vec3::splat(8.0), "common/caulk")
}

/// A group under the root carrying `link_id`, placed at `placement` and with
/// a matching transform key.
pub(crate) fn linked_group(scene: &mut Scene, link_id: &str, placement: Mat4) -> NodeId {
    let mut keys = EntityKeys::with_class("func_group").with(LINK_ID_KEY, link_id);
    write_transform(&mut keys, placement);
    let group = scene.add_group(scene.root(), keys).unwrap();
    scene.set_local_to_parent(group, placement).unwrap();
    group
}

/// A group under the root without link keys.
pub(crate) fn plain_group(scene: &mut Scene) -> NodeId {
    scene
        .add_group(scene.root(), EntityKeys::with_class("func_group"))
        .unwrap()
}
