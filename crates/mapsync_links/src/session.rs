//! Transform sessions: brackets around interactive drags.
//!
//! While a drag is in progress the manipulator rewrites group placements
//! continuously. The session captures each linked group's placement at the
//! start and, when the outermost bracket closes, folds the net change into
//! the group's transform key once.

use std::collections::BTreeMap;

use glam::Mat4;
use mapsync_math::{IDENTITY_EPSILON, affine_inverse, is_identity};
use mapsync_scene::{NodeId, Scene};
use tracing::{debug, error};

use crate::codec::{read_transform, write_transform};
use crate::error::LinkedGroupsError;
use crate::link::is_linked_group;
use crate::system::LinkedGroups;

/// Captured start placements of the active drag.
#[derive(Debug, Default)]
pub struct TransformSession {
    depth: usize,
    start: BTreeMap<NodeId, Mat4>,
}

impl TransformSession {
    /// Create a closed session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the nesting depth.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Returns `true` if `group` was captured by the active bracket.
    #[must_use]
    pub fn is_transforming(&self, group: NodeId) -> bool {
        self.start.contains_key(&group)
    }
}

/// Outcome of closing a transform bracket.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TransformReport {
    /// Groups whose transform key absorbed the drag.
    pub updated: Vec<NodeId>,
    /// Groups skipped because their start placement was singular.
    pub failed: Vec<LinkedGroupsError>,
}

impl TransformReport {
    /// Returns `true` if nothing was updated or failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.updated.is_empty() && self.failed.is_empty()
    }
}

impl LinkedGroups {
    /// Open a transform bracket over `groups`.
    ///
    /// Only the outermost bracket captures anything; the linked groups among
    /// `groups` stop accepting dirty marks until it closes. An empty list
    /// opens no bracket.
    pub fn begin_transform(&mut self, scene: &Scene, groups: &[NodeId]) {
        if groups.is_empty() {
            return;
        }
        self.session.depth += 1;
        if self.session.depth != 1 {
            return;
        }

        self.session.start.clear();
        for &group in groups {
            if !is_linked_group(scene, group) {
                continue;
            }
            if let Some(placement) = scene.local_to_parent(group) {
                self.session.start.insert(group, placement);
            }
        }
        debug!(groups = self.session.start.len(), "transform bracket opened");
    }

    /// Close a transform bracket.
    ///
    /// When the outermost bracket closes, every captured group that is still
    /// live and linked has `current * inverse(start)` premultiplied into its
    /// transform key. Other members of its link set are left alone until the
    /// next command flush. Without an open bracket this does nothing.
    pub fn end_transform(&mut self, scene: &mut Scene) -> TransformReport {
        let mut report = TransformReport::default();
        if self.session.depth == 0 {
            return report;
        }
        self.session.depth -= 1;
        if self.session.depth != 0 {
            return report;
        }

        let start = std::mem::take(&mut self.session.start);
        for (group, start_placement) in start {
            if !scene.is_live(group) || !is_linked_group(scene, group) {
                continue;
            }
            let Some(current) = scene.local_to_parent(group) else {
                continue;
            };
            let Some(inverse_start) = affine_inverse(start_placement) else {
                let err = LinkedGroupsError::Geometry { group };
                error!(%group, "linked groups update skipped: {err}");
                report.failed.push(err);
                continue;
            };

            let delta = current * inverse_start;
            if is_identity(delta, IDENTITY_EPSILON) {
                continue;
            }
            if let Some(keys) = scene.entity_mut(group) {
                let updated = delta * read_transform(keys);
                write_transform(keys, updated);
                report.updated.push(group);
            }
        }
        debug!(updated = report.updated.len(), "transform bracket closed");
        report
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::fixtures;

    #[test]
    fn test_end_without_begin_is_noop() {
        let mut scene = fixtures::scene();
        let a = fixtures::linked_group(&mut scene, "g1", Mat4::IDENTITY);
        let mut system = LinkedGroups::default();
        assert!(system.end_transform(&mut scene).is_empty());
        assert_eq!(system.transform_depth(), 0);
        assert!(!scene.entity(a).unwrap().has(crate::codec::TRANSFORM_KEY));
    }

    #[test]
    fn test_empty_begin_opens_nothing() {
        let scene = fixtures::scene();
        let mut system = LinkedGroups::default();
        system.begin_transform(&scene, &[]);
        assert_eq!(system.transform_depth(), 0);
    }

    #[test]
    fn test_only_rotated_group_key_changes() {
        let mut scene = fixtures::scene();
        let placed = Mat4::from_translation(Vec3::new(0.0, 64.0, 0.0));
        let a = fixtures::linked_group(&mut scene, "g1", placed);
        let b = fixtures::linked_group(&mut scene, "g1", Mat4::IDENTITY);
        let mut system = LinkedGroups::default();

        system.begin_transform(&scene, &[a, b]);
        assert!(system.is_transforming(a));
        assert!(system.is_transforming(b));

        let yaw = Mat4::from_rotation_z(90f32.to_radians());
        scene.set_local_to_parent(a, yaw * placed).unwrap();
        let report = system.end_transform(&mut scene);

        assert_eq!(report.updated, vec![a]);
        assert!(report.failed.is_empty());
        assert!(read_transform(scene.entity(a).unwrap()).abs_diff_eq(yaw * placed, 1e-4));
        assert_eq!(read_transform(scene.entity(b).unwrap()), Mat4::IDENTITY);
        assert!(!system.is_transforming(a));
    }

    #[test]
    fn test_follower_syncs_on_next_flush() {
        let mut scene = fixtures::scene();
        let a = fixtures::linked_group(&mut scene, "g1", Mat4::IDENTITY);
        let b = fixtures::linked_group(&mut scene, "g1", Mat4::IDENTITY);
        let brush = scene.add_brush(a, fixtures::unit_brush()).unwrap();
        scene.add_brush(b, fixtures::unit_brush()).unwrap();
        let mut system = LinkedGroups::default();
        let yaw = Mat4::from_rotation_z(90f32.to_radians());

        system.on_command_start();
        system.begin_transform(&scene, &[a]);
        scene.set_local_to_parent(a, yaw).unwrap();
        if let mapsync_scene::NodeData::Brush(geometry) = &mut scene.node_mut(brush).unwrap().data {
            geometry.transform(yaw);
        }
        system.mark_node_changed(&scene, brush);
        assert!(system.dirty_groups().is_empty());
        system.end_transform(&mut scene);
        assert!(system.on_command_finish(&mut scene).is_empty());

        let ((), report) = system.command(&mut scene, "touch", |links, scene| {
            links.mark_group_changed(scene, a);
        });
        assert_eq!(report.propagated.len(), 1);
        let synced = scene.children(b)[0];
        let mapsync_scene::NodeData::Brush(geometry) = &scene.node(synced).unwrap().data else {
            panic!("expected a brush");
        };
        assert!(geometry.abs_diff_eq(&fixtures::unit_brush(), 1e-3));
    }

    #[test]
    fn test_nested_brackets_coalesce() {
        let mut scene = fixtures::scene();
        let a = fixtures::linked_group(&mut scene, "g1", Mat4::IDENTITY);
        let mut system = LinkedGroups::default();

        system.begin_transform(&scene, &[a]);
        let step = Mat4::from_translation(Vec3::new(8.0, 0.0, 0.0));
        scene.set_local_to_parent(a, step).unwrap();
        system.begin_transform(&scene, &[a]);
        scene.set_local_to_parent(a, step * step).unwrap();
        assert_eq!(system.transform_depth(), 2);

        assert!(system.end_transform(&mut scene).is_empty());
        assert!(system.is_transforming(a));

        let report = system.end_transform(&mut scene);
        assert_eq!(report.updated, vec![a]);
        assert!(read_transform(scene.entity(a).unwrap()).abs_diff_eq(step * step, 1e-4));
    }

    #[test]
    fn test_singular_start_fails_once_and_keeps_keys() {
        let mut scene = fixtures::scene();
        let flat = Mat4::from_scale(Vec3::new(1.0, 1.0, 0.0));
        let a = fixtures::linked_group(&mut scene, "g1", Mat4::IDENTITY);
        let b = fixtures::linked_group(&mut scene, "g1", Mat4::IDENTITY);
        scene.set_local_to_parent(a, flat).unwrap();
        let before_a = scene.entity(a).unwrap().clone();
        let before_b = scene.entity(b).unwrap().clone();
        let mut system = LinkedGroups::default();

        system.begin_transform(&scene, &[a]);
        scene.set_local_to_parent(a, Mat4::IDENTITY).unwrap();
        let report = system.end_transform(&mut scene);

        assert_eq!(report.failed, vec![LinkedGroupsError::Geometry { group: a }]);
        assert!(report.updated.is_empty());
        assert_eq!(scene.entity(a).unwrap(), &before_a);
        assert_eq!(scene.entity(b).unwrap(), &before_b);
    }

    #[test]
    fn test_unlinked_and_erased_groups_are_skipped() {
        let mut scene = fixtures::scene();
        let plain = fixtures::plain_group(&mut scene);
        let a = fixtures::linked_group(&mut scene, "g1", Mat4::IDENTITY);
        let mut system = LinkedGroups::default();

        system.begin_transform(&scene, &[plain, a]);
        assert!(!system.is_transforming(plain));
        scene
            .set_local_to_parent(a, Mat4::from_translation(Vec3::X))
            .unwrap();
        let root = scene.root();
        scene.erase_child(root, a).unwrap();

        assert!(system.end_transform(&mut scene).is_empty());
    }
}
