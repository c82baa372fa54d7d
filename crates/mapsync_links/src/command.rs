//! Command brackets and the synchronization flush.
//!
//! Every user edit runs between `on_command_start` and `on_command_finish`.
//! Linked groups touched in between are collected by the dirty tracker; when
//! the bracket closes, each link set with exactly one dirty member is
//! rebuilt from that member.
//!
//! ```text
//! Idle --start--> Active --finish--> Updating --flush done--> Idle
//!                   |                   |
//!                   +--finish (clean)---+--finish (reentrant)--> Idle
//! ```

use std::collections::BTreeMap;

use mapsync_scene::{NodeId, Scene};
use tracing::{debug, error, info, info_span};

use crate::error::LinkedGroupsError;
use crate::link::{is_linked_group, link_id};
use crate::propagate::update_from_source;
use crate::registry::LinkRegistry;
use crate::system::LinkedGroups;

/// State of the command bracket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CommandState {
    /// No command is open.
    #[default]
    Idle,
    /// A command is open and dirty marks are collected.
    Active,
    /// The flush is writing; marks and nested finishes are absorbed.
    Updating,
}

/// The command bracket state machine.
#[derive(Debug, Default)]
pub struct CommandBatcher {
    state: CommandState,
}

impl CommandBatcher {
    /// Create an idle batcher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> CommandState {
        self.state
    }

    /// Returns `true` if dirty marks should be recorded.
    #[must_use]
    pub fn accepts_marks(&self) -> bool {
        self.state == CommandState::Active
    }

    /// Open a command. Returns `false` if one is already open.
    pub fn start(&mut self) -> bool {
        if self.state != CommandState::Idle {
            return false;
        }
        self.state = CommandState::Active;
        true
    }

    /// Move an open command into the flush.
    pub fn begin_update(&mut self) {
        self.state = CommandState::Updating;
    }

    /// Close the command.
    pub fn complete(&mut self) {
        self.state = CommandState::Idle;
    }
}

/// One link set rebuilt during a flush.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Propagation {
    /// The link id of the set.
    pub link_id: String,
    /// The dirty member used as the source of truth.
    pub source: NodeId,
    /// The members whose children were replaced.
    pub targets: Vec<NodeId>,
}

/// Outcome of a command flush.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FlushReport {
    /// Link sets that were synchronized.
    pub propagated: Vec<Propagation>,
    /// Link sets skipped because of an error.
    pub skipped: Vec<LinkedGroupsError>,
}

impl FlushReport {
    /// Returns `true` if the flush did nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.propagated.is_empty() && self.skipped.is_empty()
    }
}

impl LinkedGroups {
    /// Open a command bracket. Nested starts share the outer window.
    pub fn on_command_start(&mut self) {
        if self.batcher.start() {
            self.dirty.clear();
        }
    }

    /// Close a command bracket and synchronize the dirty link sets.
    pub fn on_command_finish(&mut self, scene: &mut Scene) -> FlushReport {
        let mut report = FlushReport::default();
        match self.batcher.state() {
            CommandState::Idle => return report,
            CommandState::Updating => {
                self.dirty.clear();
                self.batcher.complete();
                return report;
            }
            CommandState::Active => {}
        }
        if self.dirty.is_empty() {
            self.batcher.complete();
            return report;
        }

        self.batcher.begin_update();
        let mut dirty_by_id: BTreeMap<String, Vec<NodeId>> = BTreeMap::new();
        for group in self.dirty.take() {
            if !scene.is_live(group) || !is_linked_group(scene, group) {
                continue;
            }
            dirty_by_id
                .entry(link_id(scene, group).to_string())
                .or_default()
                .push(group);
        }

        let registry = LinkRegistry::scan(scene);
        for (link_id, dirty) in dirty_by_id {
            let &[source] = dirty.as_slice() else {
                error!(
                    link_id = %link_id,
                    dirty = dirty.len(),
                    "linked groups update skipped: multiple groups modified"
                );
                report.skipped.push(LinkedGroupsError::Consistency {
                    link_id,
                    dirty: dirty.len(),
                });
                continue;
            };
            let Some(members) = registry.get(&link_id) else {
                continue;
            };
            if members.len() < 2 {
                debug!(link_id = %link_id, "link set has a single member");
                continue;
            }
            if !scene.is_live(source) {
                debug!(link_id = %link_id, %source, "dirty source no longer in the map");
                continue;
            }

            match update_from_source(scene, source, members, &self.config) {
                Ok(targets) => {
                    info!(
                        link_id = %link_id,
                        %source,
                        targets = targets.len(),
                        "synchronized linked groups"
                    );
                    report.propagated.push(Propagation {
                        link_id,
                        source,
                        targets,
                    });
                }
                Err(err) => {
                    error!(link_id = %link_id, %source, "linked groups update skipped: {err}");
                    report.skipped.push(err);
                }
            }
        }

        self.batcher.complete();
        report
    }

    /// Run `f` inside a command bracket named `name`.
    ///
    /// Inside an already open bracket `f` simply joins it and the returned
    /// report is empty; the outer bracket flushes.
    pub fn command<R>(
        &mut self,
        scene: &mut Scene,
        name: &str,
        f: impl FnOnce(&mut Self, &mut Scene) -> R,
    ) -> (R, FlushReport) {
        let span = info_span!("command", command = name);
        let _enter = span.enter();

        if self.batcher.state() != CommandState::Idle {
            return (f(self, scene), FlushReport::default());
        }
        self.on_command_start();
        let result = f(self, scene);
        let report = self.on_command_finish(scene);
        (result, report)
    }
}

#[cfg(test)]
mod tests {
    use glam::{Mat4, Vec3};
    use mapsync_scene::{Brush, EntityKeys, NodeData};

    use super::*;
    use crate::codec::{LINK_ID_KEY, write_transform};
    use crate::fixtures;

    #[test]
    fn test_batcher_transitions() {
        let mut batcher = CommandBatcher::new();
        assert_eq!(batcher.state(), CommandState::Idle);
        assert!(!batcher.accepts_marks());
        assert!(batcher.start());
        assert!(batcher.accepts_marks());
        assert!(!batcher.start());
        batcher.begin_update();
        assert!(!batcher.accepts_marks());
        assert!(!batcher.start());
        batcher.complete();
        assert_eq!(batcher.state(), CommandState::Idle);
    }

    #[test]
    fn test_finish_without_start_is_noop() {
        let mut scene = fixtures::scene();
        let mut system = LinkedGroups::default();
        assert!(system.on_command_finish(&mut scene).is_empty());
        assert_eq!(system.command_state(), CommandState::Idle);
    }

    #[test]
    fn test_reentrant_finish_is_absorbed() {
        let mut scene = fixtures::scene();
        let a = fixtures::linked_group(&mut scene, "g1", Mat4::IDENTITY);
        let mut system = LinkedGroups::default();
        system.on_command_start();
        system.mark_group_changed(&scene, a);
        system.batcher.begin_update();

        let report = system.on_command_finish(&mut scene);
        assert!(report.is_empty());
        assert_eq!(system.command_state(), CommandState::Idle);
        assert!(system.dirty_groups().is_empty());
    }

    #[test]
    fn test_nested_start_keeps_dirty_set() {
        let mut scene = fixtures::scene();
        let a = fixtures::linked_group(&mut scene, "g1", Mat4::IDENTITY);
        let mut system = LinkedGroups::default();
        system.on_command_start();
        system.mark_group_changed(&scene, a);
        system.on_command_start();
        assert_eq!(system.dirty_groups(), vec![a]);
    }

    #[test]
    fn test_edit_propagates_to_translated_member() {
        let mut scene = fixtures::scene();
        let shift = Mat4::from_translation(Vec3::new(10.0, 0.0, 0.0));
        let a = fixtures::linked_group(&mut scene, "g1", Mat4::IDENTITY);
        let b = fixtures::linked_group(&mut scene, "g1", shift);
        let brush = scene.add_brush(a, fixtures::unit_brush()).unwrap();
        scene.add_brush(b, fixtures::unit_brush().transformed(shift)).unwrap();
        let mut system = LinkedGroups::default();

        let edited = Brush::cuboid(Vec3::ZERO, Vec3::new(16.0, 8.0, 8.0), "base/wall");
        let ((), report) = system.command(&mut scene, "resizeBrush", |links, scene| {
            scene.node_mut(brush).unwrap().data = NodeData::Brush(edited.clone());
            links.mark_node_changed(scene, brush);
        });

        assert_eq!(
            report.propagated,
            vec![Propagation {
                link_id: "g1".to_string(),
                source: a,
                targets: vec![b],
            }]
        );
        let children = scene.children(b);
        assert_eq!(children.len(), 1);
        let NodeData::Brush(synced) = &scene.node(children[0]).unwrap().data else {
            panic!("expected a brush");
        };
        assert!(synced.abs_diff_eq(&edited.transformed(shift), 1e-4));
        assert_eq!(system.command_state(), CommandState::Idle);
    }

    #[test]
    fn test_source_erased_by_earlier_set_is_skipped() {
        let mut scene = fixtures::scene();
        let a = fixtures::linked_group(&mut scene, "g1", Mat4::IDENTITY);
        let b = fixtures::linked_group(&mut scene, "g1", Mat4::IDENTITY);
        scene.add_brush(a, fixtures::unit_brush()).unwrap();

        let mut keys = EntityKeys::with_class("func_group").with(LINK_ID_KEY, "g2");
        write_transform(&mut keys, Mat4::IDENTITY);
        let nested = scene.add_group(b, keys).unwrap();
        scene.set_local_to_parent(nested, Mat4::IDENTITY).unwrap();
        scene.add_brush(nested, fixtures::unit_brush()).unwrap();
        let partner = fixtures::linked_group(&mut scene, "g2", Mat4::IDENTITY);
        let mut system = LinkedGroups::default();

        system.on_command_start();
        system.mark_group_changed(&scene, a);
        system.mark_group_changed(&scene, nested);
        let report = system.on_command_finish(&mut scene);

        assert!(!scene.contains(nested));
        assert!(report.skipped.is_empty());
        assert_eq!(
            report.propagated,
            vec![Propagation {
                link_id: "g1".to_string(),
                source: a,
                targets: vec![b],
            }]
        );
        assert!(scene.children(partner).is_empty());
        assert_eq!(system.command_state(), CommandState::Idle);
    }

    #[test]
    fn test_two_dirty_members_skip_the_set() {
        let mut scene = fixtures::scene();
        let a = fixtures::linked_group(&mut scene, "g1", Mat4::IDENTITY);
        let b = fixtures::linked_group(&mut scene, "g1", Mat4::IDENTITY);
        let c = fixtures::linked_group(&mut scene, "g2", Mat4::IDENTITY);
        let d = fixtures::linked_group(&mut scene, "g2", Mat4::IDENTITY);
        let kept = scene.add_brush(b, Brush::default()).unwrap();
        scene.add_brush(c, fixtures::unit_brush()).unwrap();
        let mut system = LinkedGroups::default();

        system.on_command_start();
        system.mark_group_changed(&scene, a);
        system.mark_group_changed(&scene, b);
        system.mark_group_changed(&scene, c);
        let report = system.on_command_finish(&mut scene);

        assert_eq!(
            report.skipped,
            vec![LinkedGroupsError::Consistency {
                link_id: "g1".to_string(),
                dirty: 2,
            }]
        );
        assert_eq!(scene.children(b), &[kept]);
        assert_eq!(report.propagated.len(), 1);
        assert_eq!(report.propagated[0].targets, vec![d]);
        assert_eq!(scene.children(d).len(), 1);
    }

    #[test]
    fn test_flush_writes_do_not_redirty() {
        let mut scene = fixtures::scene();
        let a = fixtures::linked_group(&mut scene, "g1", Mat4::IDENTITY);
        let b = fixtures::linked_group(&mut scene, "g1", Mat4::IDENTITY);
        let mut system = LinkedGroups::default();

        system.on_command_start();
        system.mark_group_changed(&scene, a);
        system.batcher.begin_update();
        system.mark_group_changed(&scene, b);
        assert_eq!(system.dirty_groups(), vec![a]);
    }

    #[test]
    fn test_solitary_link_id_is_not_propagated() {
        let mut scene = fixtures::scene();
        let a = fixtures::linked_group(&mut scene, "lonely", Mat4::IDENTITY);
        let mut system = LinkedGroups::default();
        let ((), report) = system.command(&mut scene, "touch", |links, scene| {
            links.mark_group_changed(scene, a);
        });
        assert!(report.is_empty());
    }

    #[test]
    fn test_nested_command_joins_outer_bracket() {
        let mut scene = fixtures::scene();
        let a = fixtures::linked_group(&mut scene, "g1", Mat4::IDENTITY);
        fixtures::linked_group(&mut scene, "g1", Mat4::IDENTITY);
        let mut system = LinkedGroups::default();

        let (inner, outer) = system.command(&mut scene, "outer", |links, scene| {
            let ((), inner) = links.command(scene, "inner", |links, scene| {
                links.mark_group_changed(scene, a);
            });
            inner
        });
        assert!(inner.is_empty());
        assert_eq!(outer.propagated.len(), 1);
    }
}
