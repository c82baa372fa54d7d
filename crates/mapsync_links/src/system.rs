//! The linked-group service object.
//!
//! One [`LinkedGroups`] is constructed at editor startup and handed to every
//! call site that edits the map: the undo-command bracket, key-value change
//! observers, the interactive transform tool and the user commands. It owns
//! all mutable engine state; the scene is passed in explicitly.

use mapsync_scene::NodeId;

use crate::command::{CommandBatcher, CommandState};
use crate::config::LinkedGroupsConfig;
use crate::dirty::DirtyTracker;
use crate::session::TransformSession;

/// Keeps linked copies of map groups in lockstep.
#[derive(Debug)]
pub struct LinkedGroups {
    /// Engine configuration.
    pub(crate) config: LinkedGroupsConfig,
    /// Command bracket state machine.
    pub(crate) batcher: CommandBatcher,
    /// Linked groups changed in the current command.
    pub(crate) dirty: DirtyTracker,
    /// The active interactive transform bracket, if any.
    pub(crate) session: TransformSession,
}

impl LinkedGroups {
    /// Create the service with the given configuration.
    #[must_use]
    pub fn new(config: LinkedGroupsConfig) -> Self {
        Self {
            config,
            batcher: CommandBatcher::new(),
            dirty: DirtyTracker::new(),
            session: TransformSession::new(),
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &LinkedGroupsConfig {
        &self.config
    }

    /// Returns the command bracket state.
    #[must_use]
    pub fn command_state(&self) -> CommandState {
        self.batcher.state()
    }

    /// Returns the currently dirty groups in handle order.
    #[must_use]
    pub fn dirty_groups(&self) -> Vec<NodeId> {
        self.dirty.iter().collect()
    }

    /// Returns `true` if `group` is inside the active transform bracket.
    #[must_use]
    pub fn is_transforming(&self, group: NodeId) -> bool {
        self.session.is_transforming(group)
    }

    /// Returns the nesting depth of transform brackets.
    #[must_use]
    pub fn transform_depth(&self) -> usize {
        self.session.depth()
    }
}

impl Default for LinkedGroups {
    fn default() -> Self {
        Self::new(LinkedGroupsConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_service_is_idle() {
        let system = LinkedGroups::default();
        assert_eq!(system.command_state(), CommandState::Idle);
        assert!(system.dirty_groups().is_empty());
        assert_eq!(system.transform_depth(), 0);
        assert!(!system.is_transforming(NodeId(1)));
        assert!(!system.config().quake1_angles_bug());
    }

    #[test]
    fn test_config_is_kept() {
        let system = LinkedGroups::new(LinkedGroupsConfig::new().with_game_type("q1"));
        assert!(system.config().quake1_angles_bug());
    }
}
