//! User commands on linked groups.
//!
//! Each command validates the selection first and logs a rejected selection
//! once at error level. Commands that edit the map run in a command bracket
//! so the edit participates in the usual flush.

use std::collections::BTreeSet;

use mapsync_scene::{NodeId, Scene, SelectionMode};
use tracing::{error, info};

use crate::error::{LinkedGroupsError, ValidationError};
use crate::link::{
    clear_link_keys, ensure_transform_key, generate_link_id, link_id, set_link_id,
};
use crate::registry::LinkRegistry;
use crate::system::LinkedGroups;

/// Log and wrap a rejected selection.
fn rejected(operation: &str, err: ValidationError) -> LinkedGroupsError {
    error!(operation, "{err}");
    err.into()
}

/// Returns the selected groups, or `None` if the selection is empty or holds
/// anything but groups.
fn selected_groups(scene: &Scene) -> Option<Vec<NodeId>> {
    let selected = scene.selection().selected();
    if selected.is_empty() || !selected.iter().all(|&node| scene.is_group(node)) {
        return None;
    }
    Some(selected.to_vec())
}

fn clear_links(scene: &mut Scene, group: NodeId) {
    if let Some(keys) = scene.entity_mut(group) {
        clear_link_keys(keys);
    }
}

impl LinkedGroups {
    /// Clone the single selected group next to itself and link the two.
    ///
    /// The selected group receives a fresh link id if it has none. Both groups get
    /// a transform key capturing their placement, and the clone becomes the
    /// only selection. Returns the clone.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if the selection is not exactly one placed
    /// group in primitive mode, or [`LinkedGroupsError::Scene`] if the clone
    /// could not be inserted.
    pub fn create_linked_duplicate(
        &mut self,
        scene: &mut Scene,
    ) -> Result<NodeId, LinkedGroupsError> {
        const OPERATION: &str = "create linked duplicate";
        if scene.selection().mode() != SelectionMode::Primitive {
            return Err(rejected(OPERATION, ValidationError::NotPrimitiveMode));
        }
        let group = match selected_groups(scene).as_deref() {
            Some(&[group]) => group,
            _ => return Err(rejected(OPERATION, ValidationError::NotExactlyOneGroup)),
        };
        let Some(parent) = scene.parent(group).filter(|_| scene.is_live(group)) else {
            return Err(rejected(OPERATION, ValidationError::GroupNotPlaced));
        };

        let existing = link_id(scene, group);
        let id = if existing.is_empty() {
            generate_link_id()
        } else {
            existing.to_string()
        };

        let (result, _) = self.command(
            scene,
            "createLinkedDuplicate",
            |_, scene| -> Result<NodeId, LinkedGroupsError> {
                set_link_id(scene, group, &id);
                ensure_transform_key(scene, group);

                let clone = scene.clone_subtree(group)?;
                scene.insert_child(parent, clone)?;
                set_link_id(scene, clone, &id);
                ensure_transform_key(scene, clone);

                let selection = scene.selection_mut();
                selection.clear();
                selection.select(clone);
                Ok(clone)
            },
        );
        let clone = result?;
        info!(link_id = %id, %group, %clone, "created linked duplicate");
        Ok(clone)
    }

    /// Extend the selection to every member of every link set touched by
    /// the selected groups. Returns the new selection.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] unless the selection consists only of
    /// groups that belong to link sets with at least two members.
    pub fn select_linked_groups(
        &mut self,
        scene: &mut Scene,
    ) -> Result<Vec<NodeId>, LinkedGroupsError> {
        const OPERATION: &str = "select linked groups";
        if scene.selection().mode() != SelectionMode::Primitive {
            return Err(rejected(OPERATION, ValidationError::SelectionNotGroups));
        }
        let Some(groups) = selected_groups(scene) else {
            return Err(rejected(OPERATION, ValidationError::SelectionNotGroups));
        };

        let registry = LinkRegistry::scan(scene);
        if !groups
            .iter()
            .all(|&group| registry.is_linked(link_id(scene, group)))
        {
            return Err(rejected(OPERATION, ValidationError::SelectionNotLinked));
        }

        let mut to_select = BTreeSet::new();
        for &group in &groups {
            if let Some(members) = registry.get(link_id(scene, group)) {
                to_select.extend(members.iter().copied());
            }
        }

        let selection = scene.selection_mut();
        selection.clear();
        for &node in &to_select {
            selection.select(node);
        }
        Ok(to_select.into_iter().collect())
    }

    /// Split the selected groups off their link sets.
    ///
    /// Per link set: if every member is selected, all members are unlinked;
    /// a single selected member is unlinked alone; several selected members
    /// move to a fresh shared link id. A single unselected member left behind
    /// is unlinked as well.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] unless the selection consists only of
    /// groups that carry a link id.
    pub fn separate_selected_linked_groups(
        &mut self,
        scene: &mut Scene,
    ) -> Result<(), LinkedGroupsError> {
        const OPERATION: &str = "separate linked groups";
        if scene.selection().mode() != SelectionMode::Primitive {
            return Err(rejected(OPERATION, ValidationError::SelectionNotGroups));
        }
        let Some(groups) = selected_groups(scene) else {
            return Err(rejected(OPERATION, ValidationError::SelectionNotGroups));
        };
        if groups.iter().any(|&group| link_id(scene, group).is_empty()) {
            return Err(rejected(OPERATION, ValidationError::SelectionNotLinkedGroups));
        }

        let selected: BTreeSet<NodeId> = groups.into_iter().collect();
        let registry = LinkRegistry::scan(scene);
        self.command(scene, "separateLinkedGroups", |_, scene| {
            for (link_id, members) in registry.iter() {
                let (picked, rest): (Vec<NodeId>, Vec<NodeId>) =
                    members.iter().partition(|node| selected.contains(*node));
                match (picked.as_slice(), rest.len()) {
                    ([], _) => continue,
                    (_, 0) | ([_], _) => {
                        for &group in &picked {
                            clear_links(scene, group);
                        }
                    }
                    _ => {
                        let fresh = generate_link_id();
                        for &group in &picked {
                            set_link_id(scene, group, &fresh);
                            ensure_transform_key(scene, group);
                        }
                        info!(link_id, new_link_id = %fresh, groups = picked.len(), "split link set");
                    }
                }
                if let &[lone] = rest.as_slice() {
                    clear_links(scene, lone);
                }
            }
        });
        Ok(())
    }
}
