use chrono::{DateTime, Utc};

use crate::model::group::Group;
use crate::model::task::Task;
use crate::ops::move_ops::splice_move;
use crate::ops::order::renormalize_in_place;

/// Append a group. Returns its id.
pub fn add_group(groups: &mut Vec<Group>, name: String, now: DateTime<Utc>) -> String {
    let group = Group::new(name, now);
    let id = group.id.clone();
    groups.push(group);
    id
}

pub fn rename_group(groups: &mut [Group], group_id: &str, name: String) -> bool {
    match groups.iter_mut().find(|g| g.id == group_id) {
        Some(group) => {
            group.name = name;
            true
        }
        None => false,
    }
}

/// Delete a group. Its tasks become ungrouped and join the ungrouped
/// partition, so the collection is renormalized.
pub fn delete_group(groups: &mut Vec<Group>, tasks: &mut Vec<Task>, group_id: &str) -> bool {
    let Some(idx) = groups.iter().position(|g| g.id == group_id) else {
        return false;
    };
    groups.remove(idx);

    let mut orphaned = 0;
    for task in tasks.iter_mut().filter(|t| t.in_group(Some(group_id))) {
        task.group_id = None;
        orphaned += 1;
    }
    if orphaned > 0 {
        renormalize_in_place(tasks);
    }
    true
}

/// Reorder groups by splicing.
pub fn move_group(groups: &mut Vec<Group>, source_index: usize, dest_index: usize) -> bool {
    splice_move(groups, source_index, dest_index)
}

/// Position of a group in the board's group list
pub fn group_position(groups: &[Group], group_id: &str) -> Option<usize> {
    groups.iter().position(|g| g.id == group_id)
}
