//! Drag-and-drop resolution: turn a board gesture into a new task collection.

use crate::model::group::GroupSlot;
use crate::model::task::Task;
use crate::ops::order::renormalize;

/// One end of a drag gesture as the board reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropLocation {
    /// Group id of the column, or `"ungrouped"`
    pub droppable_id: String,
    /// Index within the column's rendered list (active tasks, then completed)
    pub index: usize,
}

/// Raw drag-end event from the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragEnd {
    pub draggable_id: String,
    pub source: DropLocation,
    /// `None` when the task was dropped outside any column
    pub destination: Option<DropLocation>,
}

impl DragEnd {
    /// Turn the event into a move, or `None` if nothing should happen:
    /// no destination, or dropped back onto its own position.
    pub fn resolve(&self) -> Option<DragMove> {
        let dest = self.destination.as_ref()?;
        if dest.droppable_id == self.source.droppable_id && dest.index == self.source.index {
            return None;
        }
        Some(DragMove {
            task_id: self.draggable_id.clone(),
            source: GroupSlot::from_droppable_id(&self.source.droppable_id),
            source_index: self.source.index,
            dest: GroupSlot::from_droppable_id(&dest.droppable_id),
            dest_index: dest.index,
        })
    }
}

/// A resolved task move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragMove {
    pub task_id: String,
    pub source: GroupSlot,
    pub source_index: usize,
    pub dest: GroupSlot,
    pub dest_index: usize,
}

/// Move a task to `mv.dest` at `mv.dest_index`.
///
/// `dest_index` is measured in the destination column after the dragged task
/// has been taken out. A completed task is placed among the completed suffix
/// (`dest_index` minus the column's active count, clamped); an active task is
/// placed in the active run. The completion flag never changes. Unknown task
/// ids leave the collection untouched.
pub fn move_task(tasks: Vec<Task>, mv: &DragMove) -> Vec<Task> {
    let Some(idx) = tasks.iter().position(|t| t.id == mv.task_id) else {
        tracing::debug!(task_id = %mv.task_id, "move ignored: task not found");
        return tasks;
    };

    let mut tasks = tasks;
    let mut task = tasks.remove(idx);
    task.group_id = mv.dest.group_id().map(str::to_string);

    let group = task.group_id.as_deref();
    let insert = if task.completed {
        completed_insert_point(&tasks, group, mv.dest_index)
    } else {
        active_insert_point(&tasks, group, mv.dest_index)
    };

    match insert {
        Some(at) => tasks.insert(at, task),
        None => tasks.push(task),
    }
    renormalize(tasks)
}

/// Reorder within one column. Same as a move whose source and destination match.
pub fn reorder_task(tasks: Vec<Task>, task_id: &str, dest_index: usize) -> Vec<Task> {
    let Some(task) = tasks.iter().find(|t| t.id == task_id) else {
        return tasks;
    };
    let slot = GroupSlot::from(task.group_id.clone());
    let mv = DragMove {
        task_id: task_id.to_string(),
        source: slot.clone(),
        source_index: task.order,
        dest: slot,
        dest_index,
    };
    move_task(tasks, &mv)
}

/// Where an active task goes. `None` means the group is empty: append.
fn active_insert_point(tasks: &[Task], group: Option<&str>, dest_index: usize) -> Option<usize> {
    let first_member = tasks.iter().position(|t| t.in_group(group))?;
    let active: Vec<usize> = positions(tasks, group, false);

    if dest_index == 0 {
        return Some(active.first().copied().unwrap_or(first_member));
    }
    if let Some(&nth) = active.get(dest_index - 1) {
        return Some(nth + 1);
    }
    // Past the end of the active run: land just before the completed suffix.
    match active.last() {
        Some(&last) => Some(last + 1),
        None => Some(first_member),
    }
}

/// Where a completed task goes. `None` means the group is empty: append.
fn completed_insert_point(
    tasks: &[Task],
    group: Option<&str>,
    dest_index: usize,
) -> Option<usize> {
    let last_member = tasks.iter().rposition(|t| t.in_group(group))?;
    let active_count = positions(tasks, group, false).len();
    let completed = positions(tasks, group, true);

    let Some(&last_completed) = completed.last() else {
        // No completed tasks yet: right after the active run.
        return Some(last_member + 1);
    };
    let rel = dest_index.saturating_sub(active_count);
    match completed.get(rel) {
        Some(&at) => Some(at),
        None => Some(last_completed + 1),
    }
}

fn positions(tasks: &[Task], group: Option<&str>, completed: bool) -> Vec<usize> {
    tasks
        .iter()
        .enumerate()
        .filter(|(_, t)| t.in_group(group) && t.completed == completed)
        .map(|(i, _)| i)
        .collect()
}

/// Splice-move an element of a positional list (groups, subtasks).
/// Out-of-range indices leave the list untouched. Returns whether it moved.
pub fn splice_move<T>(items: &mut Vec<T>, source_index: usize, dest_index: usize) -> bool {
    if source_index >= items.len() || dest_index >= items.len() {
        return false;
    }
    if source_index == dest_index {
        return false;
    }
    let item = items.remove(source_index);
    items.insert(dest_index, item);
    true
}
