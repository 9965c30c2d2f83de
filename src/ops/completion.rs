//! Completion transitions: move a task between the active run and the
//! completed suffix of its group.

use chrono::{DateTime, Utc};

use crate::model::task::Task;
use crate::ops::order::renormalize;

/// Mark a task completed and move it to the end of its group's completed
/// tasks. No-op if the task is missing or already completed.
pub fn complete_task(tasks: Vec<Task>, task_id: &str, now: DateTime<Utc>) -> Vec<Task> {
    let Some(idx) = tasks.iter().position(|t| t.id == task_id && !t.completed) else {
        tracing::debug!(task_id, "complete ignored: no active task with this id");
        return tasks;
    };

    let mut tasks = tasks;
    let mut task = tasks.remove(idx);
    task.completed = true;
    task.completed_at = Some(now);

    let group = task.group_key();
    let last_completed = tasks.iter().rposition(|t| t.in_group(group) && t.completed);
    let last_member = tasks.iter().rposition(|t| t.in_group(group));
    match last_completed.or(last_member) {
        Some(at) => tasks.insert(at + 1, task),
        None => tasks.push(task),
    }
    renormalize(tasks)
}

/// Mark a task active again and put it at the head of its group's active run.
/// No-op if the task is missing or not completed.
pub fn uncomplete_task(tasks: Vec<Task>, task_id: &str) -> Vec<Task> {
    let Some(idx) = tasks.iter().position(|t| t.id == task_id && t.completed) else {
        tracing::debug!(task_id, "uncomplete ignored: no completed task with this id");
        return tasks;
    };

    let mut tasks = tasks;
    let mut task = tasks.remove(idx);
    task.completed = false;
    task.completed_at = None;

    let group = task.group_key();
    let first_active = tasks.iter().position(|t| t.in_group(group) && !t.completed);
    let insert = first_active.or_else(|| next_group_start(&tasks, group));
    match insert {
        Some(at) => tasks.insert(at, task),
        None => tasks.push(task),
    }
    renormalize(tasks)
}

/// Set the completion flag, dispatching to the matching transition.
pub fn set_completed(
    tasks: Vec<Task>,
    task_id: &str,
    completed: bool,
    now: DateTime<Utc>,
) -> Vec<Task> {
    if completed {
        complete_task(tasks, task_id, now)
    } else {
        uncomplete_task(tasks, task_id)
    }
}

/// Index of the first task after `group`'s run that belongs to another group.
/// `None` if the group is last (or absent).
fn next_group_start(tasks: &[Task], group: Option<&str>) -> Option<usize> {
    let first = tasks.iter().position(|t| t.in_group(group))?;
    tasks
        .iter()
        .enumerate()
        .skip(first)
        .find(|(_, t)| !t.in_group(group))
        .map(|(i, _)| i)
}
