use chrono::{DateTime, Utc};

use crate::model::task::{DescriptionEntry, Subtask, Task, find_task_mut};
use crate::ops::move_ops::splice_move;
use crate::ops::order::renormalize_in_place;

// ---------------------------------------------------------------------------
// Task CRUD
// ---------------------------------------------------------------------------

/// Append a new active task to `group_id` and renormalize.
/// Returns the new task's id.
pub fn add_task(
    tasks: &mut Vec<Task>,
    title: String,
    group_id: Option<String>,
    now: DateTime<Utc>,
) -> String {
    let task = Task::new(title, group_id, tasks, now);
    let id = task.id.clone();
    tasks.push(task);
    renormalize_in_place(tasks);
    id
}

/// Insert an already-built task (note conversion, archive restore) at the
/// end of its group's active run.
pub fn insert_active_task(tasks: &mut Vec<Task>, mut task: Task) {
    task.completed = false;
    task.completed_at = None;
    let group = task.group_id.clone();
    let group = group.as_deref();
    let after_active = tasks
        .iter()
        .rposition(|t| t.in_group(group) && !t.completed)
        .map(|i| i + 1);
    let head = tasks.iter().position(|t| t.in_group(group));
    match after_active.or(head) {
        Some(at) => tasks.insert(at, task),
        None => tasks.push(task),
    }
    renormalize_in_place(tasks);
}

pub fn edit_title(tasks: &mut [Task], task_id: &str, title: String) -> bool {
    match find_task_mut(tasks, task_id) {
        Some(task) => {
            task.title = title;
            true
        }
        None => false,
    }
}

/// Remove a task. Returns the removed task, if it existed.
pub fn delete_task(tasks: &mut Vec<Task>, task_id: &str) -> Option<Task> {
    let idx = tasks.iter().position(|t| t.id == task_id)?;
    let task = tasks.remove(idx);
    renormalize_in_place(tasks);
    Some(task)
}

// ---------------------------------------------------------------------------
// Description entries
// ---------------------------------------------------------------------------

/// Prepend a description entry (newest first). Returns the entry id.
pub fn add_description_entry(
    tasks: &mut [Task],
    task_id: &str,
    text: String,
    now: DateTime<Utc>,
) -> Option<String> {
    let task = find_task_mut(tasks, task_id)?;
    let entry = DescriptionEntry::new(text, now);
    let id = entry.id.clone();
    task.description_entries.insert(0, entry);
    Some(id)
}

pub fn edit_description_entry(
    tasks: &mut [Task],
    task_id: &str,
    entry_id: &str,
    text: String,
    now: DateTime<Utc>,
) -> bool {
    let Some(entry) = find_task_mut(tasks, task_id)
        .and_then(|t| t.description_entries.iter_mut().find(|e| e.id == entry_id))
    else {
        return false;
    };
    if entry.text != text {
        entry.text = text;
        entry.edited_at = Some(now);
    }
    true
}

pub fn delete_description_entry(tasks: &mut [Task], task_id: &str, entry_id: &str) -> bool {
    let Some(task) = find_task_mut(tasks, task_id) else {
        return false;
    };
    let before = task.description_entries.len();
    task.description_entries.retain(|e| e.id != entry_id);
    task.description_entries.len() != before
}

// ---------------------------------------------------------------------------
// Subtasks
// ---------------------------------------------------------------------------

pub fn add_subtask(tasks: &mut [Task], task_id: &str, title: String) -> Option<String> {
    let task = find_task_mut(tasks, task_id)?;
    let subtask = Subtask::new(title);
    let id = subtask.id.clone();
    task.subtasks.push(subtask);
    Some(id)
}

pub fn rename_subtask(tasks: &mut [Task], task_id: &str, subtask_id: &str, title: String) -> bool {
    match find_subtask_mut(tasks, task_id, subtask_id) {
        Some(sub) => {
            sub.title = title;
            true
        }
        None => false,
    }
}

pub fn set_subtask_completed(
    tasks: &mut [Task],
    task_id: &str,
    subtask_id: &str,
    completed: bool,
) -> bool {
    match find_subtask_mut(tasks, task_id, subtask_id) {
        Some(sub) => {
            sub.completed = completed;
            true
        }
        None => false,
    }
}

pub fn delete_subtask(tasks: &mut [Task], task_id: &str, subtask_id: &str) -> bool {
    let Some(task) = find_task_mut(tasks, task_id) else {
        return false;
    };
    let before = task.subtasks.len();
    task.subtasks.retain(|s| s.id != subtask_id);
    task.subtasks.len() != before
}

/// Reorder a task's subtasks by splicing.
pub fn move_subtask(
    tasks: &mut [Task],
    task_id: &str,
    source_index: usize,
    dest_index: usize,
) -> bool {
    match find_task_mut(tasks, task_id) {
        Some(task) => splice_move(&mut task.subtasks, source_index, dest_index),
        None => false,
    }
}

fn find_subtask_mut<'a>(
    tasks: &'a mut [Task],
    task_id: &str,
    subtask_id: &str,
) -> Option<&'a mut Subtask> {
    find_task_mut(tasks, task_id)?
        .subtasks
        .iter_mut()
        .find(|s| s.id == subtask_id)
}

// ---------------------------------------------------------------------------
// Archive
// ---------------------------------------------------------------------------

/// Move every completed task into `archived`. Returns how many moved.
pub fn archive_completed(tasks: &mut Vec<Task>, archived: &mut Vec<Task>) -> usize {
    let (done, remaining): (Vec<Task>, Vec<Task>) =
        std::mem::take(tasks).into_iter().partition(|t| t.completed);
    let count = done.len();
    archived.extend(done);
    *tasks = remaining;
    renormalize_in_place(tasks);
    count
}

/// Bring an archived task back as an active task. `group_exists` decides
/// whether its old group is still around; if not it becomes ungrouped.
pub fn restore_archived(
    archived: &mut Vec<Task>,
    tasks: &mut Vec<Task>,
    task_id: &str,
    group_exists: impl Fn(&str) -> bool,
) -> bool {
    let Some(idx) = archived.iter().position(|t| t.id == task_id) else {
        return false;
    };
    let mut task = archived.remove(idx);
    let orphaned = task.group_id.as_deref().is_some_and(|g| !group_exists(g));
    if orphaned {
        task.group_id = None;
    }
    insert_active_task(tasks, task);
    true
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::find_task;
    use crate::ops::test_support::{group_view, ids, normalized_board};
    use pretty_assertions::assert_eq;

    fn sample() -> Vec<Task> {
        normalized_board(&[
            ("A", Some("g1"), false),
            ("B", Some("g1"), false),
            ("D", Some("g1"), true),
            ("X", Some("g2"), false),
        ])
    }

    // --- CRUD ---

    #[test]
    fn test_add_task_lands_at_end_of_active_run() {
        let mut tasks = sample();
        let id = add_task(&mut tasks, "New".into(), Some("g1".into()), Utc::now());
        let view = group_view(&tasks, Some("g1"));
        assert_eq!(view[2], (id.as_str(), 2));
        assert_eq!(view[3], ("D", 3));
    }

    #[test]
    fn test_add_task_ungrouped() {
        let mut tasks = sample();
        let id = add_task(&mut tasks, "Loose".into(), None, Utc::now());
        let task = find_task(&tasks, &id).unwrap();
        assert_eq!(task.group_id, None);
        assert_eq!(task.order, 0);
    }

    #[test]
    fn test_edit_title() {
        let mut tasks = sample();
        assert!(edit_title(&mut tasks, "A", "Renamed".into()));
        assert_eq!(find_task(&tasks, "A").unwrap().title, "Renamed");
        assert!(!edit_title(&mut tasks, "nope", "x".into()));
    }

    #[test]
    fn test_delete_task_renormalizes() {
        let mut tasks = sample();
        let removed = delete_task(&mut tasks, "A").unwrap();
        assert_eq!(removed.id, "A");
        assert_eq!(group_view(&tasks, Some("g1")), vec![("B", 0), ("D", 1)]);
        assert!(delete_task(&mut tasks, "A").is_none());
    }

    // --- Description entries ---

    #[test]
    fn test_description_entries_newest_first() {
        let mut tasks = sample();
        let first = add_description_entry(&mut tasks, "A", "one".into(), Utc::now()).unwrap();
        let second = add_description_entry(&mut tasks, "A", "two".into(), Utc::now()).unwrap();
        let entries = &find_task(&tasks, "A").unwrap().description_entries;
        assert_eq!(entries[0].id, second);
        assert_eq!(entries[1].id, first);
        assert!(add_description_entry(&mut tasks, "nope", "x".into(), Utc::now()).is_none());
    }

    #[test]
    fn test_edit_description_entry_sets_edited_at() {
        let mut tasks = sample();
        let id = add_description_entry(&mut tasks, "A", "one".into(), Utc::now()).unwrap();
        assert!(edit_description_entry(&mut tasks, "A", &id, "uno".into(), Utc::now()));
        let entry = &find_task(&tasks, "A").unwrap().description_entries[0];
        assert_eq!(entry.text, "uno");
        assert!(entry.edited_at.is_some());
        assert!(!edit_description_entry(&mut tasks, "A", "missing", "x".into(), Utc::now()));
    }

    #[test]
    fn test_delete_description_entry() {
        let mut tasks = sample();
        let id = add_description_entry(&mut tasks, "A", "one".into(), Utc::now()).unwrap();
        assert!(delete_description_entry(&mut tasks, "A", &id));
        assert!(!delete_description_entry(&mut tasks, "A", &id));
    }

    #[test]
    fn test_description_edits_do_not_touch_order() {
        let mut tasks = sample();
        let before = tasks.clone();
        add_description_entry(&mut tasks, "B", "note".into(), Utc::now());
        assert_eq!(ids(&tasks), ids(&before));
    }

    // --- Subtasks ---

    #[test]
    fn test_subtask_lifecycle() {
        let mut tasks = sample();
        let s1 = add_subtask(&mut tasks, "A", "first".into()).unwrap();
        let s2 = add_subtask(&mut tasks, "A", "second".into()).unwrap();
        assert!(rename_subtask(&mut tasks, "A", &s1, "First!".into()));
        assert!(set_subtask_completed(&mut tasks, "A", &s2, true));

        let subs = &find_task(&tasks, "A").unwrap().subtasks;
        assert_eq!(subs[0].title, "First!");
        assert!(subs[1].completed);

        assert!(move_subtask(&mut tasks, "A", 1, 0));
        assert_eq!(find_task(&tasks, "A").unwrap().subtasks[0].id, s2);

        assert!(delete_subtask(&mut tasks, "A", &s1));
        assert_eq!(find_task(&tasks, "A").unwrap().subtasks.len(), 1);
        assert!(!delete_subtask(&mut tasks, "A", &s1));
    }

    #[test]
    fn test_subtask_ops_on_missing_task() {
        let mut tasks = sample();
        assert!(add_subtask(&mut tasks, "nope", "x".into()).is_none());
        assert!(!move_subtask(&mut tasks, "nope", 0, 1));
        assert!(!set_subtask_completed(&mut tasks, "A", "nope", true));
    }

    // --- Archive ---

    #[test]
    fn test_archive_completed() {
        let mut tasks = sample();
        let mut archived = Vec::new();
        assert_eq!(archive_completed(&mut tasks, &mut archived), 1);
        assert_eq!(ids(&tasks), vec!["A", "B", "X"]);
        assert_eq!(ids(&archived), vec!["D"]);
    }

    #[test]
    fn test_restore_archived_to_end_of_active_run() {
        let mut tasks = sample();
        let mut archived = Vec::new();
        archive_completed(&mut tasks, &mut archived);

        assert!(restore_archived(&mut archived, &mut tasks, "D", |g| g == "g1"));
        assert!(archived.is_empty());
        assert_eq!(group_view(&tasks, Some("g1")), vec![("A", 0), ("B", 1), ("D", 2)]);
        let d = find_task(&tasks, "D").unwrap();
        assert!(!d.completed);
        assert!(d.completed_at.is_none());
    }

    #[test]
    fn test_restore_archived_with_deleted_group() {
        let mut tasks = sample();
        let mut archived = Vec::new();
        archive_completed(&mut tasks, &mut archived);

        assert!(restore_archived(&mut archived, &mut tasks, "D", |_| false));
        assert_eq!(find_task(&tasks, "D").unwrap().group_id, None);
        assert!(!restore_archived(&mut archived, &mut tasks, "D", |_| true));
    }
}
