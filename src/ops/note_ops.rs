use chrono::{DateTime, Utc};

use crate::model::note::Note;
use crate::model::task::{DescriptionEntry, Task};
use crate::ops::task_ops::insert_active_task;

/// Title given to tasks converted from an untitled note
pub const DEFAULT_TASK_TITLE: &str = "New task";

pub fn add_note(notes: &mut Vec<Note>, title: String, content: String, now: DateTime<Utc>) -> String {
    let note = Note::new(title, content, now);
    let id = note.id.clone();
    notes.push(note);
    id
}

/// Update a note. An empty or missing title keeps the current one;
/// `None` content keeps the current content.
pub fn update_note(
    notes: &mut [Note],
    note_id: &str,
    title: Option<String>,
    content: Option<String>,
) -> bool {
    let Some(note) = notes.iter_mut().find(|n| n.id == note_id) else {
        return false;
    };
    if let Some(title) = title.filter(|t| !t.trim().is_empty()) {
        note.title = title;
    }
    if let Some(content) = content {
        note.content = content;
    }
    true
}

pub fn delete_note(notes: &mut Vec<Note>, note_id: &str) -> Option<Note> {
    let idx = notes.iter().position(|n| n.id == note_id)?;
    Some(notes.remove(idx))
}

/// Turn a note into an active task at the end of `group_id`'s active run.
/// The note's content becomes the task's first description entry and the
/// note is removed. Returns the new task id.
pub fn convert_note_to_task(
    notes: &mut Vec<Note>,
    tasks: &mut Vec<Task>,
    note_id: &str,
    group_id: Option<String>,
    now: DateTime<Utc>,
) -> Option<String> {
    let note = delete_note(notes, note_id)?;

    let title = if note.title.trim().is_empty() {
        DEFAULT_TASK_TITLE.to_string()
    } else {
        note.title
    };
    let mut task = Task::new(title, group_id, tasks, now);
    if !note.content.is_empty() {
        task.description_entries
            .push(DescriptionEntry::new(note.content.clone(), now));
    }
    task.description = note.content;

    let id = task.id.clone();
    insert_active_task(tasks, task);
    Some(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::note::DEFAULT_NOTE_TITLE;
    use crate::model::task::find_task;
    use crate::ops::test_support::{group_view, normalized_board};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_add_note_default_title() {
        let mut notes = Vec::new();
        add_note(&mut notes, "  ".into(), String::new(), Utc::now());
        assert_eq!(notes[0].title, DEFAULT_NOTE_TITLE);
    }

    #[test]
    fn test_update_note_keeps_title_when_empty() {
        let mut notes = Vec::new();
        let id = add_note(&mut notes, "Ideas".into(), "a".into(), Utc::now());
        assert!(update_note(&mut notes, &id, Some(String::new()), Some("b".into())));
        assert_eq!(notes[0].title, "Ideas");
        assert_eq!(notes[0].content, "b");
        assert!(!update_note(&mut notes, "nope", None, None));
    }

    #[test]
    fn test_convert_note_to_task() {
        let mut notes = Vec::new();
        let note_id = add_note(&mut notes, "Call bank".into(), "before 5pm".into(), Utc::now());
        let mut tasks = normalized_board(&[("A", Some("g1"), false), ("D", Some("g1"), true)]);

        let task_id =
            convert_note_to_task(&mut notes, &mut tasks, &note_id, Some("g1".into()), Utc::now())
                .unwrap();

        assert!(notes.is_empty());
        let task = find_task(&tasks, &task_id).unwrap();
        assert_eq!(task.title, "Call bank");
        assert_eq!(task.description, "before 5pm");
        assert_eq!(task.description_entries.len(), 1);
        assert_eq!(task.description_entries[0].text, "before 5pm");
        assert_eq!(
            group_view(&tasks, Some("g1")),
            vec![("A", 0), (task_id.as_str(), 1), ("D", 2)]
        );
    }

    #[test]
    fn test_convert_empty_note_has_no_entries() {
        let mut notes = vec![Note {
            id: "n1".into(),
            title: String::new(),
            content: String::new(),
            created_at: Utc::now(),
        }];
        let mut tasks = Vec::new();
        let id = convert_note_to_task(&mut notes, &mut tasks, "n1", None, Utc::now()).unwrap();
        let task = find_task(&tasks, &id).unwrap();
        assert_eq!(task.title, DEFAULT_TASK_TITLE);
        assert!(task.description_entries.is_empty());
    }

    #[test]
    fn test_convert_missing_note_is_noop() {
        let mut notes = Vec::new();
        let mut tasks = normalized_board(&[("A", None, false)]);
        assert!(convert_note_to_task(&mut notes, &mut tasks, "nope", None, Utc::now()).is_none());
        assert_eq!(tasks.len(), 1);
    }
}
