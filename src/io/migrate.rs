//! Load-time migration of stored collections into the current model.
//!
//! Stored data is never rejected. Every field is read on its own: a missing
//! or mistyped field gets its default and the rest of the record is kept.
//! Only values that are not records at all (a number where an object should
//! be, or a collection that is not an array) are handed back as unreadable so
//! the caller can set them aside.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::io::storage::Collection;
use crate::model::group::{Group, GroupSlot};
use crate::model::new_id;
use crate::model::note::{DEFAULT_NOTE_TITLE, Note};
use crate::model::tag::{Tag, TagColor};
use crate::model::task::{DescriptionEntry, Subtask, Task};
use crate::ops::order::renormalize;

/// Records migrated from one stored collection.
#[derive(Debug)]
pub struct Migrated<T> {
    pub records: Vec<T>,
    /// Stored values that could not be read as records
    pub unreadable: Vec<Value>,
}

/// Lenient view of a stored record. Every accessor returns `None` for a
/// field that is missing or holds the wrong type.
#[derive(Clone, Copy)]
struct Fields<'a>(&'a Map<String, Value>);

impl<'a> Fields<'a> {
    fn text(&self, key: &str) -> Option<String> {
        self.0.get(key)?.as_str().map(str::to_string)
    }

    fn flag(&self, key: &str) -> Option<bool> {
        self.0.get(key)?.as_bool()
    }

    fn number(&self, key: &str) -> Option<f64> {
        self.0.get(key)?.as_f64().filter(|n| n.is_finite())
    }

    fn time(&self, key: &str) -> Option<DateTime<Utc>> {
        self.0.get(key)?.as_str()?.parse().ok()
    }

    /// String elements of an array field; other elements are dropped.
    fn strings(&self, key: &str) -> Option<Vec<String>> {
        let items = self.0.get(key)?.as_array()?;
        Some(items.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
    }

    /// Object elements of an array field; other elements are dropped.
    fn records(&self, key: &str) -> Option<Vec<Fields<'a>>> {
        let items = self.0.get(key)?.as_array()?;
        Some(items.iter().filter_map(|v| v.as_object().map(Fields)).collect())
    }
}

/// Split a stored collection into its object records and everything else.
fn split(collection: Collection, value: Option<Value>) -> (Vec<Map<String, Value>>, Vec<Value>) {
    let items = match value {
        None | Some(Value::Null) => return (Vec::new(), Vec::new()),
        Some(Value::Array(items)) => items,
        Some(other) => {
            tracing::warn!(%collection, kind = value_kind(&other), "stored collection is not an array");
            return (Vec::new(), vec![other]);
        }
    };
    let mut objects = Vec::with_capacity(items.len());
    let mut unreadable = Vec::new();
    for (index, item) in items.into_iter().enumerate() {
        match item {
            Value::Object(map) => objects.push(map),
            other => {
                tracing::warn!(%collection, index, kind = value_kind(&other), "stored record is not an object");
                unreadable.push(other);
            }
        }
    }
    (objects, unreadable)
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn migrate_each<T>(
    collection: Collection,
    value: Option<Value>,
    mut convert: impl FnMut(Fields<'_>) -> T,
) -> Migrated<T> {
    let (objects, unreadable) = split(collection, value);
    let records = objects.iter().map(|map| convert(Fields(map))).collect();
    Migrated { records, unreadable }
}

pub fn migrate_groups(value: Option<Value>, now: DateTime<Utc>) -> Migrated<Group> {
    migrate_each(Collection::Groups, value, |f| Group {
        id: f.text("id").unwrap_or_else(new_id),
        name: f.text("name").unwrap_or_default(),
        created_at: f.time("createdAt").unwrap_or(now),
    })
}

/// Colours outside the palette, or not strings at all, become the default.
pub fn migrate_tags(value: Option<Value>) -> Migrated<Tag> {
    migrate_each(Collection::Tags, value, |f| Tag {
        id: f.text("id").unwrap_or_else(new_id),
        name: f.text("name").unwrap_or_default(),
        color: f.text("color").map(TagColor::from).unwrap_or_default(),
    })
}

pub fn migrate_notes(value: Option<Value>, now: DateTime<Utc>) -> Migrated<Note> {
    migrate_each(Collection::Notes, value, |f| Note {
        id: f.text("id").unwrap_or_else(new_id),
        title: f
            .text("title")
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_NOTE_TITLE.to_string()),
        content: f.text("content").unwrap_or_default(),
        created_at: f.time("createdAt").unwrap_or(now),
    })
}

/// Fill task defaults. Returns the task and the order value it was stored with.
fn task_from(f: Fields<'_>, now: DateTime<Utc>) -> (Task, Option<f64>) {
    let created_at = f.time("createdAt").unwrap_or(now);
    let description = f.text("description").unwrap_or_default();
    let description_entries = match f.records("descriptionEntries") {
        Some(entries) => entries
            .into_iter()
            .map(|e| DescriptionEntry {
                id: e.text("id").unwrap_or_else(new_id),
                text: e.text("text").unwrap_or_default(),
                created_at: e.time("createdAt").unwrap_or(created_at),
                edited_at: e.time("editedAt"),
            })
            .collect(),
        None if !description.is_empty() => {
            vec![DescriptionEntry::new(description.clone(), created_at)]
        }
        None => Vec::new(),
    };
    let subtasks = f
        .records("subtasks")
        .unwrap_or_default()
        .into_iter()
        .map(|s| Subtask {
            id: s.text("id").unwrap_or_else(new_id),
            title: s.text("title").unwrap_or_default(),
            completed: s.flag("completed").unwrap_or(false),
        })
        .collect();
    let mut tags: Vec<String> = Vec::new();
    for tag in f.strings("tags").unwrap_or_default() {
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    let group_id = GroupSlot::from(f.text("groupId")).group_id().map(str::to_string);
    let completed = f.flag("completed").unwrap_or(false);

    let task = Task {
        id: f.text("id").unwrap_or_else(new_id),
        title: f.text("title").unwrap_or_default(),
        description,
        description_entries,
        group_id,
        completed,
        subtasks,
        tags,
        created_at,
        completed_at: if completed { f.time("completedAt") } else { None },
        order: 0,
    };
    (task, f.number("order"))
}

/// Load the live task collection.
///
/// Records are migrated, then laid out by group (first appearance), active
/// before completed, then by the order they were stored with, and finally
/// renormalized. Tasks without a stored order keep their relative position
/// after the ordered ones of their run.
pub fn migrate_tasks(value: Option<Value>, now: DateTime<Utc>) -> Migrated<Task> {
    let Migrated { records: mut tasks, unreadable } =
        migrate_each(Collection::Tasks, value, |f| task_from(f, now));

    let mut first_seen: HashMap<Option<String>, usize> = HashMap::new();
    for (task, _) in &tasks {
        let next = first_seen.len();
        first_seen.entry(task.group_id.clone()).or_insert(next);
    }
    let rank = |task: &Task| first_seen.get(&task.group_id).copied().unwrap_or(0);
    tasks.sort_by(|(a, oa), (b, ob)| {
        rank(a)
            .cmp(&rank(b))
            .then(a.completed.cmp(&b.completed))
            .then_with(|| match (oa, ob) {
                (Some(x), Some(y)) => x.total_cmp(y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            })
    });

    let count = tasks.len();
    let records = renormalize(tasks.into_iter().map(|(task, _)| task).collect());
    tracing::info!(count, unreadable = unreadable.len(), "tasks loaded");
    Migrated { records, unreadable }
}

/// Load archived tasks. Stored order values are kept as they were.
pub fn migrate_archived(value: Option<Value>, now: DateTime<Utc>) -> Migrated<Task> {
    let migrated = migrate_each(Collection::ArchivedTasks, value, |f| task_from(f, now));
    Migrated {
        records: migrated
            .records
            .into_iter()
            .map(|(mut task, order)| {
                task.order = order.map_or(0, |o| o.max(0.0) as usize);
                task
            })
            .collect(),
        unreadable: migrated.unreadable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::order::check_order;
    use crate::ops::test_support::{group_view, ids};
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap()
    }

    fn tasks(value: Value) -> Vec<Task> {
        migrate_tasks(Some(value), now()).records
    }

    #[test]
    fn test_legacy_description_becomes_entry() {
        let value = json!([{
            "id": "a",
            "title": "Old",
            "description": "from v1",
            "groupId": null,
            "completed": false,
            "createdAt": "2024-01-02T03:04:05Z",
            "order": 0
        }]);
        let tasks = tasks(value);
        let task = &tasks[0];
        assert_eq!(task.description, "from v1");
        assert_eq!(task.description_entries.len(), 1);
        assert_eq!(task.description_entries[0].text, "from v1");
        assert_eq!(task.description_entries[0].created_at, task.created_at);
        assert_eq!(task.description_entries[0].edited_at, None);
        assert!(task.subtasks.is_empty());
        assert!(task.tags.is_empty());
    }

    #[test]
    fn test_existing_entries_are_kept() {
        let value = json!([{
            "id": "a",
            "title": "New",
            "description": "legacy",
            "descriptionEntries": [],
            "createdAt": "2024-01-02T03:04:05Z"
        }]);
        assert!(tasks(value)[0].description_entries.is_empty());
    }

    #[test]
    fn test_missing_fields_get_defaults() {
        let tasks = tasks(json!([{"title": "bare"}]));
        assert_eq!(tasks.len(), 1);
        assert!(!tasks[0].id.is_empty());
        assert_eq!(tasks[0].created_at, now());
        assert_eq!(tasks[0].group_id, None);
    }

    #[test]
    fn test_mistyped_fields_fall_back_per_field() {
        let value = json!([
            {"id": "a", "title": "clean", "groupId": "g1", "order": 0},
            {"id": "b", "title": "text order", "groupId": "g1", "order": "1"},
            {"id": "c", "title": "null tag", "groupId": "g1", "tags": [null, "t1", 7, "t1"]},
            {"id": "d", "title": "js date", "groupId": "g1", "createdAt": "Tue Jan 02 2024"},
            {"id": "e", "title": 5, "completed": "yes", "subtasks": [{"title": "s"}, 3]}
        ]);
        let migrated = migrate_tasks(Some(value), now());
        assert!(migrated.unreadable.is_empty());
        let tasks = migrated.records;
        assert_eq!(ids(&tasks), vec!["a", "b", "c", "d", "e"]);
        assert!(check_order(&tasks).is_empty());

        let find = |id: &str| tasks.iter().find(|t| t.id == id).unwrap();
        assert_eq!(find("b").title, "text order");
        assert_eq!(find("c").tags, vec!["t1".to_string()]);
        assert_eq!(find("d").created_at, now());
        assert_eq!(find("e").title, "");
        assert!(!find("e").completed);
        assert_eq!(find("e").subtasks.len(), 1);
        assert_eq!(find("e").subtasks[0].title, "s");
    }

    #[test]
    fn test_non_object_records_are_handed_back() {
        let value = json!([{"id": "ok", "title": "fine"}, 42, "stray"]);
        let migrated = migrate_tasks(Some(value), now());
        assert_eq!(ids(&migrated.records), vec!["ok"]);
        assert_eq!(migrated.unreadable, vec![json!(42), json!("stray")]);
    }

    #[test]
    fn test_non_array_collection_is_unreadable() {
        let migrated = migrate_tasks(Some(json!({"tasks": []})), now());
        assert!(migrated.records.is_empty());
        assert_eq!(migrated.unreadable, vec![json!({"tasks": []})]);

        let missing = migrate_tasks(None, now());
        assert!(missing.records.is_empty() && missing.unreadable.is_empty());
        assert_eq!(migrate_groups(Some(json!("x")), now()).unreadable, vec![json!("x")]);
    }

    #[test]
    fn test_group_without_created_at_is_kept() {
        let value = json!([{"id": "g1", "name": "Work"}, {"id": "g2", "name": 9, "createdAt": 0}]);
        let groups = migrate_groups(Some(value), now()).records;
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].name, "Work");
        assert_eq!(groups[0].created_at, now());
        assert_eq!(groups[1].id, "g2");
        assert_eq!(groups[1].name, "");
    }

    #[test]
    fn test_note_defaults() {
        let value = json!([
            {"id": "n1", "title": "t", "content": "x"},
            {"id": "n2", "content": "untitled"},
            {"id": "n3", "title": "  ", "content": null}
        ]);
        let notes = migrate_notes(Some(value), now()).records;
        assert_eq!(notes.len(), 3);
        assert_eq!(notes[0].created_at, now());
        assert_eq!(notes[0].content, "x");
        assert_eq!(notes[1].title, DEFAULT_NOTE_TITLE);
        assert_eq!(notes[2].title, DEFAULT_NOTE_TITLE);
        assert_eq!(notes[2].content, "");
    }

    #[test]
    fn test_tag_colour_defaults() {
        let value = json!([
            {"id": "t1", "name": "red", "color": "#EF4444"},
            {"id": "t2", "name": "odd", "color": 12}
        ]);
        let tags = migrate_tags(Some(value)).records;
        assert_eq!(tags[0].color, TagColor::Red);
        assert_eq!(tags[1].color, TagColor::default());
    }

    #[test]
    fn test_layout_follows_stored_order() {
        let value = json!([
            {"id": "c", "groupId": "g1", "completed": true, "order": 2},
            {"id": "b", "groupId": "g1", "order": 1},
            {"id": "x", "groupId": "g2", "order": 0},
            {"id": "a", "groupId": "g1", "order": 0},
            {"id": "u", "groupId": "ungrouped", "order": 0}
        ]);
        let tasks = tasks(value);
        assert!(check_order(&tasks).is_empty());
        assert_eq!(group_view(&tasks, Some("g1")), vec![("a", 0), ("b", 1), ("c", 2)]);
        assert_eq!(group_view(&tasks, None), vec![("u", 0)]);
    }

    #[test]
    fn test_archived_keep_stored_order() {
        let value = json!([{"id": "z", "completed": true, "order": 4}]);
        let archived = migrate_archived(Some(value), now()).records;
        assert_eq!(archived[0].order, 4);
        assert!(archived[0].completed);
    }
}
