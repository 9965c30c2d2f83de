use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::new_id;

/// One dated entry in a task's description log (newest first on the task)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescriptionEntry {
    pub id: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    /// Set when the entry text was changed after creation
    #[serde(default)]
    pub edited_at: Option<DateTime<Utc>>,
}

impl DescriptionEntry {
    pub fn new(text: String, created_at: DateTime<Utc>) -> Self {
        DescriptionEntry {
            id: new_id(),
            text,
            created_at,
            edited_at: None,
        }
    }
}

/// A checklist item owned by a task. Position in `Task::subtasks` is its order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtask {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
}

impl Subtask {
    pub fn new(title: String) -> Self {
        Subtask {
            id: new_id(),
            title,
            completed: false,
        }
    }
}

/// A task on the board.
///
/// Field names serialize in camelCase so collections written by earlier
/// versions of the app load without translation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Stable identifier
    pub id: String,
    pub title: String,
    /// Legacy single-text description, retained for compatibility
    #[serde(default)]
    pub description: String,
    /// Description log, newest first
    #[serde(default)]
    pub description_entries: Vec<DescriptionEntry>,
    /// Owning group; `None` is the "ungrouped" bucket
    #[serde(default)]
    pub group_id: Option<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
    /// Tag ids (each present at most once)
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Position within the task's group: active tasks first, then completed
    #[serde(default)]
    pub order: usize,
}

impl Task {
    /// Create a new active task for `group_id`.
    ///
    /// `order` is the number of active tasks already in that group, which is
    /// where the task lands once appended to the collection.
    pub fn new(
        title: String,
        group_id: Option<String>,
        existing: &[Task],
        created_at: DateTime<Utc>,
    ) -> Self {
        let order = active_count(existing, group_id.as_deref());
        Task {
            id: new_id(),
            title,
            description: String::new(),
            description_entries: Vec::new(),
            group_id,
            completed: false,
            subtasks: Vec::new(),
            tags: Vec::new(),
            created_at,
            completed_at: None,
            order,
        }
    }

    /// The partition key of this task's group (`None` = ungrouped)
    pub fn group_key(&self) -> Option<&str> {
        self.group_id.as_deref()
    }

    /// Whether this task belongs to the given group (`None` = ungrouped)
    pub fn in_group(&self, group: Option<&str>) -> bool {
        self.group_key() == group
    }
}

/// Number of active tasks in `group` (`None` = ungrouped)
pub fn active_count(tasks: &[Task], group: Option<&str>) -> usize {
    tasks
        .iter()
        .filter(|t| t.in_group(group) && !t.completed)
        .count()
}

/// Find a task by id
pub fn find_task<'a>(tasks: &'a [Task], task_id: &str) -> Option<&'a Task> {
    tasks.iter().find(|t| t.id == task_id)
}

/// Find a task by id, mutable
pub fn find_task_mut<'a>(tasks: &'a mut [Task], task_id: &str) -> Option<&'a mut Task> {
    tasks.iter_mut().find(|t| t.id == task_id)
}
