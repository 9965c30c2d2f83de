use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::new_id;

/// Title given to notes created without one
pub const DEFAULT_NOTE_TITLE: &str = "New note";

/// A free-form note. Can be converted into a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Note {
    pub fn new(title: String, content: String, created_at: DateTime<Utc>) -> Self {
        let title = if title.trim().is_empty() {
            DEFAULT_NOTE_TITLE.to_string()
        } else {
            title
        };
        Note {
            id: new_id(),
            title,
            content,
            created_at,
        }
    }
}
