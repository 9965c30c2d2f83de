use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::new_id;

/// A named column on the board. Its position in the group list is its order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Group {
    pub fn new(name: String, created_at: DateTime<Utc>) -> Self {
        Group {
            id: new_id(),
            name,
            created_at,
        }
    }
}

/// A drop target on the board: a real group or the "ungrouped" bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroupSlot {
    Ungrouped,
    Group(String),
}

impl GroupSlot {
    /// Droppable id the board uses for the ungrouped bucket
    pub const UNGROUPED_ID: &'static str = "ungrouped";

    /// Interpret a board droppable id.
    pub fn from_droppable_id(id: &str) -> Self {
        if id == Self::UNGROUPED_ID || id.is_empty() {
            GroupSlot::Ungrouped
        } else {
            GroupSlot::Group(id.to_string())
        }
    }

    /// The group id to store on a task (`None` for ungrouped)
    pub fn group_id(&self) -> Option<&str> {
        match self {
            GroupSlot::Ungrouped => None,
            GroupSlot::Group(id) => Some(id),
        }
    }
}

impl From<Option<String>> for GroupSlot {
    fn from(group_id: Option<String>) -> Self {
        match group_id {
            Some(id) => GroupSlot::from_droppable_id(&id),
            None => GroupSlot::Ungrouped,
        }
    }
}

impl std::fmt::Display for GroupSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GroupSlot::Ungrouped => write!(f, "{}", Self::UNGROUPED_ID),
            GroupSlot::Group(id) => write!(f, "{}", id),
        }
    }
}
