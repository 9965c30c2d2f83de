use serde::{Deserialize, Serialize};

use super::new_id;

/// The fixed tag palette. Serialized as the hex string the board renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TagColor {
    #[default]
    Orange,
    Green,
    Blue,
    Purple,
    Pink,
    Red,
    Yellow,
    Indigo,
}

impl TagColor {
    pub const PALETTE: [TagColor; 8] = [
        TagColor::Orange,
        TagColor::Green,
        TagColor::Blue,
        TagColor::Purple,
        TagColor::Pink,
        TagColor::Red,
        TagColor::Yellow,
        TagColor::Indigo,
    ];

    pub fn hex(self) -> &'static str {
        match self {
            TagColor::Orange => "#f97316",
            TagColor::Green => "#10b981",
            TagColor::Blue => "#3b82f6",
            TagColor::Purple => "#8b5cf6",
            TagColor::Pink => "#ec4899",
            TagColor::Red => "#ef4444",
            TagColor::Yellow => "#f59e0b",
            TagColor::Indigo => "#6366f1",
        }
    }

    /// Look up a palette colour by hex string (case-insensitive)
    pub fn from_hex(hex: &str) -> Option<TagColor> {
        Self::PALETTE
            .into_iter()
            .find(|c| c.hex().eq_ignore_ascii_case(hex.trim()))
    }
}

/// Colours outside the palette fall back to the default instead of failing the load.
impl From<String> for TagColor {
    fn from(hex: String) -> Self {
        TagColor::from_hex(&hex).unwrap_or_else(|| {
            tracing::debug!(color = %hex, "tag colour not in palette, using default");
            TagColor::default()
        })
    }
}

impl From<TagColor> for String {
    fn from(color: TagColor) -> Self {
        color.hex().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub color: TagColor,
}

impl Tag {
    pub fn new(name: String, color: TagColor) -> Self {
        Tag {
            id: new_id(),
            name,
            color,
        }
    }
}
