use serde::{Deserialize, Serialize};

use crate::constants::PREVIEW_MAX_CHARS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SenderKind {
    User,
    Ai,
}

/// A single chat message.
///
/// Immutable once `streaming` is false. While `streaming` is true the
/// engine updates `content` in place from the stream assembler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub chat_id: String,
    pub sender_id: String,
    pub sender: SenderKind,
    pub content: String,
    /// Unix seconds.
    pub created_at: u64,
    #[serde(default)]
    pub streaming: bool,
}

impl Message {
    /// Directory preview text for this message, truncated to
    /// `PREVIEW_MAX_CHARS` characters.
    pub fn preview(&self) -> String {
        let mut preview: String = self.content.chars().take(PREVIEW_MAX_CHARS).collect();
        if self.content.chars().count() > PREVIEW_MAX_CHARS {
            preview.push_str("...");
        }
        preview
    }
}
