use serde::{Deserialize, Serialize};

/// Directory entry for one chat thread.
///
/// Only `id` and `display_name` are guaranteed present on the wire; the
/// remaining fields are filled in as metadata and messages arrive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSummary {
    pub id: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message_preview: Option<String>,
    /// Unix seconds of the newest message; `None` until the first message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message_at: Option<u64>,
}

impl ChatSummary {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            avatar: None,
            last_message_preview: None,
            last_message_at: None,
        }
    }

    /// Merge a partial update into this entry. The display name always wins;
    /// optional fields only overwrite when the incoming side carries a value,
    /// so a metadata-only update cannot erase recency information.
    pub fn merge_from(&mut self, incoming: ChatSummary) {
        self.display_name = incoming.display_name;
        if incoming.avatar.is_some() {
            self.avatar = incoming.avatar;
        }
        if incoming.last_message_preview.is_some() {
            self.last_message_preview = incoming.last_message_preview;
        }
        if incoming.last_message_at.is_some() {
            self.last_message_at = incoming.last_message_at;
        }
    }
}
