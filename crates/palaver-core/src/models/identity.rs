use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The local user. The `id` is what echo reconciliation compares message
/// sender ids against, so it must be stable across sessions (the session
/// store persists it).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl UserIdentity {
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            display_name: display_name.into(),
            avatar: None,
        }
    }
}
