use tracing::debug;
use uuid::Uuid;

/// Where the active-chat lifecycle currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionPhase {
    /// No chat selected.
    Idle,
    /// A chat is selected and its history request is outstanding.
    Selecting,
    /// The selected chat's history has been rendered.
    Active,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingHistory {
    request_id: String,
    chat_id: String,
}

/// Transport intents produced by a selection change.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SelectionEffects {
    /// Chat to leave, if one was active.
    pub leave: Option<String>,
    /// `(chat_id, request_id)` to join and request history for.
    pub join: Option<(String, String)>,
}

/// Owns the single active-chat pointer.
///
/// There is no true request cancellation: switching chats while a history
/// request is in flight simply replaces the pending request id, and the
/// late response is recognized as stale by id comparison and discarded.
#[derive(Debug, Default)]
pub struct SelectionController {
    active_chat_id: Option<String>,
    pending: Option<PendingHistory>,
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Change the active chat. Returns `None` when nothing changes
    /// (re-selecting the active chat, or deselecting with nothing active);
    /// otherwise the leave/join intents the transport must emit.
    pub fn select(&mut self, target: Option<&str>) -> Option<SelectionEffects> {
        match target {
            Some(chat_id) if self.active_chat_id.as_deref() == Some(chat_id) => None,
            Some(chat_id) => {
                let leave = self.active_chat_id.replace(chat_id.to_string());
                let request_id = Uuid::new_v4().to_string();
                self.pending = Some(PendingHistory {
                    request_id: request_id.clone(),
                    chat_id: chat_id.to_string(),
                });
                Some(SelectionEffects {
                    leave,
                    join: Some((chat_id.to_string(), request_id)),
                })
            }
            None => {
                let leave = self.active_chat_id.take()?;
                self.pending = None;
                Some(SelectionEffects {
                    leave: Some(leave),
                    join: None,
                })
            }
        }
    }

    /// Accept a history response only when it correlates with the most
    /// recent outstanding request. Anything else arrived after the user
    /// switched chats again and is discarded.
    pub fn accept_history(&mut self, request_id: &str, chat_id: &str) -> bool {
        match &self.pending {
            Some(pending) if pending.request_id == request_id && pending.chat_id == chat_id => {
                self.pending = None;
                true
            }
            _ => {
                debug!(request_id, chat_id, "discarding stale history response");
                false
            }
        }
    }

    pub fn phase(&self) -> SelectionPhase {
        match (&self.active_chat_id, &self.pending) {
            (None, _) => SelectionPhase::Idle,
            (Some(_), Some(_)) => SelectionPhase::Selecting,
            (Some(_), None) => SelectionPhase::Active,
        }
    }

    pub fn active_chat_id(&self) -> Option<&str> {
        self.active_chat_id.as_deref()
    }

    pub fn is_active(&self, chat_id: &str) -> bool {
        self.active_chat_id.as_deref() == Some(chat_id)
    }
}
