use std::collections::VecDeque;

use tracing::debug;

use crate::constants::ECHO_CONFIRM_TIMEOUT_SECS;
use crate::models::Message;

/// A message rendered optimistically before server confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEcho {
    pub client_temp_id: String,
    pub chat_id: String,
    pub sender_id: String,
    pub content: String,
    pub created_at: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EchoDecision {
    /// The incoming message confirms an optimistic echo; do not render it a
    /// second time.
    Suppress,
    Render,
}

/// Suppresses duplicate display of self-sent messages.
///
/// The local user's outgoing messages are rendered immediately and recorded
/// here; when the server's confirmed copy arrives it consumes the earliest
/// unmatched echo for that chat (FIFO, since a user's messages to one chat are
/// strictly ordered from the client's perspective). Echoes whose
/// confirmation never arrives expire after a bounded interval so this state
/// cannot grow without limit.
#[derive(Debug, Default)]
pub struct EchoReconciler {
    pending: VecDeque<PendingEcho>,
}

impl EchoReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(
        &mut self,
        client_temp_id: &str,
        chat_id: &str,
        sender_id: &str,
        content: &str,
        now: u64,
    ) {
        self.purge_expired(now);
        self.pending.push_back(PendingEcho {
            client_temp_id: client_temp_id.to_string(),
            chat_id: chat_id.to_string(),
            sender_id: sender_id.to_string(),
            content: content.to_string(),
            created_at: now,
        });
    }

    pub fn reconcile(&mut self, incoming: &Message, now: u64) -> EchoDecision {
        self.purge_expired(now);

        // Streams are AI output; they can never confirm a local echo.
        if incoming.streaming {
            return EchoDecision::Render;
        }

        let matched = self
            .pending
            .iter()
            .position(|echo| echo.chat_id == incoming.chat_id && echo.sender_id == incoming.sender_id);

        match matched.and_then(|index| self.pending.remove(index)) {
            Some(echo) => {
                debug!(
                    client_temp_id = %echo.client_temp_id,
                    message_id = %incoming.id,
                    "suppressing confirmed echo"
                );
                EchoDecision::Suppress
            }
            None => EchoDecision::Render,
        }
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    fn purge_expired(&mut self, now: u64) {
        let before = self.pending.len();
        self.pending
            .retain(|echo| now.saturating_sub(echo.created_at) <= ECHO_CONFIRM_TIMEOUT_SECS);
        let dropped = before - self.pending.len();
        if dropped > 0 {
            debug!(dropped, "treating unconfirmed echoes as confirmed-by-timeout");
        }
    }
}
