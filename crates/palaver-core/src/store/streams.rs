use std::collections::HashMap;

use tracing::{debug, warn};

/// In-progress AI message content, keyed by message id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamBuffer {
    pub message_id: String,
    pub chat_id: String,
    pub content: String,
}

/// Assembles incrementally-streamed AI messages.
///
/// Each message id moves through absent → streaming → finalized. Chunks for
/// one id are delivered in order by the transport; this accumulator never
/// reorders, drops, or duplicates them, so `finalize` returns the exact
/// concatenation of everything appended.
#[derive(Debug, Default)]
pub struct StreamAssembler {
    buffers: HashMap<String, StreamBuffer>,
}

impl StreamAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a buffer for a message id. Idempotent: a duplicate begin leaves
    /// the existing buffer (and its accumulated content) untouched and
    /// returns `false`.
    pub fn begin(&mut self, message_id: &str, chat_id: &str, initial: &str) -> bool {
        if self.buffers.contains_key(message_id) {
            debug!(message_id, "duplicate stream begin ignored");
            return false;
        }
        self.buffers.insert(
            message_id.to_string(),
            StreamBuffer {
                message_id: message_id.to_string(),
                chat_id: chat_id.to_string(),
                content: initial.to_string(),
            },
        );
        true
    }

    /// Append a chunk in arrival order and return the accumulated content
    /// for incremental rendering. A chunk with no live buffer (arrived after
    /// finalize, or for a message we never saw begin) is dropped with a
    /// warning, never an error.
    pub fn append(&mut self, message_id: &str, chunk: &str) -> Option<&str> {
        match self.buffers.get_mut(message_id) {
            Some(buffer) => {
                buffer.content.push_str(chunk);
                Some(buffer.content.as_str())
            }
            None => {
                warn!(message_id, "dropping chunk with no live stream buffer");
                None
            }
        }
    }

    /// Close the stream and hand back the full content. Chunks arriving for
    /// this id afterwards are no-ops.
    pub fn finalize(&mut self, message_id: &str) -> Option<String> {
        self.buffers.remove(message_id).map(|buffer| buffer.content)
    }

    pub fn content(&self, message_id: &str) -> Option<&str> {
        self.buffers.get(message_id).map(|b| b.content.as_str())
    }

    pub fn buffers_for_chat<'a>(
        &'a self,
        chat_id: &'a str,
    ) -> impl Iterator<Item = &'a StreamBuffer> + 'a {
        self.buffers.values().filter(move |b| b.chat_id == chat_id)
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }
}
