use std::cmp::Ordering;

use crate::models::ChatSummary;
use crate::search;

/// Ordered directory of chat threads.
///
/// Iteration order is always sorted by `last_message_at` descending; entries
/// that have never seen a message sort last. Ties keep insertion order (the
/// sort is stable and new entries are appended before sorting).
#[derive(Debug, Default)]
pub struct ChatDirectory {
    chats: Vec<ChatSummary>,
}

impl ChatDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full refresh, used on connect and forced resync.
    pub fn replace_all(&mut self, chats: Vec<ChatSummary>) {
        self.chats = chats;
        self.sort();
    }

    /// Merge a partial update into an existing entry by id, or insert a new
    /// entry if the id is unknown.
    pub fn upsert(&mut self, incoming: ChatSummary) {
        match self.chats.iter_mut().find(|c| c.id == incoming.id) {
            Some(existing) => existing.merge_from(incoming),
            None => self.chats.push(incoming),
        }
        self.sort();
    }

    /// Update preview/recency on new-message arrival and move the entry to
    /// its sorted position. Returns `false` when the chat id is unknown:
    /// metadata arriving out of order relative to messages is expected, and
    /// the caller reacts by requesting a directory refresh.
    pub fn touch(&mut self, chat_id: &str, preview: &str, timestamp: u64) -> bool {
        let Some(chat) = self.chats.iter_mut().find(|c| c.id == chat_id) else {
            return false;
        };
        chat.last_message_preview = Some(preview.to_string());
        chat.last_message_at = Some(timestamp);
        self.sort();
        true
    }

    /// Lazy, restartable filtered view. Matches case-insensitively against
    /// display name and last-message preview; '+' separates AND terms.
    /// Stored order is not mutated.
    pub fn filter<'a>(&'a self, query: &str) -> impl Iterator<Item = &'a ChatSummary> + 'a {
        let terms = search::parse_terms(query);
        self.chats.iter().filter(move |chat| {
            search::contains_all_terms(&chat.display_name, &terms)
                || chat
                    .last_message_preview
                    .as_deref()
                    .is_some_and(|preview| search::contains_all_terms(preview, &terms))
        })
    }

    pub fn contains(&self, chat_id: &str) -> bool {
        self.chats.iter().any(|c| c.id == chat_id)
    }

    pub fn get(&self, chat_id: &str) -> Option<&ChatSummary> {
        self.chats.iter().find(|c| c.id == chat_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChatSummary> {
        self.chats.iter()
    }

    pub fn len(&self) -> usize {
        self.chats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chats.is_empty()
    }

    fn sort(&mut self) {
        self.chats
            .sort_by(|a, b| match (a.last_message_at, b.last_message_at) {
                (Some(x), Some(y)) => y.cmp(&x),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            });
    }
}
