use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::events::{ClientCommand, ServerEvent};
use crate::models::{ChatSummary, Message, SenderKind, UserIdentity};
use crate::store::{
    ChatDirectory, EchoDecision, EchoReconciler, SelectionController, SelectionPhase,
    StreamAssembler,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("no active chat selected")]
    NoActiveChat,
    #[error("message content is empty")]
    EmptyMessage,
    #[error("chat name is empty")]
    EmptyChatName,
    #[error("unknown chat id: {0}")]
    UnknownChat(String),
}

/// What the rendering layer must (re)render after one dispatch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewUpdate {
    pub directory_changed: bool,
    pub active_chat_messages_changed: bool,
    /// A newly rendered complete message (for notifications and previews).
    pub new_message: Option<Message>,
}

/// Pull-based snapshot of everything the rendering layer reads.
#[derive(Debug)]
pub struct ViewState<'a> {
    /// Directory entries in recency order.
    pub chats: Vec<&'a ChatSummary>,
    pub active_chat: Option<&'a ChatSummary>,
    pub phase: SelectionPhase,
    /// Messages of the active chat, oldest first.
    pub messages: &'a [Message],
    /// Number of AI streams currently accumulating (any chat).
    pub live_streams: usize,
}

/// Composition root of the synchronization engine.
///
/// Owns every collection (single-writer, no locks) and is the only thing the
/// rendering layer talks to: inbound events go through [`handle_event`],
/// user intents through the methods below, and outbound wire traffic is
/// drained from [`drain_commands`]. Every operation is synchronous and
/// complete before control returns; suspension exists only in the transport
/// adapter.
///
/// [`handle_event`]: SyncEngine::handle_event
/// [`drain_commands`]: SyncEngine::drain_commands
pub struct SyncEngine {
    user: UserIdentity,
    directory: ChatDirectory,
    streams: StreamAssembler,
    echoes: EchoReconciler,
    selection: SelectionController,
    /// Messages of the active chat, oldest first. Replaced wholesale by a
    /// fresh history response; appended/mutated in place by live events.
    active_messages: Vec<Message>,
    outbound: Vec<ClientCommand>,
    /// Latched while a gap-triggered directory refresh is outstanding so a
    /// burst of events referencing unknown chats requests one resync, not one
    /// per event. Cleared by the next snapshot.
    refresh_pending: bool,
}

impl SyncEngine {
    pub fn new(user: UserIdentity) -> Self {
        Self {
            user,
            directory: ChatDirectory::new(),
            streams: StreamAssembler::new(),
            echoes: EchoReconciler::new(),
            selection: SelectionController::new(),
            active_messages: Vec::new(),
            outbound: Vec::new(),
            refresh_pending: false,
        }
    }

    /// Dispatch one inbound event to the owning component and report what
    /// changed. Never fails: malformed situations degrade to a dropped
    /// rendering effect or a requested resync (see the error taxonomy in
    /// DESIGN.md).
    pub fn handle_event(&mut self, event: ServerEvent) -> ViewUpdate {
        match event {
            ServerEvent::DirectorySnapshot { chats } => {
                self.directory.replace_all(chats);
                self.refresh_pending = false;
                ViewUpdate {
                    directory_changed: true,
                    ..ViewUpdate::default()
                }
            }
            ServerEvent::ChatUpserted { chat } => {
                self.directory.upsert(chat);
                ViewUpdate {
                    directory_changed: true,
                    ..ViewUpdate::default()
                }
            }
            ServerEvent::MessageReceived { message } => self.on_message(message),
            ServerEvent::StreamChunk {
                message_id,
                chat_id,
                content,
            } => self.on_stream_chunk(&message_id, &chat_id, &content),
            ServerEvent::StreamEnd {
                message_id,
                chat_id: _,
            } => self.on_stream_end(&message_id),
            ServerEvent::HistoryResponse {
                request_id,
                chat_id,
                messages,
            } => self.on_history(&request_id, &chat_id, messages),
            ServerEvent::ServerError { reason } => {
                // Non-fatal by design: surfaced to the user-visible layer,
                // core state untouched.
                warn!(%reason, "server reported an error");
                ViewUpdate::default()
            }
        }
    }

    fn on_message(&mut self, message: Message) -> ViewUpdate {
        if !self.directory.contains(&message.chat_id) {
            warn!(
                chat_id = %message.chat_id,
                message_id = %message.id,
                "message references a chat missing from the directory; requesting resync"
            );
            self.request_refresh_once();
            return ViewUpdate::default();
        }

        if self.echoes.reconcile(&message, Self::now()) == EchoDecision::Suppress {
            // Our own optimistic copy is already on screen. The directory
            // still takes the server-confirmed preview and timestamp.
            let directory_changed =
                self.directory
                    .touch(&message.chat_id, &message.preview(), message.created_at);
            return ViewUpdate {
                directory_changed,
                ..ViewUpdate::default()
            };
        }

        if message.streaming {
            // An AI response starting to stream in. The buffer accumulates
            // whether or not the chat is on screen; the directory is not
            // touched until final content exists.
            self.streams
                .begin(&message.id, &message.chat_id, &message.content);
            if self.selection.is_active(&message.chat_id)
                && !self.active_messages.iter().any(|m| m.id == message.id)
            {
                self.active_messages.push(message);
                return ViewUpdate {
                    active_chat_messages_changed: true,
                    ..ViewUpdate::default()
                };
            }
            return ViewUpdate::default();
        }

        let mut update = ViewUpdate {
            directory_changed: self.directory.touch(
                &message.chat_id,
                &message.preview(),
                message.created_at,
            ),
            ..ViewUpdate::default()
        };

        if self.selection.is_active(&message.chat_id) {
            match self.active_messages.iter_mut().find(|m| m.id == message.id) {
                // The complete copy of a message we streamed in place.
                Some(existing) => *existing = message.clone(),
                None => self.active_messages.push(message.clone()),
            }
            update.active_chat_messages_changed = true;
        }
        update.new_message = Some(message);
        update
    }

    fn on_stream_chunk(&mut self, message_id: &str, chat_id: &str, content: &str) -> ViewUpdate {
        let is_active = self.selection.is_active(chat_id);
        let Some(accumulated) = self.streams.append(message_id, content) else {
            // Arrived after finalize or for a stream we never saw begin;
            // dropped (and logged) inside the assembler.
            return ViewUpdate::default();
        };
        if !is_active {
            return ViewUpdate::default();
        }
        let accumulated = accumulated.to_string();
        match self
            .active_messages
            .iter_mut()
            .find(|m| m.id == message_id)
        {
            Some(message) => {
                message.content = accumulated;
                ViewUpdate {
                    active_chat_messages_changed: true,
                    ..ViewUpdate::default()
                }
            }
            None => ViewUpdate::default(),
        }
    }

    fn on_stream_end(&mut self, message_id: &str) -> ViewUpdate {
        let Some(content) = self.streams.finalize(message_id) else {
            debug!(message_id, "stream end for unknown or finalized buffer");
            return ViewUpdate::default();
        };
        match self
            .active_messages
            .iter_mut()
            .find(|m| m.id == message_id)
        {
            Some(message) => {
                message.content = content;
                message.streaming = false;
                ViewUpdate {
                    active_chat_messages_changed: true,
                    ..ViewUpdate::default()
                }
            }
            // Background stream: the finalized content reaches us again via
            // the confirmed message / the next history response.
            None => ViewUpdate::default(),
        }
    }

    fn on_history(&mut self, request_id: &str, chat_id: &str, messages: Vec<Message>) -> ViewUpdate {
        if !self.selection.accept_history(request_id, chat_id) {
            return ViewUpdate::default();
        }

        self.active_messages = messages;

        // Streams that kept accumulating while this chat was in the
        // background are overlaid so partial AI output is visible again.
        let overlays: Vec<(String, String)> = self
            .streams
            .buffers_for_chat(chat_id)
            .map(|buffer| (buffer.message_id.clone(), buffer.content.clone()))
            .collect();
        for (message_id, content) in overlays {
            match self
                .active_messages
                .iter_mut()
                .find(|m| m.id == message_id)
            {
                Some(message) => {
                    message.content = content;
                    message.streaming = true;
                }
                None => self.active_messages.push(Message {
                    id: message_id,
                    chat_id: chat_id.to_string(),
                    sender_id: String::new(),
                    sender: SenderKind::Ai,
                    content,
                    created_at: Self::now(),
                    streaming: true,
                }),
            }
        }

        ViewUpdate {
            active_chat_messages_changed: true,
            ..ViewUpdate::default()
        }
    }

    /// Change (or clear) the active chat. Emits leave/join/history-request
    /// intents; re-selecting the active chat is a no-op.
    pub fn select_chat(&mut self, target: Option<&str>) -> Result<ViewUpdate, EngineError> {
        if let Some(chat_id) = target {
            if !self.directory.contains(chat_id) {
                return Err(EngineError::UnknownChat(chat_id.to_string()));
            }
        }

        let Some(effects) = self.selection.select(target) else {
            return Ok(ViewUpdate::default());
        };

        if let Some(old_chat_id) = effects.leave {
            self.outbound.push(ClientCommand::LeaveChat {
                chat_id: old_chat_id,
            });
        }
        if let Some((chat_id, request_id)) = effects.join {
            self.outbound.push(ClientCommand::JoinChat {
                chat_id: chat_id.clone(),
            });
            self.outbound
                .push(ClientCommand::RequestHistory { request_id, chat_id });
        }

        // Cleared immediately: either the fresh history replaces it or the
        // deselected view shows nothing. Stream buffers are NOT dropped;
        // background streams keep accumulating (see DESIGN.md).
        self.active_messages.clear();

        Ok(ViewUpdate {
            active_chat_messages_changed: true,
            ..ViewUpdate::default()
        })
    }

    /// Send a message to the active chat: rendered optimistically, recorded
    /// for echo reconciliation, and queued for publishing.
    pub fn send_message(&mut self, content: &str) -> Result<ViewUpdate, EngineError> {
        let chat_id = self
            .selection
            .active_chat_id()
            .ok_or(EngineError::NoActiveChat)?
            .to_string();
        let content = content.trim();
        if content.is_empty() {
            return Err(EngineError::EmptyMessage);
        }

        let now = Self::now();
        let client_temp_id = Uuid::new_v4().to_string();
        self.echoes
            .record(&client_temp_id, &chat_id, &self.user.id, content, now);

        let message = Message {
            id: client_temp_id.clone(),
            chat_id: chat_id.clone(),
            sender_id: self.user.id.clone(),
            sender: SenderKind::User,
            content: content.to_string(),
            created_at: now,
            streaming: false,
        };
        self.active_messages.push(message.clone());
        let directory_changed = self.directory.touch(&chat_id, &message.preview(), now);

        self.outbound.push(ClientCommand::SendMessage {
            chat_id,
            client_temp_id,
            sender_id: self.user.id.clone(),
            content: content.to_string(),
        });

        Ok(ViewUpdate {
            directory_changed,
            active_chat_messages_changed: true,
            new_message: Some(message),
        })
    }

    pub fn create_chat(&mut self, name: &str, avatar: Option<&str>) -> Result<(), EngineError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(EngineError::EmptyChatName);
        }
        self.outbound.push(ClientCommand::CreateChat {
            name: name.to_string(),
            avatar: avatar.map(str::to_string),
        });
        Ok(())
    }

    pub fn update_active_chat_settings(
        &mut self,
        name: &str,
        avatar: Option<&str>,
    ) -> Result<(), EngineError> {
        let chat_id = self
            .selection
            .active_chat_id()
            .ok_or(EngineError::NoActiveChat)?
            .to_string();
        let name = name.trim();
        if name.is_empty() {
            return Err(EngineError::EmptyChatName);
        }
        self.outbound.push(ClientCommand::UpdateChatSettings {
            chat_id,
            name: name.to_string(),
            avatar: avatar.map(str::to_string),
        });
        Ok(())
    }

    pub fn set_user(&mut self, user: UserIdentity) {
        self.user = user;
        self.outbound.push(ClientCommand::SetUserInfo {
            user: self.user.clone(),
        });
    }

    pub fn user(&self) -> &UserIdentity {
        &self.user
    }

    /// Called by the transport collaborator on every (re)connect.
    pub fn on_connected(&mut self) {
        self.outbound.push(ClientCommand::SetUserInfo {
            user: self.user.clone(),
        });
        self.request_directory();
    }

    /// Force a full directory resync.
    pub fn request_directory(&mut self) {
        self.refresh_pending = true;
        self.outbound.push(ClientCommand::RequestDirectory);
    }

    /// Gap-triggered resync, latched so event bursts referencing unknown
    /// chats emit a single request until the next snapshot lands.
    fn request_refresh_once(&mut self) {
        if !self.refresh_pending {
            self.request_directory();
        }
    }

    /// Outbound intents queued since the last drain, in emission order.
    pub fn drain_commands(&mut self) -> Vec<ClientCommand> {
        std::mem::take(&mut self.outbound)
    }

    pub fn directory(&self) -> &ChatDirectory {
        &self.directory
    }

    pub fn view(&self) -> ViewState<'_> {
        ViewState {
            chats: self.directory.iter().collect(),
            active_chat: self
                .selection
                .active_chat_id()
                .and_then(|id| self.directory.get(id)),
            phase: self.selection.phase(),
            messages: &self.active_messages,
            live_streams: self.streams.len(),
        }
    }

    fn now() -> u64 {
        chrono::Utc::now().timestamp().max(0) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::ClientCommand as Cmd;

    fn test_user() -> UserIdentity {
        UserIdentity {
            id: "local-user".into(),
            display_name: "Local".into(),
            avatar: None,
        }
    }

    fn chat(id: &str, name: &str) -> ChatSummary {
        ChatSummary::new(id, name)
    }

    fn engine_with_chats(ids: &[&str]) -> SyncEngine {
        let mut engine = SyncEngine::new(test_user());
        let chats = ids.iter().map(|id| chat(id, id)).collect();
        engine.handle_event(ServerEvent::DirectorySnapshot { chats });
        engine.drain_commands();
        engine
    }

    /// Select a chat and return the history request id it produced.
    fn select(engine: &mut SyncEngine, chat_id: &str) -> String {
        engine.select_chat(Some(chat_id)).unwrap();
        engine
            .drain_commands()
            .into_iter()
            .find_map(|cmd| match cmd {
                Cmd::RequestHistory { request_id, .. } => Some(request_id),
                _ => None,
            })
            .expect("selection emits a history request")
    }

    fn history(engine: &mut SyncEngine, request_id: &str, chat_id: &str, messages: Vec<Message>) {
        engine.handle_event(ServerEvent::HistoryResponse {
            request_id: request_id.into(),
            chat_id: chat_id.into(),
            messages,
        });
    }

    fn ai_message(id: &str, chat_id: &str, content: &str, streaming: bool) -> Message {
        Message {
            id: id.into(),
            chat_id: chat_id.into(),
            sender_id: "assistant".into(),
            sender: SenderKind::Ai,
            content: content.into(),
            created_at: 2000,
            streaming,
        }
    }

    #[test]
    fn test_snapshot_populates_directory() {
        let mut engine = SyncEngine::new(test_user());
        let update = engine.handle_event(ServerEvent::DirectorySnapshot {
            chats: vec![chat("a", "Alpha"), chat("b", "Beta")],
        });

        assert!(update.directory_changed);
        let view = engine.view();
        assert_eq!(view.chats.len(), 2);
        assert_eq!(view.phase, SelectionPhase::Idle);
    }

    #[test]
    fn test_unknown_chat_requests_refresh_exactly_once() {
        let mut engine = engine_with_chats(&["a"]);

        let update = engine.handle_event(ServerEvent::MessageReceived {
            message: ai_message("m1", "ghost", "hi", false),
        });
        assert_eq!(update, ViewUpdate::default());

        // A second gap while the refresh is outstanding stays latched.
        engine.handle_event(ServerEvent::MessageReceived {
            message: ai_message("m2", "ghost", "hi again", false),
        });

        let requests = engine
            .drain_commands()
            .into_iter()
            .filter(|cmd| *cmd == Cmd::RequestDirectory)
            .count();
        assert_eq!(requests, 1);

        // The snapshot clears the latch; the next gap requests again.
        engine.handle_event(ServerEvent::DirectorySnapshot {
            chats: vec![chat("a", "Alpha")],
        });
        engine.handle_event(ServerEvent::MessageReceived {
            message: ai_message("m3", "still-ghost", "hm", false),
        });
        assert!(engine
            .drain_commands()
            .contains(&Cmd::RequestDirectory));
    }

    #[test]
    fn test_selection_emits_leave_join_history() {
        let mut engine = engine_with_chats(&["a", "b"]);

        engine.select_chat(Some("a")).unwrap();
        let commands = engine.drain_commands();
        assert!(matches!(commands[0], Cmd::JoinChat { ref chat_id } if chat_id == "a"));
        assert!(matches!(commands[1], Cmd::RequestHistory { ref chat_id, .. } if chat_id == "a"));

        engine.select_chat(Some("b")).unwrap();
        let commands = engine.drain_commands();
        assert!(matches!(commands[0], Cmd::LeaveChat { ref chat_id } if chat_id == "a"));

        // Re-selecting the active chat is a no-op.
        engine.select_chat(Some("b")).unwrap();
        assert!(engine.drain_commands().is_empty());
    }

    #[test]
    fn test_select_unknown_chat_is_rejected() {
        let mut engine = engine_with_chats(&["a"]);
        assert_eq!(
            engine.select_chat(Some("ghost")),
            Err(EngineError::UnknownChat("ghost".into()))
        );
    }

    #[test]
    fn test_stale_history_is_discarded() {
        let mut engine = engine_with_chats(&["a", "b"]);
        let first = select(&mut engine, "a");
        let second = select(&mut engine, "b");

        // The response to the abandoned request must not alter chat B's view.
        history(
            &mut engine,
            &first,
            "a",
            vec![ai_message("m1", "a", "old", false)],
        );
        assert!(engine.view().messages.is_empty());
        assert_eq!(engine.view().phase, SelectionPhase::Selecting);

        history(
            &mut engine,
            &second,
            "b",
            vec![ai_message("m2", "b", "fresh", false)],
        );
        assert_eq!(engine.view().messages.len(), 1);
        assert_eq!(engine.view().messages[0].content, "fresh");
        assert_eq!(engine.view().phase, SelectionPhase::Active);
    }

    #[test]
    fn test_send_message_requires_active_chat() {
        let mut engine = engine_with_chats(&["a"]);
        assert_eq!(engine.send_message("hi"), Err(EngineError::NoActiveChat));
    }

    #[test]
    fn test_optimistic_send_and_echo_suppression() {
        let mut engine = engine_with_chats(&["a"]);
        let request_id = select(&mut engine, "a");
        history(&mut engine, &request_id, "a", vec![]);

        let update = engine.send_message("hello there").unwrap();
        assert!(update.active_chat_messages_changed);
        assert_eq!(engine.view().messages.len(), 1);

        let sent = engine
            .drain_commands()
            .into_iter()
            .find_map(|cmd| match cmd {
                Cmd::SendMessage { content, .. } => Some(content),
                _ => None,
            });
        assert_eq!(sent.as_deref(), Some("hello there"));

        // The server's confirmed copy must not be rendered a second time,
        // but the directory still takes the authoritative stamp.
        let confirmation = Message {
            id: "server-1".into(),
            chat_id: "a".into(),
            sender_id: "local-user".into(),
            sender: SenderKind::User,
            content: "hello there".into(),
            created_at: 3000,
            streaming: false,
        };
        let update = engine.handle_event(ServerEvent::MessageReceived {
            message: confirmation,
        });
        assert!(update.new_message.is_none());
        assert!(!update.active_chat_messages_changed);
        assert!(update.directory_changed);
        assert_eq!(engine.view().messages.len(), 1);
        assert_eq!(
            engine.directory().get("a").unwrap().last_message_at,
            Some(3000)
        );

        // An unrelated later message from the same user renders normally.
        let update = engine.handle_event(ServerEvent::MessageReceived {
            message: Message {
                id: "server-2".into(),
                chat_id: "a".into(),
                sender_id: "local-user".into(),
                sender: SenderKind::User,
                content: "from another device".into(),
                created_at: 3001,
                streaming: false,
            },
        });
        assert!(update.new_message.is_some());
        assert_eq!(engine.view().messages.len(), 2);
    }

    #[test]
    fn test_streaming_message_assembles_in_place() {
        let mut engine = engine_with_chats(&["a"]);
        let request_id = select(&mut engine, "a");
        history(&mut engine, &request_id, "a", vec![]);

        engine.handle_event(ServerEvent::MessageReceived {
            message: ai_message("m1", "a", "", true),
        });
        assert_eq!(engine.view().messages.len(), 1);
        assert!(engine.view().messages[0].streaming);

        engine.handle_event(ServerEvent::StreamChunk {
            message_id: "m1".into(),
            chat_id: "a".into(),
            content: "Hel".into(),
        });
        let update = engine.handle_event(ServerEvent::StreamChunk {
            message_id: "m1".into(),
            chat_id: "a".into(),
            content: "lo".into(),
        });
        assert!(update.active_chat_messages_changed);
        assert_eq!(engine.view().messages[0].content, "Hello");

        engine.handle_event(ServerEvent::StreamEnd {
            message_id: "m1".into(),
            chat_id: "a".into(),
        });
        assert!(!engine.view().messages[0].streaming);
        assert_eq!(engine.view().live_streams, 0);

        // The complete copy arrives as a regular message and replaces the
        // streamed one instead of duplicating it.
        let update = engine.handle_event(ServerEvent::MessageReceived {
            message: ai_message("m1", "a", "Hello", false),
        });
        assert!(update.directory_changed);
        assert_eq!(engine.view().messages.len(), 1);
        assert_eq!(engine.view().messages[0].content, "Hello");

        // Chunks after finalize are dropped without effect.
        let update = engine.handle_event(ServerEvent::StreamChunk {
            message_id: "m1".into(),
            chat_id: "a".into(),
            content: "late".into(),
        });
        assert_eq!(update, ViewUpdate::default());
        assert_eq!(engine.view().messages[0].content, "Hello");
    }

    #[test]
    fn test_background_stream_survives_chat_switch() {
        let mut engine = engine_with_chats(&["a", "b"]);
        let request_id = select(&mut engine, "a");
        history(&mut engine, &request_id, "a", vec![]);

        // An AI response starts streaming in chat B while A is active.
        engine.handle_event(ServerEvent::MessageReceived {
            message: ai_message("m1", "b", "", true),
        });
        engine.handle_event(ServerEvent::StreamChunk {
            message_id: "m1".into(),
            chat_id: "b".into(),
            content: "partial ".into(),
        });
        assert!(engine.view().messages.is_empty());
        assert_eq!(engine.view().live_streams, 1);

        // Reopening B overlays the accumulated partial output on top of the
        // fresh history, even though the server's history has no row for the
        // still-streaming message.
        let request_id = select(&mut engine, "b");
        history(&mut engine, &request_id, "b", vec![]);
        assert_eq!(engine.view().messages.len(), 1);
        assert_eq!(engine.view().messages[0].content, "partial ");
        assert!(engine.view().messages[0].streaming);

        engine.handle_event(ServerEvent::StreamChunk {
            message_id: "m1".into(),
            chat_id: "b".into(),
            content: "answer".into(),
        });
        assert_eq!(engine.view().messages[0].content, "partial answer");

        engine.handle_event(ServerEvent::StreamEnd {
            message_id: "m1".into(),
            chat_id: "b".into(),
        });
        assert!(!engine.view().messages[0].streaming);
        assert_eq!(engine.view().live_streams, 0);
    }

    #[test]
    fn test_deselection_clears_view_but_keeps_streams() {
        let mut engine = engine_with_chats(&["a"]);
        let request_id = select(&mut engine, "a");
        history(&mut engine, &request_id, "a", vec![]);

        engine.handle_event(ServerEvent::MessageReceived {
            message: ai_message("m1", "a", "", true),
        });
        engine.handle_event(ServerEvent::StreamChunk {
            message_id: "m1".into(),
            chat_id: "a".into(),
            content: "thinking".into(),
        });

        engine.select_chat(None).unwrap();
        assert_eq!(engine.view().phase, SelectionPhase::Idle);
        assert!(engine.view().messages.is_empty());
        // The background buffer keeps accumulating for a later reselect.
        assert_eq!(engine.view().live_streams, 1);
        let commands = engine.drain_commands();
        assert!(matches!(commands[0], Cmd::LeaveChat { ref chat_id } if chat_id == "a"));
    }

    #[test]
    fn test_server_error_leaves_state_untouched() {
        let mut engine = engine_with_chats(&["a"]);
        let request_id = select(&mut engine, "a");
        history(&mut engine, &request_id, "a", vec![]);

        let update = engine.handle_event(ServerEvent::ServerError {
            reason: "backend unavailable".into(),
        });
        assert_eq!(update, ViewUpdate::default());
        assert_eq!(engine.view().phase, SelectionPhase::Active);
    }

    #[test]
    fn test_on_connected_announces_and_resyncs() {
        let mut engine = SyncEngine::new(test_user());
        engine.on_connected();
        let commands = engine.drain_commands();
        assert!(matches!(commands[0], Cmd::SetUserInfo { .. }));
        assert_eq!(commands[1], Cmd::RequestDirectory);
    }
}
