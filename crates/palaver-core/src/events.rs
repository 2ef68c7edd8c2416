use serde::{Deserialize, Serialize};

use crate::models::{ChatSummary, Message, UserIdentity};

/// Inbound events from the server, one JSON object per line on the wire.
///
/// This is a closed set: the engine matches it exhaustively, so a new event
/// kind is a compile-time-visible change at every dispatch point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    DirectorySnapshot {
        chats: Vec<ChatSummary>,
    },
    ChatUpserted {
        chat: ChatSummary,
    },
    MessageReceived {
        message: Message,
    },
    StreamChunk {
        message_id: String,
        chat_id: String,
        content: String,
    },
    StreamEnd {
        message_id: String,
        chat_id: String,
    },
    HistoryResponse {
        request_id: String,
        chat_id: String,
        messages: Vec<Message>,
    },
    ServerError {
        reason: String,
    },
}

/// Outbound intents to the server. `select_chat` is a local intent that
/// expands into leave/join/history-request emissions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientCommand {
    RequestDirectory,
    JoinChat {
        chat_id: String,
    },
    LeaveChat {
        chat_id: String,
    },
    RequestHistory {
        request_id: String,
        chat_id: String,
    },
    SendMessage {
        chat_id: String,
        client_temp_id: String,
        sender_id: String,
        content: String,
    },
    SetUserInfo {
        user: UserIdentity,
    },
    CreateChat {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        avatar: Option<String>,
    },
    UpdateChatSettings {
        chat_id: String,
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        avatar: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SenderKind;
    use serde_json::json;

    #[test]
    fn test_server_event_roundtrip() {
        let event = ServerEvent::StreamChunk {
            message_id: "m1".into(),
            chat_id: "c1".into(),
            content: "Hel".into(),
        };

        let encoded = serde_json::to_value(&event).unwrap();
        assert_eq!(
            encoded,
            json!({
                "type": "stream_chunk",
                "message_id": "m1",
                "chat_id": "c1",
                "content": "Hel",
            })
        );

        let decoded: ServerEvent = serde_json::from_value(encoded).unwrap();
        assert_eq!(decoded, event);
    }

    #[test]
    fn test_message_streaming_flag_defaults_false() {
        let event: ServerEvent = serde_json::from_value(json!({
            "type": "message_received",
            "message": {
                "id": "m1",
                "chat_id": "c1",
                "sender_id": "u1",
                "sender": "ai",
                "content": "hi",
                "created_at": 1000,
            }
        }))
        .unwrap();

        match event {
            ServerEvent::MessageReceived { message } => {
                assert_eq!(message.sender, SenderKind::Ai);
                assert!(!message.streaming);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_client_command_tag_format() {
        let cmd = ClientCommand::RequestHistory {
            request_id: "r1".into(),
            chat_id: "c1".into(),
        };
        let encoded = serde_json::to_string(&cmd).unwrap();
        assert!(encoded.contains(r#""type":"request_history""#));

        let unit = serde_json::to_value(ClientCommand::RequestDirectory).unwrap();
        assert_eq!(unit, json!({"type": "request_directory"}));
    }
}
