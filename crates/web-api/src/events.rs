//! 实时通道的线格式
//!
//! 双向都是内部打标签的 JSON：`type` 字段区分事件，负载字段用
//! camelCase。领域事件在这里转成对外形状。

use application::{ChatDto, MessageDto};
use domain::ChatEvent;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 客户端到服务端
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientEvent {
    #[serde(rename_all = "camelCase")]
    UserConnect { user_id: String },
    #[serde(rename_all = "camelCase")]
    MessageSend {
        chat_id: String,
        sender_id: String,
        content: String,
        #[serde(default)]
        reply_to_id: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    MessageDelete { message_id: String, user_id: String },
    UserDisconnect,
}

/// 服务端到客户端
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerEvent {
    #[serde(rename_all = "camelCase")]
    MessageReceived {
        message: MessageDto,
        chat_id: Uuid,
    },
    #[serde(rename_all = "camelCase")]
    MessageDeleted { message_id: Uuid, chat_id: Uuid },
    #[serde(rename_all = "camelCase")]
    ChatRequest { chat: ChatDto },
    #[serde(rename_all = "camelCase")]
    ChatAccepted { chat: ChatDto },
    #[serde(rename_all = "camelCase")]
    Error {
        error: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
}

impl ServerEvent {
    pub fn error(error: impl Into<String>, message: Option<String>) -> Self {
        Self::Error {
            error: error.into(),
            message,
        }
    }
}

impl From<&ChatEvent> for ServerEvent {
    fn from(event: &ChatEvent) -> Self {
        match event {
            ChatEvent::NewMessage { chat, message } => Self::MessageReceived {
                message: MessageDto::from(message),
                chat_id: Uuid::from(chat.id),
            },
            ChatEvent::MessageDeleted { chat, message_id } => Self::MessageDeleted {
                message_id: Uuid::from(*message_id),
                chat_id: Uuid::from(chat.id),
            },
            ChatEvent::ChatRequested { chat } => Self::ChatRequest {
                chat: ChatDto::from(chat),
            },
            ChatEvent::ChatAccepted { chat } => Self::ChatAccepted {
                chat: ChatDto::from(chat),
            },
        }
    }
}
