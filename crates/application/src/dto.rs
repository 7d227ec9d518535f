//! 对外数据传输对象
//!
//! 标识符只在这一层转成字符串形式；字段名按接口约定使用 camelCase。

use chrono::{DateTime, Utc};
use domain::{Chat, ChatStatus, Message, User, Username};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: Uuid,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserDto {
    fn from(user: &User) -> Self {
        Self {
            id: Uuid::from(user.id),
            username: user.username.as_str().to_owned(),
            email: user.email.as_ref().map(|e| e.as_str().to_owned()),
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatDto {
    pub id: Uuid,
    pub participants: [Uuid; 2],
    pub status: ChatStatus,
    pub initiated_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
}

impl From<&Chat> for ChatDto {
    fn from(chat: &Chat) -> Self {
        Self {
            id: Uuid::from(chat.id),
            participants: [
                Uuid::from(chat.participants[0]),
                Uuid::from(chat.participants[1]),
            ],
            status: chat.status,
            initiated_by: Uuid::from(chat.initiated_by),
            created_at: chat.created_at,
            accepted_at: chat.accepted_at,
        }
    }
}

/// 会话列表条目：会话本身加上对方参与者的标注（读侧组装，
/// Chat 实体本身不携带冗余字段）。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSummaryDto {
    #[serde(flatten)]
    pub chat: ChatDto,
    pub other_user_id: Uuid,
    pub other_username: String,
}

impl ChatSummaryDto {
    pub fn new(chat: &Chat, other_user_id: domain::UserId, other_username: &Username) -> Self {
        Self {
            chat: ChatDto::from(chat),
            other_user_id: Uuid::from(other_user_id),
            other_username: other_username.as_str().to_owned(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDto {
    pub id: Uuid,
    pub chat_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    pub reply_to_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
    pub deleted: bool,
}

impl From<&Message> for MessageDto {
    fn from(message: &Message) -> Self {
        Self {
            id: Uuid::from(message.id),
            chat_id: Uuid::from(message.chat_id),
            sender_id: Uuid::from(message.sender_id),
            // 已删除消息保留在列表中，但正文不再对外输出
            content: if message.deleted {
                String::new()
            } else {
                message.content.as_str().to_owned()
            },
            reply_to_id: message.reply_to.map(Into::into),
            created_at: message.created_at,
            read_at: message.read_at,
            deleted: message.deleted,
        }
    }
}

/// 分页的消息列表，页内按时间正序。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePageDto {
    pub messages: Vec<MessageDto>,
    pub total: u64,
    pub page: u32,
    pub page_count: u32,
    pub limit: u32,
}
