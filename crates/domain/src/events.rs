//! 领域事件定义
//!
//! 状态迁移成功后产生的事件，由投递路由按在线状态推送给参与者。
//! 事件自带会话信息，路由无需再访问存储。

use serde::{Deserialize, Serialize};

use crate::chat::Chat;
use crate::message::Message;
use crate::value_objects::MessageId;

/// 会话领域事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChatEvent {
    /// 新消息已持久化
    NewMessage { chat: Chat, message: Message },
    /// 新的会话请求，只推送给被邀请方
    ChatRequested { chat: Chat },
    /// 会话已被接受，推送给双方
    ChatAccepted { chat: Chat },
    /// 消息已被发送者删除
    MessageDeleted { chat: Chat, message_id: MessageId },
}

impl ChatEvent {
    /// 事件名，用于日志
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NewMessage { .. } => "new_message",
            Self::ChatRequested { .. } => "chat_requested",
            Self::ChatAccepted { .. } => "chat_accepted",
            Self::MessageDeleted { .. } => "message_deleted",
        }
    }

    /// 事件关联的会话
    pub fn chat(&self) -> &Chat {
        match self {
            Self::NewMessage { chat, .. }
            | Self::ChatRequested { chat }
            | Self::ChatAccepted { chat }
            | Self::MessageDeleted { chat, .. } => chat,
        }
    }
}
