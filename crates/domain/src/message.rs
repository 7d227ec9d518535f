//! 消息实体定义
//!
//! 消息创建后不可变，只有已读时间戳和软删除标记可以更新。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{ChatId, MessageContent, MessageId, UserId};

/// 消息实体
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    /// 所属会话
    pub chat_id: ChatId,
    /// 发送者，发送时必须是会话参与者
    pub sender_id: UserId,
    pub content: MessageContent,
    /// 被回复的消息，必须属于同一会话
    pub reply_to: Option<MessageId>,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
    /// 软删除标记，本核心不做物理删除
    pub deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Message {
    pub fn new(
        id: MessageId,
        chat_id: ChatId,
        sender_id: UserId,
        content: MessageContent,
        reply_to: Option<MessageId>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            chat_id,
            sender_id,
            content,
            reply_to,
            created_at: now,
            read_at: None,
            deleted: false,
            deleted_at: None,
        }
    }

    /// 软删除。重复删除是幂等的空操作。
    pub fn soft_delete(&mut self, now: DateTime<Utc>) {
        if self.deleted {
            return;
        }
        self.deleted = true;
        self.deleted_at = Some(now);
    }

    /// 标记已读，只写入一次。
    pub fn mark_read(&mut self, now: DateTime<Utc>) {
        if self.read_at.is_none() {
            self.read_at = Some(now);
        }
    }

    pub fn is_reply(&self) -> bool {
        self.reply_to.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_message(content: &str) -> Message {
        Message::new(
            MessageId::new(),
            ChatId::new(),
            UserId::new(),
            MessageContent::new(content).unwrap(),
            None,
            Utc::now(),
        )
    }

    #[test]
    fn test_new_message() {
        let message = new_message("hello");

        assert_eq!(message.content.as_str(), "hello");
        assert!(!message.deleted);
        assert!(message.read_at.is_none());
        assert!(!message.is_reply());
    }

    #[test]
    fn test_soft_delete_is_idempotent() {
        let mut message = new_message("to be deleted");

        message.soft_delete(Utc::now());
        assert!(message.deleted);
        let first = message.deleted_at;

        // 第二次删除不改变删除时间
        message.soft_delete(Utc::now());
        assert_eq!(message.deleted_at, first);
    }

    #[test]
    fn test_mark_read_writes_once() {
        let mut message = new_message("unread");

        message.mark_read(Utc::now());
        let first = message.read_at;
        assert!(first.is_some());

        message.mark_read(Utc::now());
        assert_eq!(message.read_at, first);
    }
}
