//! 会话实体定义
//!
//! 双人会话的邀请/接受状态机。参与者对在创建时固定，状态只能从
//! Pending 单向迁移到 Accepted 或 Rejected，之后不再变化。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{DomainError, DomainResult};
use crate::value_objects::{ChatId, UserId};

/// 会话状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatStatus {
    /// 等待对方接受
    Pending,
    /// 双方已建立会话
    Accepted,
    /// 已拒绝（建模为状态值，本核心没有触发它的操作）
    Rejected,
}

impl std::fmt::Display for ChatStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => f.write_str("pending"),
            Self::Accepted => f.write_str("accepted"),
            Self::Rejected => f.write_str("rejected"),
        }
    }
}

/// 会话实体
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub id: ChatId,
    /// 恰好两个互不相同的参与者，创建后不再变化
    pub participants: [UserId; 2],
    pub status: ChatStatus,
    /// 发起方，必须是参与者之一
    pub initiated_by: UserId,
    pub created_at: DateTime<Utc>,
    /// 仅在迁移到 Accepted 时写入
    pub accepted_at: Option<DateTime<Utc>>,
}

impl Chat {
    /// 创建新的会话请求，初始状态为 Pending。
    pub fn request(
        id: ChatId,
        from: UserId,
        to: UserId,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if from == to {
            return Err(DomainError::invalid_argument(
                "toUserId",
                "cannot request a chat with yourself",
            ));
        }

        Ok(Self {
            id,
            participants: [from, to],
            status: ChatStatus::Pending,
            initiated_by: from,
            created_at: now,
            accepted_at: None,
        })
    }

    /// 接受会话请求。
    ///
    /// 只有非发起方参与者可以接受，且仅允许 Pending → Accepted 迁移。
    pub fn accept(&mut self, user_id: UserId, now: DateTime<Utc>) -> DomainResult<()> {
        if !self.is_participant(user_id) {
            return Err(DomainError::forbidden("not a participant of this chat"));
        }
        if user_id == self.initiated_by {
            return Err(DomainError::forbidden(
                "initiator cannot accept their own chat request",
            ));
        }
        if self.status != ChatStatus::Pending {
            return Err(DomainError::conflict(format!(
                "chat is already {}",
                self.status
            )));
        }

        self.status = ChatStatus::Accepted;
        self.accepted_at = Some(now);
        Ok(())
    }

    pub fn is_participant(&self, user_id: UserId) -> bool {
        self.participants.contains(&user_id)
    }

    /// 返回相对于给定参与者的另一方。
    pub fn other_participant(&self, user_id: UserId) -> Option<UserId> {
        match self.participants {
            [a, b] if a == user_id => Some(b),
            [a, b] if b == user_id => Some(a),
            _ => None,
        }
    }

    /// 非发起方参与者。
    pub fn invited(&self) -> UserId {
        // participants[0] 恒为发起方，见 request()
        self.participants[1]
    }

    /// 无序参与者对的规范形式，用于唯一约束。
    pub fn pair_key(&self) -> (Uuid, Uuid) {
        normalized_pair(self.participants[0], self.participants[1])
    }
}

/// 将参与者对按 UUID 字节序排序，保证 (a,b) 与 (b,a) 得到同一个键。
pub fn normalized_pair(a: UserId, b: UserId) -> (Uuid, Uuid) {
    let (a, b) = (Uuid::from(a), Uuid::from(b));
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_chat(from: UserId, to: UserId) -> Chat {
        Chat::request(ChatId::new(), from, to, Utc::now()).unwrap()
    }

    #[test]
    fn test_request_rejects_self_chat() {
        let user = UserId::new();
        let result = Chat::request(ChatId::new(), user, user, Utc::now());
        assert!(matches!(
            result,
            Err(DomainError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_request_starts_pending() {
        let (from, to) = (UserId::new(), UserId::new());
        let chat = new_chat(from, to);

        assert_eq!(chat.status, ChatStatus::Pending);
        assert_eq!(chat.initiated_by, from);
        assert_eq!(chat.invited(), to);
        assert!(chat.accepted_at.is_none());
    }

    #[test]
    fn test_accept_by_invited_participant() {
        let (from, to) = (UserId::new(), UserId::new());
        let mut chat = new_chat(from, to);

        chat.accept(to, Utc::now()).unwrap();

        assert_eq!(chat.status, ChatStatus::Accepted);
        assert!(chat.accepted_at.is_some());
    }

    #[test]
    fn test_initiator_cannot_accept() {
        let (from, to) = (UserId::new(), UserId::new());
        let mut chat = new_chat(from, to);

        let result = chat.accept(from, Utc::now());
        assert!(matches!(result, Err(DomainError::Forbidden { .. })));
        assert_eq!(chat.status, ChatStatus::Pending);
    }

    #[test]
    fn test_outsider_cannot_accept() {
        let mut chat = new_chat(UserId::new(), UserId::new());

        let result = chat.accept(UserId::new(), Utc::now());
        assert!(matches!(result, Err(DomainError::Forbidden { .. })));
    }

    #[test]
    fn test_accept_twice_is_conflict() {
        let (from, to) = (UserId::new(), UserId::new());
        let mut chat = new_chat(from, to);
        chat.accept(to, Utc::now()).unwrap();
        let accepted_at = chat.accepted_at;

        let result = chat.accept(to, Utc::now());
        assert!(matches!(result, Err(DomainError::Conflict { .. })));
        // 已接受的会话不被修改
        assert_eq!(chat.status, ChatStatus::Accepted);
        assert_eq!(chat.accepted_at, accepted_at);
    }

    #[test]
    fn test_other_participant() {
        let (from, to) = (UserId::new(), UserId::new());
        let chat = new_chat(from, to);

        assert_eq!(chat.other_participant(from), Some(to));
        assert_eq!(chat.other_participant(to), Some(from));
        assert_eq!(chat.other_participant(UserId::new()), None);
    }

    #[test]
    fn test_pair_key_is_order_insensitive() {
        let (a, b) = (UserId::new(), UserId::new());
        assert_eq!(normalized_pair(a, b), normalized_pair(b, a));

        let chat_ab = new_chat(a, b);
        let chat_ba = new_chat(b, a);
        assert_eq!(chat_ab.pair_key(), chat_ba.pair_key());
    }
}
