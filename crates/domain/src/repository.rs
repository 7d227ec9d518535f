//! 仓储接口定义
//!
//! 每个实体一个仓储 trait，具体实现（PostgreSQL、内存）在外层提供。
//! 所有方法都是潜在阻塞的 I/O 调用，调用方不得跨 await 持有进程内锁。

use async_trait::async_trait;

use crate::chat::Chat;
use crate::message::Message;
use crate::user::User;
use crate::value_objects::{ChatId, MessageId, UserId};

/// 仓储错误类型
#[derive(Debug, Clone, thiserror::Error)]
pub enum RepositoryError {
    /// 记录不存在
    #[error("record not found")]
    NotFound,
    /// 唯一约束冲突（并发重复创建时由调用方重取恢复）
    #[error("unique constraint violated")]
    Conflict,
    /// 底层存储错误
    #[error("storage error: {message}")]
    Storage { message: String },
}

impl RepositoryError {
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// 创建用户，用户名或邮箱重复时返回 Conflict。
    async fn create(&self, user: User) -> RepositoryResult<User>;
    async fn find_by_id(&self, id: UserId) -> RepositoryResult<Option<User>>;
    async fn find_by_username(&self, username: &str) -> RepositoryResult<Option<User>>;
    /// 按用户名排序列出用户，可排除指定用户。
    async fn list(&self, exclude: Option<UserId>) -> RepositoryResult<Vec<User>>;
    /// 用户名大小写不敏感的子串检索。
    async fn search(&self, query: &str, exclude: Option<UserId>) -> RepositoryResult<Vec<User>>;
}

#[async_trait]
pub trait ChatRepository: Send + Sync {
    /// 创建会话。无序参与者对上有唯一约束，并发重复创建返回 Conflict。
    async fn create(&self, chat: Chat) -> RepositoryResult<Chat>;
    async fn update(&self, chat: Chat) -> RepositoryResult<Chat>;
    async fn find_by_id(&self, id: ChatId) -> RepositoryResult<Option<Chat>>;
    /// 按无序参与者对查找，(a,b) 与 (b,a) 等价。
    async fn find_by_pair(&self, a: UserId, b: UserId) -> RepositoryResult<Option<Chat>>;
    /// 用户参与的所有会话，按创建时间倒序。
    async fn list_for_user(&self, user_id: UserId) -> RepositoryResult<Vec<Chat>>;
}

#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn create(&self, message: Message) -> RepositoryResult<Message>;
    async fn update(&self, message: Message) -> RepositoryResult<Message>;
    async fn find_by_id(&self, id: MessageId) -> RepositoryResult<Option<Message>>;
    async fn count_for_chat(&self, chat_id: ChatId) -> RepositoryResult<u64>;
    /// 取一页消息，按 (created_at, seq) 倒序——即最新的在前。
    /// seq 是存储层单调递增的次级排序键，用于消除同一时间戳下的歧义。
    async fn list_page(
        &self,
        chat_id: ChatId,
        limit: u32,
        offset: u64,
    ) -> RepositoryResult<Vec<Message>>;
}
