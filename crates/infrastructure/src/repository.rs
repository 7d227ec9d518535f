//! PostgreSQL 仓储实现
//!
//! 行记录与实体之间通过 TryFrom 转换；唯一约束冲突统一映射为
//! RepositoryError::Conflict，由应用层按重取策略恢复。
//!
//! 会话的参与者对按 UUID 字节序拆成 (user_lo, user_hi) 两列存储，
//! 其上的唯一约束就是"每对参与者至多一个会话"的保证。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{
    normalized_pair, Chat, ChatId, ChatRepository, ChatStatus, Message, MessageContent, MessageId,
    MessageRepository, PasswordHash, RepositoryError, RepositoryResult, User, UserEmail, UserId,
    UserRepository, Username,
};
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};
use uuid::Uuid;

/// 创建连接池
pub async fn create_pg_pool(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

fn map_sqlx_err(err: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return RepositoryError::Conflict;
        }
    }
    RepositoryError::storage(err.to_string())
}

fn invalid_data(message: impl Into<String>) -> RepositoryError {
    RepositoryError::storage(message)
}

#[derive(Debug, FromRow)]
struct UserRecord {
    id: Uuid,
    username: String,
    email: Option<String>,
    password_hash: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRecord> for User {
    type Error = RepositoryError;

    fn try_from(value: UserRecord) -> Result<Self, Self::Error> {
        let username =
            Username::parse(value.username).map_err(|err| invalid_data(err.to_string()))?;
        let email = value
            .email
            .map(UserEmail::parse)
            .transpose()
            .map_err(|err| invalid_data(err.to_string()))?;
        let password = value
            .password_hash
            .map(PasswordHash::new)
            .transpose()
            .map_err(|err| invalid_data(err.to_string()))?;

        Ok(User {
            id: UserId::from(value.id),
            username,
            email,
            password,
            created_at: value.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct ChatRecord {
    id: Uuid,
    user_lo: Uuid,
    user_hi: Uuid,
    initiated_by: Uuid,
    status: String,
    created_at: DateTime<Utc>,
    accepted_at: Option<DateTime<Utc>>,
}

impl TryFrom<ChatRecord> for Chat {
    type Error = RepositoryError;

    fn try_from(value: ChatRecord) -> Result<Self, Self::Error> {
        let status = match value.status.as_str() {
            "pending" => ChatStatus::Pending,
            "accepted" => ChatStatus::Accepted,
            "rejected" => ChatStatus::Rejected,
            other => return Err(invalid_data(format!("unknown chat status: {other}"))),
        };

        // participants[0] 恒为发起方
        let other = if value.user_lo == value.initiated_by {
            value.user_hi
        } else {
            value.user_lo
        };

        Ok(Chat {
            id: ChatId::from(value.id),
            participants: [UserId::from(value.initiated_by), UserId::from(other)],
            status,
            initiated_by: UserId::from(value.initiated_by),
            created_at: value.created_at,
            accepted_at: value.accepted_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct MessageRecord {
    id: Uuid,
    chat_id: Uuid,
    sender_id: Uuid,
    content: String,
    reply_to_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    read_at: Option<DateTime<Utc>>,
    is_deleted: bool,
    deleted_at: Option<DateTime<Utc>>,
}

impl TryFrom<MessageRecord> for Message {
    type Error = RepositoryError;

    fn try_from(value: MessageRecord) -> Result<Self, Self::Error> {
        let content =
            MessageContent::new(value.content).map_err(|err| invalid_data(err.to_string()))?;

        Ok(Message {
            id: MessageId::from(value.id),
            chat_id: ChatId::from(value.chat_id),
            sender_id: UserId::from(value.sender_id),
            content,
            reply_to: value.reply_to_id.map(MessageId::from),
            created_at: value.created_at,
            read_at: value.read_at,
            deleted: value.is_deleted,
            deleted_at: value.deleted_at,
        })
    }
}

fn status_str(status: ChatStatus) -> &'static str {
    match status {
        ChatStatus::Pending => "pending",
        ChatStatus::Accepted => "accepted",
        ChatStatus::Rejected => "rejected",
    }
}

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: User) -> RepositoryResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            r#"
            INSERT INTO users (id, username, email, password_hash, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, username, email, password_hash, created_at
            "#,
        )
        .bind(Uuid::from(user.id))
        .bind(user.username.as_str())
        .bind(user.email.as_ref().map(|e| e.as_str()))
        .bind(user.password.as_ref().map(|p| p.as_str()))
        .bind(user.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        record.try_into()
    }

    async fn find_by_id(&self, id: UserId) -> RepositoryResult<Option<User>> {
        sqlx::query_as::<_, UserRecord>(
            "SELECT id, username, email, password_hash, created_at FROM users WHERE id = $1",
        )
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?
        .map(TryInto::try_into)
        .transpose()
    }

    async fn find_by_username(&self, username: &str) -> RepositoryResult<Option<User>> {
        sqlx::query_as::<_, UserRecord>(
            "SELECT id, username, email, password_hash, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?
        .map(TryInto::try_into)
        .transpose()
    }

    async fn list(&self, exclude: Option<UserId>) -> RepositoryResult<Vec<User>> {
        let records = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, username, email, password_hash, created_at
            FROM users
            WHERE $1::uuid IS NULL OR id <> $1
            ORDER BY username
            "#,
        )
        .bind(exclude.map(Uuid::from))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        records.into_iter().map(TryInto::try_into).collect()
    }

    async fn search(&self, query: &str, exclude: Option<UserId>) -> RepositoryResult<Vec<User>> {
        let pattern = format!("%{query}%");
        let records = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, username, email, password_hash, created_at
            FROM users
            WHERE username ILIKE $1 AND ($2::uuid IS NULL OR id <> $2)
            ORDER BY username
            "#,
        )
        .bind(pattern)
        .bind(exclude.map(Uuid::from))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        records.into_iter().map(TryInto::try_into).collect()
    }
}

pub struct PgChatRepository {
    pool: PgPool,
}

impl PgChatRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChatRepository for PgChatRepository {
    async fn create(&self, chat: Chat) -> RepositoryResult<Chat> {
        let (lo, hi) = chat.pair_key();
        let record = sqlx::query_as::<_, ChatRecord>(
            r#"
            INSERT INTO chats (id, user_lo, user_hi, initiated_by, status, created_at, accepted_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, user_lo, user_hi, initiated_by, status, created_at, accepted_at
            "#,
        )
        .bind(Uuid::from(chat.id))
        .bind(lo)
        .bind(hi)
        .bind(Uuid::from(chat.initiated_by))
        .bind(status_str(chat.status))
        .bind(chat.created_at)
        .bind(chat.accepted_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        record.try_into()
    }

    async fn update(&self, chat: Chat) -> RepositoryResult<Chat> {
        let record = sqlx::query_as::<_, ChatRecord>(
            r#"
            UPDATE chats
            SET status = $2, accepted_at = $3
            WHERE id = $1
            RETURNING id, user_lo, user_hi, initiated_by, status, created_at, accepted_at
            "#,
        )
        .bind(Uuid::from(chat.id))
        .bind(status_str(chat.status))
        .bind(chat.accepted_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?
        .ok_or(RepositoryError::NotFound)?;

        record.try_into()
    }

    async fn find_by_id(&self, id: ChatId) -> RepositoryResult<Option<Chat>> {
        sqlx::query_as::<_, ChatRecord>(
            r#"
            SELECT id, user_lo, user_hi, initiated_by, status, created_at, accepted_at
            FROM chats WHERE id = $1
            "#,
        )
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?
        .map(TryInto::try_into)
        .transpose()
    }

    async fn find_by_pair(&self, a: UserId, b: UserId) -> RepositoryResult<Option<Chat>> {
        let (lo, hi) = normalized_pair(a, b);
        sqlx::query_as::<_, ChatRecord>(
            r#"
            SELECT id, user_lo, user_hi, initiated_by, status, created_at, accepted_at
            FROM chats WHERE user_lo = $1 AND user_hi = $2
            "#,
        )
        .bind(lo)
        .bind(hi)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?
        .map(TryInto::try_into)
        .transpose()
    }

    async fn list_for_user(&self, user_id: UserId) -> RepositoryResult<Vec<Chat>> {
        let records = sqlx::query_as::<_, ChatRecord>(
            r#"
            SELECT id, user_lo, user_hi, initiated_by, status, created_at, accepted_at
            FROM chats
            WHERE user_lo = $1 OR user_hi = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(Uuid::from(user_id))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        records.into_iter().map(TryInto::try_into).collect()
    }
}

pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    async fn create(&self, message: Message) -> RepositoryResult<Message> {
        let record = sqlx::query_as::<_, MessageRecord>(
            r#"
            INSERT INTO messages (id, chat_id, sender_id, content, reply_to_id, created_at,
                                  read_at, is_deleted, deleted_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, chat_id, sender_id, content, reply_to_id, created_at,
                      read_at, is_deleted, deleted_at
            "#,
        )
        .bind(Uuid::from(message.id))
        .bind(Uuid::from(message.chat_id))
        .bind(Uuid::from(message.sender_id))
        .bind(message.content.as_str())
        .bind(message.reply_to.map(Uuid::from))
        .bind(message.created_at)
        .bind(message.read_at)
        .bind(message.deleted)
        .bind(message.deleted_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        record.try_into()
    }

    async fn update(&self, message: Message) -> RepositoryResult<Message> {
        // 只有已读/删除标记是可变的
        let record = sqlx::query_as::<_, MessageRecord>(
            r#"
            UPDATE messages
            SET read_at = $2, is_deleted = $3, deleted_at = $4
            WHERE id = $1
            RETURNING id, chat_id, sender_id, content, reply_to_id, created_at,
                      read_at, is_deleted, deleted_at
            "#,
        )
        .bind(Uuid::from(message.id))
        .bind(message.read_at)
        .bind(message.deleted)
        .bind(message.deleted_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?
        .ok_or(RepositoryError::NotFound)?;

        record.try_into()
    }

    async fn find_by_id(&self, id: MessageId) -> RepositoryResult<Option<Message>> {
        sqlx::query_as::<_, MessageRecord>(
            r#"
            SELECT id, chat_id, sender_id, content, reply_to_id, created_at,
                   read_at, is_deleted, deleted_at
            FROM messages WHERE id = $1
            "#,
        )
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?
        .map(TryInto::try_into)
        .transpose()
    }

    async fn count_for_chat(&self, chat_id: ChatId) -> RepositoryResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE chat_id = $1")
            .bind(Uuid::from(chat_id))
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        Ok(count as u64)
    }

    async fn list_page(
        &self,
        chat_id: ChatId,
        limit: u32,
        offset: u64,
    ) -> RepositoryResult<Vec<Message>> {
        // seq 是 BIGSERIAL，消除同一时间戳下的排序歧义
        let records = sqlx::query_as::<_, MessageRecord>(
            r#"
            SELECT id, chat_id, sender_id, content, reply_to_id, created_at,
                   read_at, is_deleted, deleted_at
            FROM messages
            WHERE chat_id = $1
            ORDER BY created_at DESC, seq DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(Uuid::from(chat_id))
        .bind(i64::from(limit))
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        records.into_iter().map(TryInto::try_into).collect()
    }
}
