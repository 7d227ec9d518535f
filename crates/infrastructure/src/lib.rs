//! 基础设施层：PostgreSQL 仓储实现。

pub mod repository;

pub use repository::{create_pg_pool, PgChatRepository, PgMessageRepository, PgUserRepository};
