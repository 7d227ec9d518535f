//! 用户目录能力
//!
//! 会话服务只需要"用户是否存在/查询用户"两个能力，不关心凭证存储，
//! 因此抽成独立 trait，任何 UserRepository 都自动满足。

use async_trait::async_trait;
use domain::{RepositoryResult, User, UserId, UserRepository};

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn exists(&self, id: UserId) -> RepositoryResult<bool>;
    async fn lookup(&self, id: UserId) -> RepositoryResult<Option<User>>;
}

#[async_trait]
impl<T: UserRepository + ?Sized> UserDirectory for T {
    async fn exists(&self, id: UserId) -> RepositoryResult<bool> {
        Ok(self.find_by_id(id).await?.is_some())
    }

    async fn lookup(&self, id: UserId) -> RepositoryResult<Option<User>> {
        self.find_by_id(id).await
    }
}
