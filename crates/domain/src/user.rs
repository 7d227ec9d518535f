//! 用户实体定义

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{PasswordHash, UserEmail, UserId, Username};

/// 用户实体
///
/// 用户名在存储层精确匹配唯一；邮箱可选，存在时唯一。
/// 用户由显式注册或首次 enter 创建，本核心不删除用户。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: Username,
    pub email: Option<UserEmail>,
    #[serde(skip_serializing)] // 凭证哈希不暴露给客户端
    pub password: Option<PasswordHash>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn register(
        id: UserId,
        username: Username,
        email: Option<UserEmail>,
        password: Option<PasswordHash>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            username,
            email,
            password,
            created_at: now,
        }
    }

    /// 是否设置了登录凭证
    pub fn has_credential(&self) -> bool {
        self.password.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_user() {
        let id = UserId::new();
        let user = User::register(
            id,
            Username::parse("alice").unwrap(),
            None,
            None,
            Utc::now(),
        );

        assert_eq!(user.id, id);
        assert_eq!(user.username.as_str(), "alice");
        assert!(!user.has_credential());
    }
}
