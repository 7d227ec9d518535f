//! 用户服务
//!
//! 注册、进入（首次进入即注册）、列表与检索。凭证哈希通过
//! PasswordHasher 适配器处理，服务本身不接触明文存储。

use std::sync::Arc;

use domain::{DomainError, RepositoryError, User, UserEmail, UserId, UserRepository, Username};

use crate::{clock::Clock, error::ApplicationError, password::PasswordHasher};

#[derive(Debug, Clone)]
pub struct RegisterUserRequest {
    pub username: String,
    pub password: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EnterRequest {
    pub username: String,
    pub password: Option<String>,
}

pub struct UserServiceDependencies {
    pub user_repository: Arc<dyn UserRepository>,
    pub password_hasher: Arc<dyn PasswordHasher>,
    pub clock: Arc<dyn Clock>,
}

pub struct UserService {
    deps: UserServiceDependencies,
}

impl UserService {
    pub fn new(deps: UserServiceDependencies) -> Self {
        Self { deps }
    }

    /// 显式注册。用户名重复时向调用方暴露冲突。
    pub async fn register(&self, request: RegisterUserRequest) -> Result<User, ApplicationError> {
        let username = Username::parse(request.username)?;
        let email = request.email.map(UserEmail::parse).transpose()?;

        let password = match request.password.as_deref() {
            Some(plaintext) => Some(self.deps.password_hasher.hash(plaintext).await?),
            None => None,
        };

        let user = User::register(
            UserId::new(),
            username,
            email,
            password,
            self.deps.clock.now(),
        );

        let stored = self.deps.user_repository.create(user).await?;

        tracing::info!(user_id = %stored.id, username = %stored.username, "用户已注册");
        Ok(stored)
    }

    /// 进入。用户名不存在时首次进入即注册；已存在且设置过凭证时
    /// 必须提供匹配的密码。
    pub async fn enter(&self, request: EnterRequest) -> Result<User, ApplicationError> {
        let username = Username::parse(request.username)?;

        if let Some(user) = self
            .deps
            .user_repository
            .find_by_username(username.as_str())
            .await?
        {
            self.verify_credential(&user, request.password.as_deref())
                .await?;
            return Ok(user);
        }

        let password = match request.password.as_deref() {
            Some(plaintext) => Some(self.deps.password_hasher.hash(plaintext).await?),
            None => None,
        };

        let user = User::register(
            UserId::new(),
            username.clone(),
            None,
            password,
            self.deps.clock.now(),
        );

        match self.deps.user_repository.create(user).await {
            Ok(created) => {
                tracing::info!(user_id = %created.id, username = %created.username, "首次进入，用户已创建");
                Ok(created)
            }
            // 并发的首次进入：另一个请求已经创建了同名用户，重取并走校验
            Err(RepositoryError::Conflict) => {
                let existing = self
                    .deps
                    .user_repository
                    .find_by_username(username.as_str())
                    .await?
                    .ok_or(RepositoryError::Conflict)?;
                self.verify_credential(&existing, request.password.as_deref())
                    .await?;
                Ok(existing)
            }
            Err(err) => Err(err.into()),
        }
    }

    pub async fn list(&self, exclude: Option<UserId>) -> Result<Vec<User>, ApplicationError> {
        Ok(self.deps.user_repository.list(exclude).await?)
    }

    /// 用户名大小写不敏感检索。空查询返回空结果。
    pub async fn search(
        &self,
        query: &str,
        exclude: Option<UserId>,
    ) -> Result<Vec<User>, ApplicationError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.deps.user_repository.search(query, exclude).await?)
    }

    async fn verify_credential(
        &self,
        user: &User,
        password: Option<&str>,
    ) -> Result<(), ApplicationError> {
        let Some(stored) = &user.password else {
            // 未设置凭证的用户可直接进入
            return Ok(());
        };

        let Some(plaintext) = password else {
            return Err(DomainError::Unauthorized.into());
        };

        if !self.deps.password_hasher.verify(plaintext, stored).await? {
            return Err(DomainError::Unauthorized.into());
        }
        Ok(())
    }
}
