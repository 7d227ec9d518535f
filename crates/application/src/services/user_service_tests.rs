//! 用户服务单元测试

use std::sync::Arc;

use domain::{DomainError, RepositoryError};

use crate::clock::SystemClock;
use crate::error::ApplicationError;
use crate::memory::MemoryUserRepository;
use crate::password::BcryptPasswordHasher;
use crate::services::{EnterRequest, RegisterUserRequest, UserService, UserServiceDependencies};

fn test_service() -> UserService {
    UserService::new(UserServiceDependencies {
        user_repository: Arc::new(MemoryUserRepository::new()),
        password_hasher: Arc::new(BcryptPasswordHasher::new(4)),
        clock: Arc::new(SystemClock),
    })
}

fn register(username: &str, password: Option<&str>) -> RegisterUserRequest {
    RegisterUserRequest {
        username: username.to_owned(),
        password: password.map(str::to_owned),
        email: None,
    }
}

#[tokio::test]
async fn test_register_trims_and_validates_username() {
    let service = test_service();

    let user = service.register(register("  alice  ", None)).await.unwrap();
    assert_eq!(user.username.as_str(), "alice");

    let result = service.register(register("ab", None)).await;
    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::InvalidArgument { .. }))
    ));
}

#[tokio::test]
async fn test_register_duplicate_username_is_conflict() {
    let service = test_service();
    service.register(register("alice", None)).await.unwrap();

    let result = service.register(register("alice", None)).await;
    assert!(matches!(
        result,
        Err(ApplicationError::Repository(RepositoryError::Conflict))
    ));
}

#[tokio::test]
async fn test_enter_creates_user_on_first_visit() {
    let service = test_service();

    let user = service
        .enter(EnterRequest {
            username: "alice".to_owned(),
            password: None,
        })
        .await
        .unwrap();
    assert_eq!(user.username.as_str(), "alice");

    // 再次进入返回同一个用户
    let again = service
        .enter(EnterRequest {
            username: "alice".to_owned(),
            password: None,
        })
        .await
        .unwrap();
    assert_eq!(again.id, user.id);
}

#[tokio::test]
async fn test_enter_with_credential_requires_matching_password() {
    let service = test_service();
    service
        .register(register("alice", Some("s3cret")))
        .await
        .unwrap();

    // 正确密码
    assert!(service
        .enter(EnterRequest {
            username: "alice".to_owned(),
            password: Some("s3cret".to_owned()),
        })
        .await
        .is_ok());

    // 错误密码
    let result = service
        .enter(EnterRequest {
            username: "alice".to_owned(),
            password: Some("wrong".to_owned()),
        })
        .await;
    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::Unauthorized))
    ));

    // 缺少密码
    let result = service
        .enter(EnterRequest {
            username: "alice".to_owned(),
            password: None,
        })
        .await;
    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::Unauthorized))
    ));
}

#[tokio::test]
async fn test_search_is_case_insensitive_and_respects_exclude() {
    let service = test_service();
    let alice = service.register(register("Alice", None)).await.unwrap();
    service.register(register("alicia", None)).await.unwrap();
    service.register(register("bob", None)).await.unwrap();

    let found = service.search("ALI", None).await.unwrap();
    assert_eq!(found.len(), 2);

    let found = service.search("ali", Some(alice.id)).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].username.as_str(), "alicia");

    // 空白查询返回空集
    let found = service.search("   ", None).await.unwrap();
    assert!(found.is_empty());
}

#[tokio::test]
async fn test_list_excludes_requested_user() {
    let service = test_service();
    let alice = service.register(register("alice", None)).await.unwrap();
    service.register(register("bob", None)).await.unwrap();

    let all = service.list(None).await.unwrap();
    assert_eq!(all.len(), 2);

    let others = service.list(Some(alice.id)).await.unwrap();
    assert_eq!(others.len(), 1);
    assert_eq!(others[0].username.as_str(), "bob");
}
