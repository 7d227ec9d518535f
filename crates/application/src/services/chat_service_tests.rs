//! 会话服务单元测试
//!
//! 覆盖邀请/接受状态机、按无序对去重、读侧列表组装与事件发布。

use std::sync::Arc;

use domain::{ChatEvent, ChatStatus, DomainError, User};

use crate::clock::SystemClock;
use crate::error::ApplicationError;
use crate::memory::{MemoryChatRepository, MemoryUserRepository};
use crate::password::BcryptPasswordHasher;
use crate::services::{
    ChatService, ChatServiceDependencies, RegisterUserRequest, RequestChatRequest, UserService,
    UserServiceDependencies,
};
use crate::sink::recording::RecordingEventSink;

struct TestEnv {
    user_service: UserService,
    chat_service: ChatService,
    sink: Arc<RecordingEventSink>,
}

/// 在内存仓储上搭建服务
fn test_env() -> TestEnv {
    let user_repository = Arc::new(MemoryUserRepository::new());
    let chat_repository = Arc::new(MemoryChatRepository::new());
    let clock = Arc::new(SystemClock);
    let sink = Arc::new(RecordingEventSink::new());

    let user_service = UserService::new(UserServiceDependencies {
        user_repository: user_repository.clone(),
        // 测试里用低 cost，避免无谓的哈希耗时
        password_hasher: Arc::new(BcryptPasswordHasher::new(4)),
        clock: clock.clone(),
    });

    let chat_service = ChatService::new(ChatServiceDependencies {
        chat_repository,
        user_directory: user_repository,
        clock,
        event_sink: sink.clone(),
    });

    TestEnv {
        user_service,
        chat_service,
        sink,
    }
}

async fn create_user(env: &TestEnv, username: &str) -> User {
    env.user_service
        .register(RegisterUserRequest {
            username: username.to_owned(),
            password: None,
            email: None,
        })
        .await
        .unwrap()
}

fn request(from: &User, to: &User) -> RequestChatRequest {
    RequestChatRequest {
        from_user_id: from.id.to_string(),
        to_user_id: to.id.to_string(),
    }
}

#[tokio::test]
async fn test_request_chat_creates_pending() {
    let env = test_env();
    let alice = create_user(&env, "alice").await;
    let bob = create_user(&env, "bob").await;

    let chat = env
        .chat_service
        .request_chat(request(&alice, &bob))
        .await
        .unwrap();

    assert_eq!(chat.status, ChatStatus::Pending);
    assert_eq!(chat.initiated_by, alice.id);
    assert!(chat.is_participant(bob.id));
}

#[tokio::test]
async fn test_request_chat_is_idempotent_in_both_orders() {
    let env = test_env();
    let alice = create_user(&env, "alice").await;
    let bob = create_user(&env, "bob").await;

    let first = env
        .chat_service
        .request_chat(request(&alice, &bob))
        .await
        .unwrap();
    // 同一对参与者，反向再次请求，返回同一个会话
    let second = env
        .chat_service
        .request_chat(request(&bob, &alice))
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.initiated_by, alice.id);
}

#[tokio::test]
async fn test_request_chat_with_self_is_invalid() {
    let env = test_env();
    let alice = create_user(&env, "alice").await;

    let result = env.chat_service.request_chat(request(&alice, &alice)).await;

    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::InvalidArgument { .. }))
    ));
}

#[tokio::test]
async fn test_request_chat_with_malformed_id_is_invalid() {
    let env = test_env();
    let alice = create_user(&env, "alice").await;

    let result = env
        .chat_service
        .request_chat(RequestChatRequest {
            from_user_id: alice.id.to_string(),
            to_user_id: "not-a-uuid".to_owned(),
        })
        .await;

    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::InvalidArgument { .. }))
    ));
}

#[tokio::test]
async fn test_request_chat_with_unknown_peer_is_not_found() {
    let env = test_env();
    let alice = create_user(&env, "alice").await;

    let result = env
        .chat_service
        .request_chat(RequestChatRequest {
            from_user_id: alice.id.to_string(),
            to_user_id: uuid::Uuid::new_v4().to_string(),
        })
        .await;

    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::NotFound { .. }))
    ));
}

#[tokio::test]
async fn test_accept_chat_by_invited() {
    let env = test_env();
    let alice = create_user(&env, "alice").await;
    let bob = create_user(&env, "bob").await;

    let chat = env
        .chat_service
        .request_chat(request(&alice, &bob))
        .await
        .unwrap();

    let accepted = env
        .chat_service
        .accept_chat(&chat.id.to_string(), &bob.id.to_string())
        .await
        .unwrap();

    assert_eq!(accepted.status, ChatStatus::Accepted);
    assert!(accepted.accepted_at.is_some());
}

#[tokio::test]
async fn test_initiator_cannot_accept_own_request() {
    let env = test_env();
    let alice = create_user(&env, "alice").await;
    let bob = create_user(&env, "bob").await;

    let chat = env
        .chat_service
        .request_chat(request(&alice, &bob))
        .await
        .unwrap();

    let result = env
        .chat_service
        .accept_chat(&chat.id.to_string(), &alice.id.to_string())
        .await;

    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::Forbidden { .. }))
    ));
}

#[tokio::test]
async fn test_accept_twice_is_conflict() {
    let env = test_env();
    let alice = create_user(&env, "alice").await;
    let bob = create_user(&env, "bob").await;

    let chat = env
        .chat_service
        .request_chat(request(&alice, &bob))
        .await
        .unwrap();
    env.chat_service
        .accept_chat(&chat.id.to_string(), &bob.id.to_string())
        .await
        .unwrap();

    let result = env
        .chat_service
        .accept_chat(&chat.id.to_string(), &bob.id.to_string())
        .await;

    match result {
        Err(ApplicationError::Domain(DomainError::Conflict { message })) => {
            // 错误信息包含当前状态
            assert!(message.contains("accepted"));
        }
        other => panic!("expected conflict, got {other:?}"),
    }
}

#[tokio::test]
async fn test_accept_unknown_chat_is_not_found() {
    let env = test_env();
    let bob = create_user(&env, "bob").await;

    let result = env
        .chat_service
        .accept_chat(&uuid::Uuid::new_v4().to_string(), &bob.id.to_string())
        .await;

    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::NotFound { .. }))
    ));
}

#[tokio::test]
async fn test_list_chats_annotates_other_participant() {
    let env = test_env();
    let alice = create_user(&env, "alice").await;
    let bob = create_user(&env, "bob").await;
    let carol = create_user(&env, "carol").await;

    env.chat_service
        .request_chat(request(&alice, &bob))
        .await
        .unwrap();
    env.chat_service
        .request_chat(request(&carol, &alice))
        .await
        .unwrap();

    let chats = env
        .chat_service
        .list_chats_for_user(&alice.id.to_string())
        .await
        .unwrap();

    assert_eq!(chats.len(), 2);
    // 每个条目标注的是对方，不是自己
    let others: Vec<&str> = chats.iter().map(|c| c.other_username.as_str()).collect();
    assert!(others.contains(&"bob"));
    assert!(others.contains(&"carol"));
}

#[tokio::test]
async fn test_events_published_on_transitions() {
    let env = test_env();
    let alice = create_user(&env, "alice").await;
    let bob = create_user(&env, "bob").await;

    let chat = env
        .chat_service
        .request_chat(request(&alice, &bob))
        .await
        .unwrap();
    // 幂等的重复请求不再发布事件
    env.chat_service
        .request_chat(request(&bob, &alice))
        .await
        .unwrap();
    env.chat_service
        .accept_chat(&chat.id.to_string(), &bob.id.to_string())
        .await
        .unwrap();

    let events = env.sink.events().await;
    assert_eq!(events.len(), 2);
    assert!(matches!(events[0], ChatEvent::ChatRequested { .. }));
    assert!(matches!(events[1], ChatEvent::ChatAccepted { .. }));
}
