//! 内存仓储实现（用于测试）
//!
//! 语义与 PostgreSQL 实现保持一致：同样的唯一约束、同样的排序键。
//! 消息的次级排序键用进程内自增序号模拟 BIGSERIAL。

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use domain::{
    normalized_pair, Chat, ChatId, ChatRepository, Message, MessageId, MessageRepository,
    RepositoryError, RepositoryResult, User, UserId, UserRepository,
};
use tokio::sync::RwLock;

#[derive(Default)]
pub struct MemoryUserRepository {
    users: RwLock<HashMap<UserId, User>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn create(&self, user: User) -> RepositoryResult<User> {
        let mut users = self.users.write().await;

        // 用户名精确匹配唯一；邮箱存在时唯一
        let duplicate = users.values().any(|existing| {
            existing.username == user.username
                || (user.email.is_some() && existing.email == user.email)
        });
        if duplicate {
            return Err(RepositoryError::Conflict);
        }

        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: UserId) -> RepositoryResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> RepositoryResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|user| user.username.as_str() == username)
            .cloned())
    }

    async fn list(&self, exclude: Option<UserId>) -> RepositoryResult<Vec<User>> {
        let users = self.users.read().await;
        let mut result: Vec<User> = users
            .values()
            .filter(|user| Some(user.id) != exclude)
            .cloned()
            .collect();
        result.sort_by(|a, b| a.username.as_str().cmp(b.username.as_str()));
        Ok(result)
    }

    async fn search(&self, query: &str, exclude: Option<UserId>) -> RepositoryResult<Vec<User>> {
        let needle = query.to_lowercase();
        let users = self.users.read().await;
        let mut result: Vec<User> = users
            .values()
            .filter(|user| Some(user.id) != exclude)
            .filter(|user| user.username.as_str().to_lowercase().contains(&needle))
            .cloned()
            .collect();
        result.sort_by(|a, b| a.username.as_str().cmp(b.username.as_str()));
        Ok(result)
    }
}

#[derive(Default)]
pub struct MemoryChatRepository {
    chats: RwLock<HashMap<ChatId, Chat>>,
}

impl MemoryChatRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChatRepository for MemoryChatRepository {
    async fn create(&self, chat: Chat) -> RepositoryResult<Chat> {
        let mut chats = self.chats.write().await;

        // 无序参与者对上的唯一约束
        let pair = chat.pair_key();
        if chats.values().any(|existing| existing.pair_key() == pair) {
            return Err(RepositoryError::Conflict);
        }

        chats.insert(chat.id, chat.clone());
        Ok(chat)
    }

    async fn update(&self, chat: Chat) -> RepositoryResult<Chat> {
        let mut chats = self.chats.write().await;
        if !chats.contains_key(&chat.id) {
            return Err(RepositoryError::NotFound);
        }
        chats.insert(chat.id, chat.clone());
        Ok(chat)
    }

    async fn find_by_id(&self, id: ChatId) -> RepositoryResult<Option<Chat>> {
        Ok(self.chats.read().await.get(&id).cloned())
    }

    async fn find_by_pair(&self, a: UserId, b: UserId) -> RepositoryResult<Option<Chat>> {
        let pair = normalized_pair(a, b);
        Ok(self
            .chats
            .read()
            .await
            .values()
            .find(|chat| chat.pair_key() == pair)
            .cloned())
    }

    async fn list_for_user(&self, user_id: UserId) -> RepositoryResult<Vec<Chat>> {
        let chats = self.chats.read().await;
        let mut result: Vec<Chat> = chats
            .values()
            .filter(|chat| chat.is_participant(user_id))
            .cloned()
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(result)
    }
}

#[derive(Default)]
pub struct MemoryMessageRepository {
    /// (序号, 消息)，序号模拟存储层的自增主键
    messages: RwLock<Vec<(u64, Message)>>,
    next_seq: AtomicU64,
}

impl MemoryMessageRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageRepository for MemoryMessageRepository {
    async fn create(&self, message: Message) -> RepositoryResult<Message> {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        self.messages.write().await.push((seq, message.clone()));
        Ok(message)
    }

    async fn update(&self, message: Message) -> RepositoryResult<Message> {
        let mut messages = self.messages.write().await;
        let slot = messages
            .iter_mut()
            .find(|(_, existing)| existing.id == message.id)
            .ok_or(RepositoryError::NotFound)?;
        slot.1 = message.clone();
        Ok(message)
    }

    async fn find_by_id(&self, id: MessageId) -> RepositoryResult<Option<Message>> {
        Ok(self
            .messages
            .read()
            .await
            .iter()
            .find(|(_, message)| message.id == id)
            .map(|(_, message)| message.clone()))
    }

    async fn count_for_chat(&self, chat_id: ChatId) -> RepositoryResult<u64> {
        Ok(self
            .messages
            .read()
            .await
            .iter()
            .filter(|(_, message)| message.chat_id == chat_id)
            .count() as u64)
    }

    async fn list_page(
        &self,
        chat_id: ChatId,
        limit: u32,
        offset: u64,
    ) -> RepositoryResult<Vec<Message>> {
        let messages = self.messages.read().await;
        let mut page: Vec<(u64, Message)> = messages
            .iter()
            .filter(|(_, message)| message.chat_id == chat_id)
            .cloned()
            .collect();
        // 最新的在前：时间相同时按序号
        page.sort_by(|(seq_a, a), (seq_b, b)| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| seq_b.cmp(seq_a))
        });

        Ok(page
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .map(|(_, message)| message)
            .collect())
    }
}
