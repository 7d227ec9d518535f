//! 会话服务
//!
//! 邀请/接受状态机的唯一写入方。状态迁移成功后通过注入的事件
//! 出口同步发布领域事件，由出口（投递路由）决定推送给谁。

use std::sync::Arc;

use domain::{
    Chat, ChatEvent, ChatId, ChatRepository, DomainError, RepositoryError, UserId,
};

use crate::{
    clock::Clock,
    directory::UserDirectory,
    dto::ChatSummaryDto,
    error::ApplicationError,
    sink::EventSink,
};

#[derive(Debug, Clone)]
pub struct RequestChatRequest {
    pub from_user_id: String,
    pub to_user_id: String,
}

pub struct ChatServiceDependencies {
    pub chat_repository: Arc<dyn ChatRepository>,
    pub user_directory: Arc<dyn UserDirectory>,
    pub clock: Arc<dyn Clock>,
    pub event_sink: Arc<dyn EventSink>,
}

pub struct ChatService {
    deps: ChatServiceDependencies,
}

impl ChatService {
    pub fn new(deps: ChatServiceDependencies) -> Self {
        Self { deps }
    }

    /// 发起会话请求。
    ///
    /// 同一无序参与者对至多存在一个会话：已存在时原样返回（幂等），
    /// 并发重复创建撞上唯一约束时重取获胜记录，不向调用方暴露冲突。
    pub async fn request_chat(&self, request: RequestChatRequest) -> Result<Chat, ApplicationError> {
        let from = UserId::parse(&request.from_user_id)?;
        let to = UserId::parse(&request.to_user_id)?;
        if from == to {
            return Err(DomainError::invalid_argument(
                "toUserId",
                "cannot request a chat with yourself",
            )
            .into());
        }

        if !self.deps.user_directory.exists(from).await? {
            return Err(DomainError::not_found("user", from).into());
        }
        if !self.deps.user_directory.exists(to).await? {
            return Err(DomainError::not_found("user", to).into());
        }

        if let Some(existing) = self.deps.chat_repository.find_by_pair(from, to).await? {
            return Ok(existing);
        }

        let chat = Chat::request(ChatId::new(), from, to, self.deps.clock.now())?;

        match self.deps.chat_repository.create(chat).await {
            Ok(created) => {
                tracing::info!(
                    chat_id = %created.id,
                    from = %from,
                    to = %to,
                    "会话请求已创建"
                );
                self.deps
                    .event_sink
                    .publish(ChatEvent::ChatRequested {
                        chat: created.clone(),
                    })
                    .await;
                Ok(created)
            }
            // 并发创建输掉了唯一约束竞争：重取获胜记录
            Err(RepositoryError::Conflict) => {
                let winner = self
                    .deps
                    .chat_repository
                    .find_by_pair(from, to)
                    .await?
                    .ok_or(RepositoryError::Conflict)?;
                Ok(winner)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// 接受会话请求。规则在 Chat 实体上：只有被邀请方可以接受，
    /// 且仅允许 Pending → Accepted。
    pub async fn accept_chat(
        &self,
        chat_id: &str,
        user_id: &str,
    ) -> Result<Chat, ApplicationError> {
        let chat_id = ChatId::parse(chat_id)?;
        let user_id = UserId::parse(user_id)?;

        let mut chat = self
            .deps
            .chat_repository
            .find_by_id(chat_id)
            .await?
            .ok_or_else(|| DomainError::not_found("chat", chat_id))?;

        chat.accept(user_id, self.deps.clock.now())?;

        let updated = self.deps.chat_repository.update(chat).await?;

        tracing::info!(chat_id = %updated.id, user_id = %user_id, "会话已接受");
        self.deps
            .event_sink
            .publish(ChatEvent::ChatAccepted {
                chat: updated.clone(),
            })
            .await;

        Ok(updated)
    }

    /// 用户参与的全部会话，按创建时间倒序，并标注对方参与者的
    /// 标识与用户名（读侧组装）。
    pub async fn list_chats_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<ChatSummaryDto>, ApplicationError> {
        let user_id = UserId::parse(user_id)?;
        let chats = self.deps.chat_repository.list_for_user(user_id).await?;

        let mut summaries = Vec::with_capacity(chats.len());
        for chat in &chats {
            let Some(other_id) = chat.other_participant(user_id) else {
                continue;
            };
            match self.deps.user_directory.lookup(other_id).await? {
                Some(other) => {
                    summaries.push(ChatSummaryDto::new(chat, other_id, &other.username));
                }
                None => {
                    // 参与者永远不会被删除；查不到说明存储出现了不一致
                    tracing::warn!(
                        chat_id = %chat.id,
                        other_id = %other_id,
                        "会话参与者在用户目录中缺失，跳过该条目"
                    );
                }
            }
        }
        Ok(summaries)
    }

    pub async fn get_chat(&self, chat_id: ChatId) -> Result<Option<Chat>, ApplicationError> {
        Ok(self.deps.chat_repository.find_by_id(chat_id).await?)
    }

    /// 共享的授权原语：会话必须存在且调用者是参与者。
    pub async fn require_participant(
        &self,
        chat_id: ChatId,
        user_id: UserId,
    ) -> Result<Chat, ApplicationError> {
        let chat = self
            .deps
            .chat_repository
            .find_by_id(chat_id)
            .await?
            .ok_or_else(|| DomainError::not_found("chat", chat_id))?;

        if !chat.is_participant(user_id) {
            return Err(DomainError::forbidden("not a participant of this chat").into());
        }
        Ok(chat)
    }
}
