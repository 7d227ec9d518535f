//! 消息服务
//!
//! 会话范围内的追加式消息账本：发送、分页读取、软删除。
//! 参与者校验委托给会话服务。持久化成功后不做任何投递——
//! 实时推送由上层显式组合（见 web-api 的连接处理）。

use std::sync::Arc;

use domain::{
    Chat, ChatId, ChatStatus, DomainError, Message, MessageContent, MessageId, MessageRepository,
    UserId,
};

use crate::{
    clock::Clock,
    dto::{MessageDto, MessagePageDto},
    error::ApplicationError,
    services::ChatService,
};

const DEFAULT_PAGE_LIMIT: u32 = 50;
const MAX_PAGE_LIMIT: u32 = 100;

#[derive(Debug, Clone)]
pub struct SendMessageRequest {
    pub chat_id: String,
    pub sender_id: String,
    pub content: String,
    pub reply_to_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ListMessagesRequest {
    pub chat_id: String,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// 发送结果。事件需要会话信息才能路由，一并返回给调用方。
#[derive(Debug, Clone)]
pub struct SentMessage {
    pub chat: Chat,
    pub message: Message,
}

/// 删除结果。重复删除是幂等成功，newly_deleted 为 false，
/// 调用方据此避免重复广播删除事件。
#[derive(Debug, Clone)]
pub struct DeletedMessage {
    pub chat: Chat,
    pub message: Message,
    pub newly_deleted: bool,
}

pub struct MessageServiceDependencies {
    pub message_repository: Arc<dyn MessageRepository>,
    pub chat_service: Arc<ChatService>,
    pub clock: Arc<dyn Clock>,
}

pub struct MessageService {
    deps: MessageServiceDependencies,
}

impl MessageService {
    pub fn new(deps: MessageServiceDependencies) -> Self {
        Self { deps }
    }

    /// 发送消息。只有已接受的会话可以写入。
    pub async fn send_message(
        &self,
        request: SendMessageRequest,
    ) -> Result<SentMessage, ApplicationError> {
        let chat_id = ChatId::parse(&request.chat_id)?;
        let sender_id = UserId::parse(&request.sender_id)?;
        let content = MessageContent::new(request.content)?;

        let chat = self
            .deps
            .chat_service
            .require_participant(chat_id, sender_id)
            .await?;

        if chat.status != ChatStatus::Accepted {
            return Err(DomainError::conflict(format!("chat is {}", chat.status)).into());
        }

        let reply_to = match request.reply_to_id.as_deref() {
            Some(raw) => Some(self.resolve_reply_target(chat_id, raw).await?),
            None => None,
        };

        let message = Message::new(
            MessageId::new(),
            chat_id,
            sender_id,
            content,
            reply_to,
            self.deps.clock.now(),
        );

        let stored = self.deps.message_repository.create(message).await?;

        tracing::debug!(
            chat_id = %chat_id,
            message_id = %stored.id,
            sender_id = %sender_id,
            "消息已持久化"
        );

        Ok(SentMessage {
            chat,
            message: stored,
        })
    }

    /// 分页读取消息。
    ///
    /// 存储层按 (created_at, seq) 倒序取页——最新的在前——然后在这里
    /// 反转，调用方拿到的每一页内部都是时间正序。
    pub async fn list_messages(
        &self,
        request: ListMessagesRequest,
    ) -> Result<MessagePageDto, ApplicationError> {
        let chat_id = ChatId::parse(&request.chat_id)?;

        if self.deps.chat_service.get_chat(chat_id).await?.is_none() {
            return Err(DomainError::not_found("chat", chat_id).into());
        }

        let page = request.page.unwrap_or(1).max(1);
        let limit = request
            .limit
            .unwrap_or(DEFAULT_PAGE_LIMIT)
            .clamp(1, MAX_PAGE_LIMIT);
        let offset = u64::from(page - 1) * u64::from(limit);

        let total = self.deps.message_repository.count_for_chat(chat_id).await?;
        let mut messages = self
            .deps
            .message_repository
            .list_page(chat_id, limit, offset)
            .await?;
        messages.reverse();

        let page_count = total.div_ceil(u64::from(limit)) as u32;

        Ok(MessagePageDto {
            messages: messages.iter().map(MessageDto::from).collect(),
            total,
            page,
            page_count,
            limit,
        })
    }

    /// 软删除消息。只有发送者本人可以删除；重复删除幂等。
    pub async fn delete_message(
        &self,
        message_id: &str,
        user_id: &str,
    ) -> Result<DeletedMessage, ApplicationError> {
        let message_id = MessageId::parse(message_id)?;
        let user_id = UserId::parse(user_id)?;

        let mut message = self
            .deps
            .message_repository
            .find_by_id(message_id)
            .await?
            .ok_or_else(|| DomainError::not_found("message", message_id))?;

        if message.sender_id != user_id {
            return Err(DomainError::forbidden("only the sender can delete a message").into());
        }

        let chat = self
            .deps
            .chat_service
            .require_participant(message.chat_id, user_id)
            .await?;

        if message.deleted {
            return Ok(DeletedMessage {
                chat,
                message,
                newly_deleted: false,
            });
        }

        message.soft_delete(self.deps.clock.now());
        let stored = self.deps.message_repository.update(message).await?;

        tracing::debug!(
            chat_id = %stored.chat_id,
            message_id = %stored.id,
            "消息已删除"
        );

        Ok(DeletedMessage {
            chat,
            message: stored,
            newly_deleted: true,
        })
    }

    /// 解析被回复的消息：必须存在且属于同一会话。
    async fn resolve_reply_target(
        &self,
        chat_id: ChatId,
        raw: &str,
    ) -> Result<MessageId, ApplicationError> {
        let reply_to = MessageId::parse(raw)?;
        let target = self
            .deps
            .message_repository
            .find_by_id(reply_to)
            .await?
            .filter(|target| target.chat_id == chat_id)
            .ok_or_else(|| DomainError::not_found("message", reply_to))?;
        Ok(target.id)
    }
}
