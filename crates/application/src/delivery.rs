//! 投递路由
//!
//! 纯扇出逻辑：根据事件类型确定目标参与者，经在线状态注册表解析
//! 端点后推送。离线目标直接跳过——消息账本才是持久记录，对方下次
//! 拉取时自然看到。传输失败只记日志，不向上传播，也不重试。

use std::sync::Arc;

use async_trait::async_trait;
use domain::{ChatEvent, EndpointId, UserId};
use thiserror::Error;

use crate::presence::PresenceRegistry;
use crate::sink::EventSink;

#[derive(Debug, Error)]
pub enum TransportError {
    /// 端点已关闭或不再注册
    #[error("endpoint gone")]
    EndpointGone,
    #[error("transport failed: {0}")]
    Failed(String),
}

impl TransportError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// 面向单个端点的事件推送能力，由连接层实现。
#[async_trait]
pub trait EventTransport: Send + Sync {
    async fn push(&self, endpoint: EndpointId, event: &ChatEvent) -> Result<(), TransportError>;
}

/// 投递路由器
///
/// 不持有任何持久状态，也从不修改持久状态。
pub struct DeliveryRouter {
    presence: Arc<dyn PresenceRegistry>,
    transport: Arc<dyn EventTransport>,
}

impl DeliveryRouter {
    pub fn new(presence: Arc<dyn PresenceRegistry>, transport: Arc<dyn EventTransport>) -> Self {
        Self {
            presence,
            transport,
        }
    }

    /// 将事件推送给所有在线目标，每个在线接收者至多收到一次。
    pub async fn dispatch(&self, event: &ChatEvent) {
        for user_id in Self::targets(event) {
            self.deliver_to(user_id, event).await;
        }
    }

    /// 事件的目标参与者集合。
    fn targets(event: &ChatEvent) -> Vec<UserId> {
        match event {
            // 会话请求只通知被邀请方
            ChatEvent::ChatRequested { chat } => vec![chat.invited()],
            ChatEvent::NewMessage { chat, .. }
            | ChatEvent::ChatAccepted { chat }
            | ChatEvent::MessageDeleted { chat, .. } => chat.participants.to_vec(),
        }
    }

    async fn deliver_to(&self, user_id: UserId, event: &ChatEvent) {
        let Some(endpoint) = self.presence.resolve(user_id).await else {
            tracing::debug!(
                user_id = %user_id,
                event = event.kind(),
                "接收者离线，跳过投递"
            );
            return;
        };

        if let Err(err) = self.transport.push(endpoint, event).await {
            tracing::warn!(
                user_id = %user_id,
                endpoint = %endpoint,
                event = event.kind(),
                error = %err,
                "事件推送失败，丢弃"
            );
        }
    }
}

#[async_trait]
impl EventSink for DeliveryRouter {
    async fn publish(&self, event: ChatEvent) {
        self.dispatch(&event).await;
    }
}
