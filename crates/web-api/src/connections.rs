//! 连接注册表
//!
//! 端点到发送句柄的映射。投递路由通过 EventTransport 接口向这里
//! 推送事件；每个 WebSocket 连接的写端由一个 mpsc 通道解耦。

use std::collections::HashMap;

use application::{EventTransport, TransportError};
use async_trait::async_trait;
use domain::{ChatEvent, EndpointId};
use tokio::sync::{mpsc, RwLock};

use crate::events::ServerEvent;

#[derive(Default)]
pub struct ConnectionRegistry {
    senders: RwLock<HashMap<EndpointId, mpsc::UnboundedSender<ServerEvent>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, endpoint: EndpointId, sender: mpsc::UnboundedSender<ServerEvent>) {
        self.senders.write().await.insert(endpoint, sender);
    }

    pub async fn remove(&self, endpoint: EndpointId) {
        self.senders.write().await.remove(&endpoint);
    }
}

#[async_trait]
impl EventTransport for ConnectionRegistry {
    async fn push(&self, endpoint: EndpointId, event: &ChatEvent) -> Result<(), TransportError> {
        let senders = self.senders.read().await;
        let sender = senders.get(&endpoint).ok_or(TransportError::EndpointGone)?;

        sender
            .send(ServerEvent::from(event))
            .map_err(|_| TransportError::EndpointGone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use domain::{Chat, ChatId, UserId};

    fn pending_chat() -> Chat {
        Chat::request(ChatId::new(), UserId::new(), UserId::new(), Utc::now()).unwrap()
    }

    #[tokio::test]
    async fn test_push_reaches_registered_endpoint() {
        let registry = ConnectionRegistry::new();
        let endpoint = EndpointId::new();
        let (tx, mut rx) = mpsc::unbounded_channel();

        registry.register(endpoint, tx).await;

        // 未注册的端点推送失败
        let result = registry
            .push(
                EndpointId::new(),
                &ChatEvent::ChatRequested {
                    chat: pending_chat(),
                },
            )
            .await;
        assert!(matches!(result, Err(TransportError::EndpointGone)));

        registry
            .push(
                endpoint,
                &ChatEvent::ChatRequested {
                    chat: pending_chat(),
                },
            )
            .await
            .unwrap();
        assert!(matches!(
            rx.recv().await,
            Some(ServerEvent::ChatRequest { .. })
        ));
    }

    #[tokio::test]
    async fn test_push_to_removed_endpoint_fails() {
        let registry = ConnectionRegistry::new();
        let endpoint = EndpointId::new();
        let (tx, _rx) = mpsc::unbounded_channel();

        registry.register(endpoint, tx).await;
        registry.remove(endpoint).await;

        let result = registry
            .push(endpoint, &ChatEvent::ChatRequested { chat: pending_chat() })
            .await;
        assert!(matches!(result, Err(TransportError::EndpointGone)));
    }
}
