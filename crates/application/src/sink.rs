//! 事件出口能力
//!
//! 会话服务在状态迁移成功后同步调用注入的事件出口，由出口决定
//! 如何投递。投递是尽力而为的，出口永远不向调用方返回错误。

use async_trait::async_trait;
use domain::ChatEvent;

#[async_trait]
pub trait EventSink: Send + Sync {
    async fn publish(&self, event: ChatEvent);
}

/// 丢弃所有事件的空实现
#[derive(Debug, Default)]
pub struct NoopEventSink;

#[async_trait]
impl EventSink for NoopEventSink {
    async fn publish(&self, _event: ChatEvent) {}
}

/// 记录所有事件的实现（用于测试）
pub mod recording {
    use super::*;
    use tokio::sync::Mutex;

    #[derive(Default)]
    pub struct RecordingEventSink {
        events: Mutex<Vec<ChatEvent>>,
    }

    impl RecordingEventSink {
        pub fn new() -> Self {
            Self::default()
        }

        pub async fn events(&self) -> Vec<ChatEvent> {
            self.events.lock().await.clone()
        }
    }

    #[async_trait]
    impl EventSink for RecordingEventSink {
        async fn publish(&self, event: ChatEvent) {
            self.events.lock().await.push(event);
        }
    }
}
