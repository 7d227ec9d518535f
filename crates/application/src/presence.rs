//! 在线状态注册表
//!
//! 维护用户到连接端点的瞬时映射，只存在于进程内存中，进程重启后
//! 所有用户视为离线，直到重新连接。同一用户在旧端点清理前重连时
//! 采用后写覆盖，不做多设备扇出。
//!
//! 已知限制：连接异常崩溃且未发出断开通知时，旧条目会残留到该
//! 端点被复用或进程重启为止。

use async_trait::async_trait;
use domain::{EndpointId, UserId};

/// 在线状态注册表 trait
///
/// 连接、断开与投递查询在不相关的任务间并发发生，实现必须自带
/// 同步原语，由构造方注入共享，不允许进程级全局变量。
#[async_trait]
pub trait PresenceRegistry: Send + Sync {
    /// 用户在某个端点上线。同一用户重复连接时覆盖旧端点。
    async fn connect(&self, user_id: UserId, endpoint: EndpointId);

    /// 按端点断开。移除值等于该端点的唯一条目（若有）。
    async fn disconnect(&self, endpoint: EndpointId);

    /// 解析用户当前的在线端点。
    async fn resolve(&self, user_id: UserId) -> Option<EndpointId>;
}

/// 内存实现
pub mod memory {
    use super::*;
    use std::collections::HashMap;
    use tokio::sync::RwLock;

    #[derive(Default)]
    pub struct MemoryPresenceRegistry {
        entries: RwLock<HashMap<UserId, EndpointId>>,
    }

    impl MemoryPresenceRegistry {
        pub fn new() -> Self {
            Self::default()
        }
    }

    #[async_trait]
    impl PresenceRegistry for MemoryPresenceRegistry {
        async fn connect(&self, user_id: UserId, endpoint: EndpointId) {
            let mut entries = self.entries.write().await;
            let previous = entries.insert(user_id, endpoint);

            if let Some(previous) = previous {
                tracing::debug!(
                    user_id = %user_id,
                    old_endpoint = %previous,
                    new_endpoint = %endpoint,
                    "用户重连，覆盖旧端点"
                );
            }
        }

        async fn disconnect(&self, endpoint: EndpointId) {
            let mut entries = self.entries.write().await;
            // 这个规模下线性扫描足够
            entries.retain(|_, value| *value != endpoint);
        }

        async fn resolve(&self, user_id: UserId) -> Option<EndpointId> {
            self.entries.read().await.get(&user_id).copied()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::memory::MemoryPresenceRegistry;
    use super::*;

    #[tokio::test]
    async fn test_connect_and_resolve() {
        let registry = MemoryPresenceRegistry::new();
        let user = UserId::new();
        let endpoint = EndpointId::new();

        registry.connect(user, endpoint).await;
        assert_eq!(registry.resolve(user).await, Some(endpoint));
    }

    #[tokio::test]
    async fn test_reconnect_is_last_write_wins() {
        let registry = MemoryPresenceRegistry::new();
        let user = UserId::new();
        let (e1, e2) = (EndpointId::new(), EndpointId::new());

        registry.connect(user, e1).await;
        registry.connect(user, e2).await;
        assert_eq!(registry.resolve(user).await, Some(e2));

        registry.disconnect(e2).await;
        assert_eq!(registry.resolve(user).await, None);
    }

    #[tokio::test]
    async fn test_disconnect_stale_endpoint_keeps_current() {
        let registry = MemoryPresenceRegistry::new();
        let user = UserId::new();
        let (e1, e2) = (EndpointId::new(), EndpointId::new());

        registry.connect(user, e1).await;
        registry.connect(user, e2).await;
        // 旧端点的迟到断开不影响当前映射
        registry.disconnect(e1).await;
        assert_eq!(registry.resolve(user).await, Some(e2));
    }

    #[tokio::test]
    async fn test_disconnect_unknown_endpoint_is_noop() {
        let registry = MemoryPresenceRegistry::new();
        let user = UserId::new();
        let endpoint = EndpointId::new();

        registry.connect(user, endpoint).await;
        registry.disconnect(EndpointId::new()).await;
        assert_eq!(registry.resolve(user).await, Some(endpoint));
    }
}
