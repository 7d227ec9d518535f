//! Web API 层
//!
//! HTTP 路由、WebSocket 连接生命周期与错误到状态码的映射。

pub mod connections;
pub mod error;
pub mod events;
pub mod routes;
pub mod state;
pub mod websocket;

pub use connections::ConnectionRegistry;
pub use error::ApiError;
pub use events::{ClientEvent, ServerEvent};
pub use routes::router;
pub use state::AppState;
