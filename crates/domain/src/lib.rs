//! 双人聊天系统核心领域模型
//!
//! 包含用户、会话、消息等核心实体，以及会话状态机规则和仓储接口。

pub mod chat;
pub mod errors;
pub mod events;
pub mod message;
pub mod repository;
pub mod user;
pub mod value_objects;

// 重新导出常用类型
pub use chat::*;
pub use errors::*;
pub use events::*;
pub use message::*;
pub use repository::*;
pub use user::*;
pub use value_objects::*;
