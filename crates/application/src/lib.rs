//! 应用层实现。
//!
//! 这里提供围绕领域模型的用例服务，处理输入校验、会话授权、
//! 以及对外部适配器（密码哈希、在线状态、事件投递）的抽象。

pub mod clock;
pub mod delivery;
pub mod directory;
pub mod dto;
pub mod error;
pub mod memory;
pub mod password;
pub mod presence;
pub mod services;
pub mod sink;

pub use clock::{Clock, SystemClock};
pub use delivery::{DeliveryRouter, EventTransport, TransportError};
pub use directory::UserDirectory;
pub use dto::{ChatDto, ChatSummaryDto, MessageDto, MessagePageDto, UserDto};
pub use error::ApplicationError;
pub use password::{BcryptPasswordHasher, PasswordHasher, PasswordHasherError};
pub use presence::{memory::MemoryPresenceRegistry, PresenceRegistry};
pub use services::{
    ChatService, ChatServiceDependencies, MessageService, MessageServiceDependencies, UserService,
    UserServiceDependencies,
};
pub use sink::EventSink;
