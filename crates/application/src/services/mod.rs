mod chat_service;
mod message_service;
mod user_service;

#[cfg(test)]
mod chat_service_tests;
#[cfg(test)]
mod user_service_tests;

pub use chat_service::{ChatService, ChatServiceDependencies, RequestChatRequest};
pub use message_service::{
    DeletedMessage, ListMessagesRequest, MessageService, MessageServiceDependencies,
    SendMessageRequest, SentMessage,
};
pub use user_service::{EnterRequest, RegisterUserRequest, UserService, UserServiceDependencies};
