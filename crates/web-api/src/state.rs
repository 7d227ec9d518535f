use std::sync::Arc;

use application::{ChatService, DeliveryRouter, MessageService, PresenceRegistry, UserService};

use crate::connections::ConnectionRegistry;

#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService>,
    pub chat_service: Arc<ChatService>,
    pub message_service: Arc<MessageService>,
    pub presence: Arc<dyn PresenceRegistry>,
    pub delivery_router: Arc<DeliveryRouter>,
    pub connections: Arc<ConnectionRegistry>,
}

impl AppState {
    pub fn new(
        user_service: Arc<UserService>,
        chat_service: Arc<ChatService>,
        message_service: Arc<MessageService>,
        presence: Arc<dyn PresenceRegistry>,
        delivery_router: Arc<DeliveryRouter>,
        connections: Arc<ConnectionRegistry>,
    ) -> Self {
        Self {
            user_service,
            chat_service,
            message_service,
            presence,
            delivery_router,
            connections,
        }
    }
}
