//! WebSocket 连接生命周期
//!
//! 升级时分配端点标识并注册发送句柄；USER_CONNECT 把用户绑定到
//! 在线状态注册表；连接关闭或 USER_DISCONNECT 时按端点清理。
//! 领域错误转成 ERROR 事件回发，连接保持打开。
//!
//! 消息的持久化与投递在这里显式组合：先走消息服务落库，成功后
//! 再把领域事件交给投递路由推送在线参与者。

use std::ops::ControlFlow;

use axum::{
    extract::{
        ws::{Message as WsMessage, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use application::services::SendMessageRequest;
use domain::{ChatEvent, EndpointId, UserId};

use crate::error::ApiError;
use crate::events::{ClientEvent, ServerEvent};
use crate::state::AppState;

pub async fn websocket_upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let endpoint = EndpointId::new();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<ServerEvent>();
    state.connections.register(endpoint, event_tx.clone()).await;

    tracing::info!(endpoint = %endpoint, "WebSocket 连接已建立");

    let (mut sender, mut incoming) = socket.split();

    // 写端独立任务，经 mpsc 通道解耦
    let send_task = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            let payload = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(err) => {
                    tracing::warn!(error = %err, "事件序列化失败，跳过");
                    continue;
                }
            };
            if sender.send(WsMessage::Text(payload.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(frame)) = incoming.next().await {
        match frame {
            WsMessage::Text(text) => match serde_json::from_str::<ClientEvent>(&text) {
                Ok(event) => {
                    if handle_client_event(&state, endpoint, event, &event_tx)
                        .await
                        .is_break()
                    {
                        break;
                    }
                }
                Err(err) => {
                    let _ = event_tx.send(ServerEvent::error(
                        "invalid event",
                        Some(err.to_string()),
                    ));
                }
            },
            WsMessage::Close(_) => break,
            // ping/pong 由协议栈处理
            _ => {}
        }
    }

    // 清理：先解除在线映射，再注销发送句柄
    state.presence.disconnect(endpoint).await;
    state.connections.remove(endpoint).await;
    send_task.abort();

    tracing::info!(endpoint = %endpoint, "WebSocket 连接已关闭");
}

async fn handle_client_event(
    state: &AppState,
    endpoint: EndpointId,
    event: ClientEvent,
    event_tx: &mpsc::UnboundedSender<ServerEvent>,
) -> ControlFlow<()> {
    match event {
        ClientEvent::UserConnect { user_id } => match UserId::parse(&user_id) {
            Ok(user_id) => {
                state.presence.connect(user_id, endpoint).await;
                tracing::info!(user_id = %user_id, endpoint = %endpoint, "用户上线");
            }
            Err(err) => {
                let _ = event_tx.send(ServerEvent::error("invalid event", Some(err.to_string())));
            }
        },
        ClientEvent::MessageSend {
            chat_id,
            sender_id,
            content,
            reply_to_id,
        } => {
            let result = state
                .message_service
                .send_message(SendMessageRequest {
                    chat_id,
                    sender_id,
                    content,
                    reply_to_id,
                })
                .await;

            match result {
                Ok(sent) => {
                    state
                        .delivery_router
                        .dispatch(&ChatEvent::NewMessage {
                            chat: sent.chat,
                            message: sent.message,
                        })
                        .await;
                }
                Err(err) => send_domain_error(event_tx, err),
            }
        }
        ClientEvent::MessageDelete {
            message_id,
            user_id,
        } => {
            let result = state
                .message_service
                .delete_message(&message_id, &user_id)
                .await;

            match result {
                // 幂等的重复删除不再广播
                Ok(deleted) if deleted.newly_deleted => {
                    state
                        .delivery_router
                        .dispatch(&ChatEvent::MessageDeleted {
                            message_id: deleted.message.id,
                            chat: deleted.chat,
                        })
                        .await;
                }
                Ok(_) => {}
                Err(err) => send_domain_error(event_tx, err),
            }
        }
        ClientEvent::UserDisconnect => return ControlFlow::Break(()),
    }

    ControlFlow::Continue(())
}

/// 领域错误映射为 ERROR 事件，绝不关闭连接。
fn send_domain_error(
    event_tx: &mpsc::UnboundedSender<ServerEvent>,
    err: application::ApplicationError,
) {
    let api_error = ApiError::from(err);
    let _ = event_tx.send(ServerEvent::error(
        api_error.message().to_owned(),
        None,
    ));
}
