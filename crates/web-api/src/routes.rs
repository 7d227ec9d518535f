use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use application::{
    services::{EnterRequest, ListMessagesRequest, RegisterUserRequest, RequestChatRequest},
    ChatDto, ChatSummaryDto, MessagePageDto, UserDto,
};
use domain::UserId;

use crate::{error::ApiError, state::AppState, websocket::websocket_upgrade};

#[derive(Debug, Deserialize)]
struct CreateUserPayload {
    username: String,
    password: Option<String>,
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EnterPayload {
    username: String,
    password: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RequestChatPayload {
    from_user_id: String,
    to_user_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AcceptChatPayload {
    user_id: String,
}

#[derive(Debug, Deserialize)]
struct ListUsersQuery {
    exclude: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchUsersQuery {
    q: Option<String>,
    exclude: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessagesQuery {
    page: Option<u32>,
    limit: Option<u32>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api", api_routes())
        .route("/ws", get(websocket_upgrade))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(create_user).get(list_users))
        .route("/users/enter", post(enter))
        .route("/users/search", get(search_users))
        .route("/chat/request", post(request_chat))
        .route("/chat/{chat_id}/accept", post(accept_chat))
        .route("/chat/user/{user_id}", get(list_chats))
        .route("/chat/{chat_id}/messages", get(list_messages))
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserPayload>,
) -> Result<(StatusCode, Json<UserDto>), ApiError> {
    let user = state
        .user_service
        .register(RegisterUserRequest {
            username: payload.username,
            password: payload.password,
            email: payload.email,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(UserDto::from(&user))))
}

async fn enter(
    State(state): State<AppState>,
    Json(payload): Json<EnterPayload>,
) -> Result<Json<UserDto>, ApiError> {
    let user = state
        .user_service
        .enter(EnterRequest {
            username: payload.username,
            password: payload.password,
        })
        .await?;

    Ok(Json(UserDto::from(&user)))
}

async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<Vec<UserDto>>, ApiError> {
    let exclude = parse_exclude(query.exclude.as_deref())?;
    let users = state.user_service.list(exclude).await?;

    Ok(Json(users.iter().map(UserDto::from).collect()))
}

async fn search_users(
    State(state): State<AppState>,
    Query(query): Query<SearchUsersQuery>,
) -> Result<Json<Vec<UserDto>>, ApiError> {
    let exclude = parse_exclude(query.exclude.as_deref())?;
    let users = state
        .user_service
        .search(query.q.as_deref().unwrap_or(""), exclude)
        .await?;

    Ok(Json(users.iter().map(UserDto::from).collect()))
}

async fn request_chat(
    State(state): State<AppState>,
    Json(payload): Json<RequestChatPayload>,
) -> Result<(StatusCode, Json<ChatDto>), ApiError> {
    let chat = state
        .chat_service
        .request_chat(RequestChatRequest {
            from_user_id: payload.from_user_id,
            to_user_id: payload.to_user_id,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(ChatDto::from(&chat))))
}

async fn accept_chat(
    State(state): State<AppState>,
    Path(chat_id): Path<String>,
    Json(payload): Json<AcceptChatPayload>,
) -> Result<Json<ChatDto>, ApiError> {
    let chat = state
        .chat_service
        .accept_chat(&chat_id, &payload.user_id)
        .await?;

    Ok(Json(ChatDto::from(&chat)))
}

async fn list_chats(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<ChatSummaryDto>>, ApiError> {
    let chats = state.chat_service.list_chats_for_user(&user_id).await?;
    Ok(Json(chats))
}

async fn list_messages(
    State(state): State<AppState>,
    Path(chat_id): Path<String>,
    Query(query): Query<MessagesQuery>,
) -> Result<Json<MessagePageDto>, ApiError> {
    let page = state
        .message_service
        .list_messages(ListMessagesRequest {
            chat_id,
            page: query.page,
            limit: query.limit,
        })
        .await?;

    Ok(Json(page))
}

fn parse_exclude(raw: Option<&str>) -> Result<Option<UserId>, ApiError> {
    match raw {
        None | Some("") => Ok(None),
        Some(value) => UserId::parse(value)
            .map(Some)
            .map_err(|err| ApiError::bad_request(err.to_string())),
    }
}
