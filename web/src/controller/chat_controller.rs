use crate::extractors::{
    authenticated_user::AuthenticatedUser, compare_api_version::CompareApiVersion,
};
use crate::params::chat::{ChatPath, CreateParams, PinParams};
use crate::{controller::ApiResponse, AppState, Error};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use domain::{chat as ChatApi, chat_members, chats};
use log::*;
use serde::Serialize;
use service::config::ApiVersion;
use sse::message::{Event as SseEvent, Message as SseMessage, MessageScope};
use utoipa::ToSchema;

/// A Chat together with its membership roster, as returned by the single-chat
/// read endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct ChatWithMembers {
    #[serde(flatten)]
    pub chat: chats::Model,
    pub members: Vec<chat_members::Model>,
}

/// CREATE a new Chat (DM or group) with the caller as owner
#[utoipa::path(
    post,
    path = "/chats",
    params(
        ApiVersion,
    ),
    request_body = CreateParams,
    responses(
        (status = 201, description = "Successfully created a new Chat", body = chats::Model),
        (status = 400, description = "Bad request (DM without exactly one peer, or unnamed group)"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn create(
    CompareApiVersion(_v): CompareApiVersion,
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
    Json(params): Json<CreateParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("CREATE new {:?} Chat for user {}", params.kind, user.id);

    let chat = ChatApi::create(
        app_state.db_conn_ref(),
        &user,
        params.kind,
        params.name,
        params.member_ids,
    )
    .await?;

    Ok(Json(ApiResponse::new(StatusCode::CREATED.into(), chat)))
}

/// GET the caller's Chats
#[utoipa::path(
    get,
    path = "/chats",
    params(
        ApiVersion,
    ),
    responses(
        (status = 200, description = "The caller's Chats", body = [chats::Model]),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn index(
    CompareApiVersion(_v): CompareApiVersion,
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, Error> {
    let chats = ChatApi::find_by_user(app_state.db_conn_ref(), user.id).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), chats)))
}

/// GET a single Chat (members only)
#[utoipa::path(
    get,
    path = "/chats/{chat_id}",
    params(
        ApiVersion,
        ("chat_id" = Uuid, Path, description = "Chat id to retrieve")
    ),
    responses(
        (status = 200, description = "The Chat and its members", body = ChatWithMembers),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden (not a member)"),
        (status = 404, description = "Chat not found")
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn read(
    CompareApiVersion(_v): CompareApiVersion,
    State(app_state): State<AppState>,
    Path(ChatPath { chat_id }): Path<ChatPath>,
) -> Result<impl IntoResponse, Error> {
    let chat = ChatApi::find_by_id(app_state.db_conn_ref(), chat_id).await?;
    let members = ChatApi::members(app_state.db_conn_ref(), chat_id).await?;

    Ok(Json(ApiResponse::new(
        StatusCode::OK.into(),
        ChatWithMembers { chat, members },
    )))
}

/// PIN a message in a Chat
#[utoipa::path(
    put,
    path = "/chats/{chat_id}/pin",
    params(
        ApiVersion,
        ("chat_id" = Uuid, Path, description = "Chat to pin a message in")
    ),
    request_body = PinParams,
    responses(
        (status = 200, description = "Successfully pinned the message", body = chats::Model),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden (not a member)"),
        (status = 404, description = "Message not found in this chat")
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn pin(
    CompareApiVersion(_v): CompareApiVersion,
    State(app_state): State<AppState>,
    Path(ChatPath { chat_id }): Path<ChatPath>,
    Json(params): Json<PinParams>,
) -> Result<impl IntoResponse, Error> {
    let chat = ChatApi::pin_message(app_state.db_conn_ref(), chat_id, params.message_id).await?;

    push_pin_update(&app_state, &chat);

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), chat)))
}

/// UNPIN the currently pinned message of a Chat
#[utoipa::path(
    delete,
    path = "/chats/{chat_id}/pin",
    params(
        ApiVersion,
        ("chat_id" = Uuid, Path, description = "Chat to clear the pin of")
    ),
    responses(
        (status = 200, description = "Successfully cleared the pin", body = chats::Model),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden (not a member)"),
        (status = 404, description = "Chat not found")
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn unpin(
    CompareApiVersion(_v): CompareApiVersion,
    State(app_state): State<AppState>,
    Path(ChatPath { chat_id }): Path<ChatPath>,
) -> Result<impl IntoResponse, Error> {
    let chat = ChatApi::clear_pin(app_state.db_conn_ref(), chat_id).await?;

    push_pin_update(&app_state, &chat);

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), chat)))
}

fn push_pin_update(app_state: &AppState, chat: &chats::Model) {
    app_state.sse_manager.send_message(SseMessage {
        event: SseEvent::PinUpdated {
            chat_id: chat.id.to_string(),
            pinned_message_id: chat.pinned_message_id.map(|id| id.to_string()),
        },
        scope: MessageScope::Chat {
            chat_id: chat.id.to_string(),
        },
    });
}
