use crate::extractors::{
    authenticated_user::AuthenticatedUser, compare_api_version::CompareApiVersion,
};
use crate::params::chat::{ChatMessagePath, ChatPath, CreateMessageParams, MessageIndexParams, ReactionParams};
use crate::{controller::ApiResponse, AppState, Error};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use domain::{chat as ChatApi, chat_messages};
use log::*;
use service::config::ApiVersion;
use sse::message::{Event as SseEvent, Message as SseMessage, MessageScope};

/// GET a page of a Chat's messages, newest first
#[utoipa::path(
    get,
    path = "/chats/{chat_id}/messages",
    params(
        ApiVersion,
        ("chat_id" = Uuid, Path, description = "Chat to list messages of"),
        MessageIndexParams
    ),
    responses(
        (status = 200, description = "A page of the Chat's messages", body = [chat_messages::Model]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden (not a member)")
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn index(
    CompareApiVersion(_v): CompareApiVersion,
    State(app_state): State<AppState>,
    Path(ChatPath { chat_id }): Path<ChatPath>,
    Query(params): Query<MessageIndexParams>,
) -> Result<impl IntoResponse, Error> {
    let messages = ChatApi::messages(
        app_state.db_conn_ref(),
        chat_id,
        params.page,
        params.per_page,
    )
    .await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), messages)))
}

/// CREATE a message in a Chat
#[utoipa::path(
    post,
    path = "/chats/{chat_id}/messages",
    params(
        ApiVersion,
        ("chat_id" = Uuid, Path, description = "Chat to post into")
    ),
    request_body = CreateMessageParams,
    responses(
        (status = 201, description = "Successfully posted the message", body = chat_messages::Model),
        (status = 400, description = "Bad request (empty body)"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden (not a member)")
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn create(
    CompareApiVersion(_v): CompareApiVersion,
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(ChatPath { chat_id }): Path<ChatPath>,
    Json(params): Json<CreateMessageParams>,
) -> Result<impl IntoResponse, Error> {
    let message =
        ChatApi::post_message(app_state.db_conn_ref(), chat_id, user.id, params.body).await?;

    match serde_json::to_value(&message) {
        Ok(message_json) => app_state.sse_manager.send_message(SseMessage {
            event: SseEvent::MessageCreated {
                chat_id: chat_id.to_string(),
                message: message_json,
            },
            scope: MessageScope::Chat {
                chat_id: chat_id.to_string(),
            },
        }),
        Err(e) => error!("Could not serialize message {} for push: {e}", message.id),
    }

    Ok(Json(ApiResponse::new(StatusCode::CREATED.into(), message)))
}

/// DELETE (soft) a message from a Chat
#[utoipa::path(
    delete,
    path = "/chats/{chat_id}/messages/{message_id}",
    params(
        ApiVersion,
        ("chat_id" = Uuid, Path, description = "Chat the message belongs to"),
        ("message_id" = Uuid, Path, description = "Message to delete")
    ),
    responses(
        (status = 200, description = "Successfully deleted the message"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden (not the sender and not staff)"),
        (status = 404, description = "Message not found in this chat")
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn delete(
    CompareApiVersion(_v): CompareApiVersion,
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(ChatMessagePath {
        chat_id,
        message_id,
    }): Path<ChatMessagePath>,
) -> Result<impl IntoResponse, Error> {
    let message =
        ChatApi::delete_message(app_state.db_conn_ref(), &user, chat_id, message_id).await?;

    app_state.sse_manager.send_message(SseMessage {
        event: SseEvent::MessageDeleted {
            chat_id: chat_id.to_string(),
            message_id: message.id.to_string(),
        },
        scope: MessageScope::Chat {
            chat_id: chat_id.to_string(),
        },
    });

    Ok(Json(ApiResponse::<()>::no_content(StatusCode::OK.into())))
}

/// TOGGLE the caller's reaction on a message
#[utoipa::path(
    put,
    path = "/chats/{chat_id}/messages/{message_id}/reactions",
    params(
        ApiVersion,
        ("chat_id" = Uuid, Path, description = "Chat the message belongs to"),
        ("message_id" = Uuid, Path, description = "Message to react to")
    ),
    request_body = ReactionParams,
    responses(
        (status = 200, description = "Updated reaction map", body = chat_messages::Model),
        (status = 400, description = "Bad request (empty or oversized emoji)"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden (not a member)"),
        (status = 404, description = "Message not found in this chat")
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn toggle_reaction(
    CompareApiVersion(_v): CompareApiVersion,
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(ChatMessagePath {
        chat_id,
        message_id,
    }): Path<ChatMessagePath>,
    Json(params): Json<ReactionParams>,
) -> Result<impl IntoResponse, Error> {
    let message = ChatApi::toggle_reaction(
        app_state.db_conn_ref(),
        user.id,
        chat_id,
        message_id,
        &params.emoji,
    )
    .await?;

    app_state.sse_manager.send_message(SseMessage {
        event: SseEvent::ReactionUpdated {
            chat_id: chat_id.to_string(),
            message_id: message.id.to_string(),
            reactions: message.reactions.clone(),
        },
        scope: MessageScope::Chat {
            chat_id: chat_id.to_string(),
        },
    });

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), message)))
}
