use crate::extractors::authenticated_user::AuthenticatedUser;
use crate::params::chat::ChatPath;
use crate::{AppState, Error};
use async_stream::stream;
use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use log::*;
use std::convert::Infallible;
use tokio::sync::mpsc;

/// SSE handler that establishes a long-lived connection for one chat's
/// real-time events. Membership is checked once at subscribe time; a client
/// removed from the chat later keeps its stream until it reconnects.
pub(crate) async fn chat_events(
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(ChatPath { chat_id }): Path<ChatPath>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, Error> {
    domain::chat::ensure_member(app_state.db_conn_ref(), chat_id, user.id).await?;

    debug!("Establishing SSE connection to chat {chat_id} for user {}", user.id);

    let (tx, mut rx) = mpsc::unbounded_channel();

    let connection_id =
        app_state
            .sse_manager
            .register_connection(chat_id.to_string(), user.id.to_string(), tx);

    let manager = app_state.sse_manager.clone();
    let user_id = user.id;

    // Events arrive from the channel already shaped as Result<Event, Infallible>
    let stream = stream! {
        while let Some(event) = rx.recv().await {
            yield event;
        }

        // In practice a dropped client is noticed on the next push, when the
        // registry prunes the dead sender. This path only runs if the registry
        // releases the sender first, but it keeps the stream self-cleaning
        // either way.
        debug!("SSE connection to chat {chat_id} closed for user {user_id}, cleaning up");
        manager.unregister_connection(&connection_id);
    };

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
