use crate::extractors::authenticated_user::AuthenticatedUser;
use crate::params::chat::ChatPath;
use crate::AppState;
use axum::{
    extract::{Path, Request, State},
    http::StatusCode,
    middleware::Next,
    response::IntoResponse,
};
use log::error;

/// Checks that the authenticated user is a member of the chat named by the
/// `chat_id` path segment. Intended to be given to
/// axum::middleware::from_fn_with_state in the router.
pub(crate) async fn member(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(ChatPath { chat_id }): Path<ChatPath>,
    request: Request,
    next: Next,
) -> impl IntoResponse {
    match domain::chat::is_member(app_state.db_conn_ref(), chat_id, user.id).await {
        Ok(true) => next.run(request).await,
        Ok(false) => (StatusCode::FORBIDDEN, "FORBIDDEN").into_response(),
        Err(e) => {
            error!("Chat membership check failed for chat {chat_id}: {e:?}");
            (StatusCode::NOT_FOUND, "NOT FOUND").into_response()
        }
    }
}
