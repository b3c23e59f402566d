use crate::extractors::authenticated_user::AuthenticatedUser;
use crate::protect::has_role;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::IntoResponse,
};
use domain::users::Role;

/// Catalog mutations (titles, chapters) are staff actions.
pub(crate) async fn moderator(
    State(_app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    request: Request,
    next: Next,
) -> impl IntoResponse {
    if has_role(&user, &[Role::Moderator, Role::Admin]) {
        next.run(request).await
    } else {
        (StatusCode::FORBIDDEN, "FORBIDDEN").into_response()
    }
}
