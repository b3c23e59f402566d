use crate::extractors::authenticated_user::AuthenticatedUser;
use crate::protect::has_role;
use crate::AppState;
use axum::{
    extract::{Path, Request, State},
    http::StatusCode,
    middleware::Next,
    response::IntoResponse,
};
use domain::users::Role;
use domain::Id;

/// A user may edit their own profile; admins may edit anyone's.
pub(crate) async fn update(
    State(_app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(user_id): Path<Id>,
    request: Request,
    next: Next,
) -> impl IntoResponse {
    if user.id == user_id || has_role(&user, &[Role::Admin]) {
        next.run(request).await
    } else {
        (StatusCode::FORBIDDEN, "FORBIDDEN").into_response()
    }
}

/// Role assignment is admin-only.
pub(crate) async fn update_role(
    State(_app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    request: Request,
    next: Next,
) -> impl IntoResponse {
    if has_role(&user, &[Role::Admin]) {
        next.run(request).await
    } else {
        (StatusCode::FORBIDDEN, "FORBIDDEN").into_response()
    }
}
