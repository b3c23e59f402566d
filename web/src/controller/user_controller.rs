use crate::extractors::compare_api_version::CompareApiVersion;
use crate::{controller::ApiResponse, params::user::*};
use crate::{AppState, Error};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use domain::verification_tokens::Purpose;
use domain::{user as UserApi, users, Id};
use service::config::ApiVersion;

use log::*;

/// CREATE a new User account (self-service registration)
#[utoipa::path(
    post,
    path = "/users",
    params(
        ApiVersion,
    ),
    request_body = CreateParams,
    responses(
        (status = 201, description = "Successfully registered a new User", body = users::Model),
        (status = 400, description = "Bad request (invalid email or weak password)"),
        (status = 405, description = "Method not allowed")
    )
)]
pub async fn create(
    CompareApiVersion(_v): CompareApiVersion,
    State(app_state): State<AppState>,
    Json(params): Json<CreateParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("CREATE new User account for {:?}", params.email);

    let user = UserApi::register(
        app_state.db_conn_ref(),
        &params.email,
        &params.password,
        params.display_name,
    )
    .await?;

    // Registration stands even if the verification email cannot go out; the
    // user can request a fresh link later.
    if let Err(e) = domain::verification::issue(
        app_state.db_conn_ref(),
        &app_state.config,
        &user.email,
        Purpose::Signup,
    )
    .await
    {
        warn!("Could not send verification email to {}: {e:?}", user.email);
    }

    Ok(Json(ApiResponse::new(StatusCode::CREATED.into(), user)))
}

/// UPDATE a User's profile fields
#[utoipa::path(
    put,
    path = "/users/{id}",
    params(
        ApiVersion,
        ("id" = Uuid, Path, description = "User id to update")
    ),
    request_body = UpdateProfileParams,
    responses(
        (status = 200, description = "Successfully updated the User", body = users::Model),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found")
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn update(
    CompareApiVersion(_v): CompareApiVersion,
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
    Json(params): Json<UpdateProfileParams>,
) -> Result<impl IntoResponse, Error> {
    let user = UserApi::update_profile(
        app_state.db_conn_ref(),
        id,
        params.display_name,
        params.nickname,
    )
    .await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), user)))
}

/// UPDATE a User's role (admin only)
#[utoipa::path(
    put,
    path = "/users/{id}/role",
    params(
        ApiVersion,
        ("id" = Uuid, Path, description = "User id whose role changes")
    ),
    request_body = UpdateRoleParams,
    responses(
        (status = 200, description = "Successfully changed the User's role", body = users::Model),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found")
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn update_role(
    CompareApiVersion(_v): CompareApiVersion,
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
    Json(params): Json<UpdateRoleParams>,
) -> Result<impl IntoResponse, Error> {
    info!("Changing role of user {id} to {}", params.role);

    let user = UserApi::update_role(app_state.db_conn_ref(), id, params.role).await?;

    // A role change invalidates outstanding sessions; their tokens still carry
    // the old role claim.
    let revoked = domain::session::revoke_all(app_state.db_conn_ref(), user.id).await?;
    if revoked > 0 {
        info!("Revoked {revoked} session(s) for user {id} after role change");
    }

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), user)))
}
