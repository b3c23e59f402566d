use crate::extractors::{
    authenticated_user::AuthenticatedUser, compare_api_version::CompareApiVersion,
};
use crate::params::comment::{CreateParams, IndexParams};
use crate::{controller::ApiResponse, AppState, Error};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use domain::{comment as CommentApi, comments, Id};
use service::config::ApiVersion;

/// GET a page of a Title's Comments, newest first
#[utoipa::path(
    get,
    path = "/titles/{id}/comments",
    params(
        ApiVersion,
        ("id" = Uuid, Path, description = "Title to list comments of"),
        IndexParams
    ),
    responses(
        (status = 200, description = "A page of the Title's Comments", body = [comments::Model])
    )
)]
pub async fn index(
    CompareApiVersion(_v): CompareApiVersion,
    State(app_state): State<AppState>,
    Path(title_id): Path<Id>,
    Query(params): Query<IndexParams>,
) -> Result<impl IntoResponse, Error> {
    let comments = CommentApi::find_by_title(
        app_state.db_conn_ref(),
        title_id,
        params.page,
        params.per_page,
    )
    .await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), comments)))
}

/// CREATE a Comment on a Title
#[utoipa::path(
    post,
    path = "/titles/{id}/comments",
    params(
        ApiVersion,
        ("id" = Uuid, Path, description = "Title to comment on")
    ),
    request_body = CreateParams,
    responses(
        (status = 201, description = "Successfully posted the Comment", body = comments::Model),
        (status = 400, description = "Bad request (empty or oversized body)"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Title not found")
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn create(
    CompareApiVersion(_v): CompareApiVersion,
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(title_id): Path<Id>,
    Json(params): Json<CreateParams>,
) -> Result<impl IntoResponse, Error> {
    let comment =
        CommentApi::create(app_state.db_conn_ref(), title_id, user.id, params.body).await?;

    Ok(Json(ApiResponse::new(StatusCode::CREATED.into(), comment)))
}

/// DELETE (soft) a Comment
#[utoipa::path(
    delete,
    path = "/comments/{id}",
    params(
        ApiVersion,
        ("id" = Uuid, Path, description = "Comment to delete")
    ),
    responses(
        (status = 200, description = "Successfully deleted the Comment"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden (not the author and not staff)"),
        (status = 404, description = "Comment not found")
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn delete(
    CompareApiVersion(_v): CompareApiVersion,
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, Error> {
    CommentApi::delete(app_state.db_conn_ref(), &user, id).await?;

    Ok(Json(ApiResponse::<()>::no_content(StatusCode::OK.into())))
}
