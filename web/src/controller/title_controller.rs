use crate::extractors::compare_api_version::CompareApiVersion;
use crate::params::title::IndexParams;
use crate::{controller::ApiResponse, AppState, Error};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use domain::{title as TitleApi, titles, Id};
use log::*;
use service::config::ApiVersion;

/// GET the catalog of Titles
#[utoipa::path(
    get,
    path = "/titles",
    params(
        ApiVersion,
        IndexParams
    ),
    responses(
        (status = 200, description = "All Titles, name-sorted", body = [titles::Model])
    )
)]
pub async fn index(
    CompareApiVersion(_v): CompareApiVersion,
    State(app_state): State<AppState>,
    Query(params): Query<IndexParams>,
) -> Result<impl IntoResponse, Error> {
    let titles = TitleApi::find_all(app_state.db_conn_ref(), params.search).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), titles)))
}

/// GET a single Title
#[utoipa::path(
    get,
    path = "/titles/{id}",
    params(
        ApiVersion,
        ("id" = Uuid, Path, description = "Title id to retrieve")
    ),
    responses(
        (status = 200, description = "The Title", body = titles::Model),
        (status = 404, description = "Title not found")
    )
)]
pub async fn read(
    CompareApiVersion(_v): CompareApiVersion,
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, Error> {
    let title = TitleApi::find_by_id(app_state.db_conn_ref(), id).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), title)))
}

/// CREATE a new Title (staff only)
#[utoipa::path(
    post,
    path = "/titles",
    params(
        ApiVersion,
    ),
    request_body = titles::Model,
    responses(
        (status = 201, description = "Successfully created a new Title", body = titles::Model),
        (status = 400, description = "Bad request (malformed slug or duplicate)"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn create(
    CompareApiVersion(_v): CompareApiVersion,
    State(app_state): State<AppState>,
    Json(title_model): Json<titles::Model>,
) -> Result<impl IntoResponse, Error> {
    debug!("CREATE new Title with slug {:?}", title_model.slug);

    let title = TitleApi::create(app_state.db_conn_ref(), title_model).await?;

    Ok(Json(ApiResponse::new(StatusCode::CREATED.into(), title)))
}

/// UPDATE a Title (staff only)
#[utoipa::path(
    put,
    path = "/titles/{id}",
    params(
        ApiVersion,
        ("id" = Uuid, Path, description = "Title id to update")
    ),
    request_body = titles::Model,
    responses(
        (status = 200, description = "Successfully updated the Title", body = titles::Model),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Title not found")
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn update(
    CompareApiVersion(_v): CompareApiVersion,
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
    Json(title_model): Json<titles::Model>,
) -> Result<impl IntoResponse, Error> {
    let title = TitleApi::update(app_state.db_conn_ref(), id, title_model).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), title)))
}

/// DELETE a Title (staff only)
#[utoipa::path(
    delete,
    path = "/titles/{id}",
    params(
        ApiVersion,
        ("id" = Uuid, Path, description = "Title id to delete")
    ),
    responses(
        (status = 200, description = "Successfully deleted the Title"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Title not found")
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn delete(
    CompareApiVersion(_v): CompareApiVersion,
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, Error> {
    TitleApi::delete_by_id(app_state.db_conn_ref(), id).await?;

    Ok(Json(ApiResponse::<()>::no_content(StatusCode::OK.into())))
}
