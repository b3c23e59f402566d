use crate::extractors::compare_api_version::CompareApiVersion;
use crate::params::chapter::IndexParams;
use crate::protect::has_role;
use crate::{controller::ApiResponse, AppState, Error};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use axum_extra::extract::CookieJar;
use domain::users::Role;
use domain::{chapter as ChapterApi, chapters, Id};
use service::config::ApiVersion;

/// GET a Title's Chapters in reading order
///
/// Readers see published chapters. A moderator or admin session may ask for
/// drafts too via include_unpublished; for anyone else the flag is ignored.
#[utoipa::path(
    get,
    path = "/titles/{id}/chapters",
    params(
        ApiVersion,
        ("id" = Uuid, Path, description = "Title to list chapters of"),
        IndexParams
    ),
    responses(
        (status = 200, description = "The Title's Chapters", body = [chapters::Model]),
        (status = 404, description = "Title not found")
    )
)]
pub async fn index(
    CompareApiVersion(_v): CompareApiVersion,
    State(app_state): State<AppState>,
    jar: CookieJar,
    Path(title_id): Path<Id>,
    Query(params): Query<IndexParams>,
) -> Result<impl IntoResponse, Error> {
    let include_unpublished = params.include_unpublished
        && staff_session(&app_state, &jar)
            .await
            .unwrap_or(false);

    let chapters =
        ChapterApi::find_by_title(app_state.db_conn_ref(), title_id, include_unpublished).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), chapters)))
}

/// The listing is public, so staffness is derived from the optional session
/// cookie rather than a required extractor.
async fn staff_session(app_state: &AppState, jar: &CookieJar) -> Option<bool> {
    let cookie = jar.get(&app_state.config.session_cookie_name)?;
    let claims = domain::session::verify_session(&app_state.config, cookie.value())?;
    let user_id: Id = claims.sub.parse().ok()?;
    let user = domain::user::find_by_id(app_state.db_conn_ref(), user_id)
        .await
        .ok()?;
    Some(has_role(&user, &[Role::Moderator, Role::Admin]))
}

/// GET a single Chapter
#[utoipa::path(
    get,
    path = "/chapters/{id}",
    params(
        ApiVersion,
        ("id" = Uuid, Path, description = "Chapter id to retrieve")
    ),
    responses(
        (status = 200, description = "The Chapter", body = chapters::Model),
        (status = 404, description = "Chapter not found")
    )
)]
pub async fn read(
    CompareApiVersion(_v): CompareApiVersion,
    State(app_state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, Error> {
    let chapter = ChapterApi::find_by_id(app_state.db_conn_ref(), id).await?;

    // Drafts are indistinguishable from missing chapters for non-staff.
    if chapter.published_at.is_none() && !staff_session(&app_state, &jar).await.unwrap_or(false) {
        return Err(domain::error::Error::not_found().into());
    }

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), chapter)))
}

/// CREATE a new Chapter under a Title (staff only)
#[utoipa::path(
    post,
    path = "/titles/{id}/chapters",
    params(
        ApiVersion,
        ("id" = Uuid, Path, description = "Title to attach the chapter to")
    ),
    request_body = chapters::Model,
    responses(
        (status = 201, description = "Successfully created a new Chapter", body = chapters::Model),
        (status = 400, description = "Bad request (negative number or empty pages)"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Title not found")
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn create(
    CompareApiVersion(_v): CompareApiVersion,
    State(app_state): State<AppState>,
    Path(title_id): Path<Id>,
    Json(mut chapter_model): Json<chapters::Model>,
) -> Result<impl IntoResponse, Error> {
    chapter_model.title_id = title_id;
    let chapter = ChapterApi::create(app_state.db_conn_ref(), chapter_model).await?;

    Ok(Json(ApiResponse::new(StatusCode::CREATED.into(), chapter)))
}
