use crate::error::Result as WebResult;
use crate::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use log::*;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
pub struct VerifyEmailParams {
    pub token: Option<String>,
}

/// GET /verify_email?token=...
///
/// Redeems the one-time token from the emailed link. The link is opened by a
/// browser, so success redirects to the frontend rather than returning JSON.
/// A token that is expired, already used, or never existed gets the same
/// response.
#[utoipa::path(
    get,
    path = "/verify_email",
    params(
        ("token" = String, Query, description = "One-time verification token from the emailed link"),
    ),
    responses(
        (status = 302, description = "Email verified; redirect to the frontend"),
        (status = 400, description = "Missing, expired, or already-used token")
    )
)]
pub async fn verify_email(
    State(app_state): State<AppState>,
    Query(params): Query<VerifyEmailParams>,
) -> WebResult<Response> {
    let Some(token) = params.token.filter(|t| !t.is_empty()) else {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "missing_token"})),
        )
            .into_response());
    };

    match domain::verification::consume(app_state.db_conn_ref(), &token).await? {
        Some(user) => {
            info!("Email address verified for user {}", user.id);
            let destination = verified_redirect(app_state.config.frontend_base_url(), user.id);
            Ok(Redirect::to(&destination).into_response())
        }
        None => Ok((
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "invalid_or_expired"})),
        )
            .into_response()),
    }
}

/// The confirmation page is told which account was verified so it can render
/// the right state even when the link is opened in a logged-out browser.
fn verified_redirect(frontend_base_url: Option<String>, user_id: domain::Id) -> String {
    match frontend_base_url {
        Some(base) => format!(
            "{}/email_verified?user_id={user_id}",
            base.trim_end_matches('/')
        ),
        None => format!("/?user_id={user_id}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verified_redirect_carries_the_user_id() {
        let user_id = domain::Id::new_v4();

        assert_eq!(
            verified_redirect(Some("https://app.mangapulse.app/".to_string()), user_id),
            format!("https://app.mangapulse.app/email_verified?user_id={user_id}")
        );
        assert_eq!(
            verified_redirect(None, user_id),
            format!("/?user_id={user_id}")
        );
    }
}
