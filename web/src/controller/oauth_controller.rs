//! Controller for the OAuth login flow.
//!
//! Note: OAuth endpoints don't use CompareApiVersion because they work via
//! browser redirects which cannot set custom headers.

use crate::controller::user_session_controller::{request_is_tls, set_session_cookie};
use crate::error::Result as WebResult;
use crate::AppState;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Redirect};
use axum_extra::extract::CookieJar;
use chrono::{Duration, Utc};
use log::*;
use serde::Deserialize;

/// Query parameters for starting OAuth
#[derive(Debug, Deserialize)]
pub struct OAuthStart {
    pub redirect_to: Option<String>,
}

/// Query parameters for the OAuth callback
#[derive(Debug, Deserialize)]
pub struct OAuthCallback {
    pub code: String,
    pub state: String,
}

/// Only relative paths are honored as post-login redirect targets; anything
/// else could bounce the browser to an attacker-chosen site.
fn sanitize_redirect(redirect_to: Option<String>) -> Option<String> {
    redirect_to.filter(|target| target.starts_with('/') && !target.starts_with("//"))
}

/// GET /oauth/authorize
///
/// Starts the provider login: stores the PKCE handshake and redirects the
/// user agent to the provider's authorization endpoint.
#[utoipa::path(
    get,
    path = "/oauth/authorize",
    params(
        ("redirect_to" = Option<String>, Query, description = "Relative path to return to after login"),
    ),
    responses(
        (status = 302, description = "Redirect to the identity provider"),
        (status = 500, description = "Server error (OAuth not configured)")
    )
)]
pub async fn authorize(
    State(app_state): State<AppState>,
    Query(params): Query<OAuthStart>,
) -> WebResult<impl IntoResponse> {
    let url = domain::oauth::begin_login(
        app_state.db_conn_ref(),
        &app_state.config,
        sanitize_redirect(params.redirect_to),
    )
    .await?;

    Ok(Redirect::temporary(&url))
}

/// GET /oauth/callback
///
/// Completes the provider login: consumes the stored handshake, exchanges
/// the code, signs the user in with a fresh session cookie, and redirects to
/// the stored target.
#[utoipa::path(
    get,
    path = "/oauth/callback",
    params(
        ("code" = String, Query, description = "Authorization code from the provider"),
        ("state" = String, Query, description = "Opaque handshake state minted at /oauth/authorize"),
    ),
    responses(
        (status = 302, description = "Logged in; redirect to the stored target"),
        (status = 401, description = "Unknown or already-consumed state, or provider rejection"),
        (status = 502, description = "Provider unreachable")
    )
)]
pub async fn callback(
    State(app_state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    Query(params): Query<OAuthCallback>,
) -> WebResult<impl IntoResponse> {
    let (user, redirect_to) = domain::oauth::finish_login(
        app_state.db_conn_ref(),
        &app_state.config,
        &params.code,
        &params.state,
    )
    .await?;

    let token = domain::session::issue_session(&app_state.config, &user)?;
    let expires_at =
        Utc::now() + Duration::seconds(app_state.config.session_expiry_seconds as i64);
    domain::session::record(
        app_state.db_conn_ref(),
        user.id,
        &token,
        None,
        None,
        expires_at,
    )
    .await?;

    info!("OAuth login completed for user {}", user.id);

    let secure = app_state.config.is_production() || request_is_tls(&headers);
    let jar = set_session_cookie(jar, &app_state.config, token, secure);
    Ok((jar, Redirect::temporary(&redirect_to)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_redirect_only_allows_relative_paths() {
        assert_eq!(
            sanitize_redirect(Some("/chats/42".to_string())),
            Some("/chats/42".to_string())
        );
        assert_eq!(sanitize_redirect(Some("https://evil.example".to_string())), None);
        assert_eq!(sanitize_redirect(Some("//evil.example".to_string())), None);
        assert_eq!(sanitize_redirect(None), None);
    }
}
