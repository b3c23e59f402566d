use crate::AppState;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;

/// Authentication middleware that returns 401 Unauthorized for requests that
/// do not carry a verifiable session token.
///
/// Signature verification alone gates entry here; handlers that need the full
/// user record use the AuthenticatedUser extractor, which re-verifies and
/// loads the row.
pub async fn require_auth(
    State(app_state): State<AppState>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Response {
    let verified = jar
        .get(&app_state.config.session_cookie_name)
        .and_then(|cookie| domain::session::verify_session(&app_state.config, cookie.value()));

    match verified {
        Some(_claims) => next.run(request).await,
        None => (StatusCode::UNAUTHORIZED, "Unauthorized").into_response(),
    }
}

#[cfg(test)]
#[cfg(feature = "mock")]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, middleware::from_fn_with_state, routing::get, Router};
    use clap::Parser;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use service::config::Config;
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn test_handler() -> &'static str {
        "authenticated"
    }

    fn test_app_state() -> AppState {
        std::env::set_var("SESSION_SIGNING_SECRET", "test-signing-secret");
        let config = Config::parse_from(["manga_platform_rs"]);
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        AppState::new(config, &db, Arc::new(sse::Manager::new()))
    }

    fn test_app(app_state: AppState) -> Router {
        Router::new()
            .route("/test", get(test_handler))
            .route_layer(from_fn_with_state(app_state.clone(), require_auth))
            .with_state(app_state)
    }

    #[tokio::test]
    async fn test_require_auth_returns_401_with_no_cookie() {
        let app = test_app(test_app_state());

        let request = Request::builder().uri("/test").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_require_auth_returns_401_with_garbage_token() {
        let app_state = test_app_state();
        let cookie_name = app_state.config.session_cookie_name.clone();
        let app = test_app(app_state);

        let request = Request::builder()
            .uri("/test")
            .header("cookie", format!("{cookie_name}=not-a-valid-token"))
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_require_auth_allows_valid_token_through() {
        use chrono::Utc;
        use domain::users;

        let app_state = test_app_state();
        let user = users::Model {
            id: domain::Id::new_v4(),
            email: "test@domain.com".to_string(),
            password: None,
            display_name: Some("test login".to_string()),
            nickname: None,
            email_verified_at: None,
            role: users::Role::User,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        };
        let token = domain::session::issue_session(&app_state.config, &user).unwrap();
        let cookie_name = app_state.config.session_cookie_name.clone();
        let app = test_app(app_state);

        let request = Request::builder()
            .uri("/test")
            .header("cookie", format!("{cookie_name}={token}"))
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
