use crate::controller::ApiResponse;
use crate::error::Result as WebResult;
use crate::AppState;
use axum::{
    extract::{ConnectInfo, State},
    http::{header::USER_AGENT, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use domain::error::{DomainErrorKind, EntityErrorKind, InternalErrorKind};
use domain::user::Credentials;
use log::*;
use serde_json::json;
use service::config::{Config, LEGACY_SESSION_COOKIE_NAMES};
use std::net::SocketAddr;

fn session_cookie(config: &Config, token: String, secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::new(config.session_cookie_name.clone(), token);
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_path("/");
    cookie.set_max_age(time::Duration::seconds(config.session_expiry_seconds as i64));
    cookie.set_secure(secure);
    cookie
}

/// A request that arrived via a TLS-terminating proxy carries
/// `x-forwarded-proto: https`; the cookie gets the Secure attribute for those
/// and for anything running in production.
pub(crate) fn request_is_tls(headers: &HeaderMap) -> bool {
    headers
        .get("x-forwarded-proto")
        .and_then(|value| value.to_str().ok())
        .map(|proto| proto.eq_ignore_ascii_case("https"))
        .unwrap_or(false)
}

pub(crate) fn set_session_cookie(
    jar: CookieJar,
    config: &Config,
    token: String,
    secure: bool,
) -> CookieJar {
    jar.add(session_cookie(config, token, secure))
}

/// Logs the user into the platform and returns a new signed session cookie.
///
/// Successful login will return the session cookie, e.g.:
/// set-cookie: mp_session=eyJhb...; HttpOnly; SameSite=Lax; Path=/; Max-Age=2592000
///
/// After logging in successfully, the browser sends the cookie back on
/// every API call, e.g.:
/// curl -v --header "Cookie: mp_session=eyJhb..." --request GET http://localhost:4000/chats
#[utoipa::path(
    post,
    path = "/login",
    request_body(content = domain::user::Credentials, content_type = "application/json"),
    responses(
        (status = 200, description = "Logs in and returns the session cookie"),
        (status = 401, description = "Unauthorized (stable code `invalid_credentials`)"),
        (status = 405, description = "Method not allowed")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    ConnectInfo(peer_addr): ConnectInfo<SocketAddr>,
    jar: CookieJar,
    headers: HeaderMap,
    Json(creds): Json<Credentials>,
) -> WebResult<axum::response::Response> {
    let user_agent = headers
        .get(USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .map(String::from);

    let (user, token) = match domain::session::login(
        app_state.db_conn_ref(),
        &app_state.config,
        creds,
        user_agent,
        Some(peer_addr.ip().to_string()),
    )
    .await
    {
        Ok(session) => session,
        // The one stable machine-readable failure code. Unknown email and
        // wrong password both arrive here as the same Unauthenticated kind.
        Err(e)
            if e.error_kind
                == DomainErrorKind::Internal(InternalErrorKind::Entity(
                    EntityErrorKind::Unauthenticated,
                )) =>
        {
            info!("Login rejected");
            return Ok((
                StatusCode::UNAUTHORIZED,
                Json(json!({"error": "invalid_credentials"})),
            )
                .into_response());
        }
        Err(e) => return Err(e.into()),
    };

    let secure = app_state.config.is_production() || request_is_tls(&headers);
    let jar = set_session_cookie(jar, &app_state.config, token, secure);

    let user_session_json = json!({
        "id": user.id,
        "email": user.email,
        "display_name": user.display_name,
        "nickname": user.nickname,
        "role": user.role,
    });

    Ok((
        jar,
        Json(ApiResponse::new(StatusCode::OK.into(), user_session_json)),
    )
        .into_response())
}

/// Logs the user out by revoking the server-side session and expiring the
/// session cookie. Cookie names used by earlier releases are expired too, so
/// stale clients are not left holding a credential under a retired name.
#[utoipa::path(
    delete,
    path = "/logout",
    responses(
        (status = 200, description = "Successfully logged out"),
        (status = 405, description = "Method not allowed")
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn logout(
    State(app_state): State<AppState>,
    jar: CookieJar,
) -> WebResult<impl IntoResponse> {
    let raw_token = jar
        .get(&app_state.config.session_cookie_name)
        .map(|cookie| cookie.value().to_string());

    domain::session::logout(app_state.db_conn_ref(), raw_token.as_deref()).await?;

    let mut jar = jar;
    for name in std::iter::once(app_state.config.session_cookie_name.as_str())
        .chain(LEGACY_SESSION_COOKIE_NAMES.iter().copied())
    {
        jar = jar.remove(Cookie::build((name.to_string(), "")).path("/").build());
    }

    Ok((jar, StatusCode::OK))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn test_config() -> Config {
        Config::parse_from(["manga_platform_rs"])
    }

    #[test]
    fn test_session_cookie_attributes() {
        let config = test_config();

        let cookie = session_cookie(&config, "raw-token".to_string(), false);
        assert_eq!(cookie.name(), "mp_session");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(time::Duration::seconds(2_592_000)));
        assert_eq!(cookie.secure(), Some(false));

        let secure_cookie = session_cookie(&config, "raw-token".to_string(), true);
        assert_eq!(secure_cookie.secure(), Some(true));
    }

    #[test]
    fn test_request_is_tls_reads_forwarded_proto() {
        let mut headers = HeaderMap::new();
        assert!(!request_is_tls(&headers));

        headers.insert("x-forwarded-proto", "https".parse().unwrap());
        assert!(request_is_tls(&headers));

        headers.insert("x-forwarded-proto", "http".parse().unwrap());
        assert!(!request_is_tls(&headers));
    }
}

#[cfg(test)]
// We need to gate seaORM's mock feature behind conditional compilation because
// the feature removes the Clone trait implementation from seaORM's DatabaseConnection.
// see https://github.com/SeaQL/sea-orm/issues/830
#[cfg(feature = "mock")]
mod mock_tests {
    use super::*;
    use axum::extract::connect_info::MockConnectInfo;
    use axum::{body::Body, http::Request, routing::post, Router};
    use chrono::Utc;
    use clap::Parser;
    use domain::users;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn login_app(db: MockDatabase) -> Router {
        std::env::set_var("SESSION_SIGNING_SECRET", "test-signing-secret");
        let config = Config::parse_from(["manga_platform_rs"]);
        let db = Arc::new(db.into_connection());
        let app_state = crate::AppState::new(config, &db, Arc::new(sse::Manager::new()));

        Router::new()
            .route("/login", post(login))
            .layer(MockConnectInfo(SocketAddr::from(([127, 0, 0, 1], 4000))))
            .with_state(app_state)
    }

    fn login_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/login")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn response_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_login_with_unknown_email_returns_invalid_credentials() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<users::Model>::new()]);
        let app = login_app(db);

        let response = app
            .oneshot(login_request(r#"{"email":"a@x.com","password":"secret1"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().get("set-cookie").is_none());
        assert_eq!(response_json(response).await["error"], "invalid_credentials");
    }

    #[tokio::test]
    async fn test_login_with_wrong_password_returns_invalid_credentials() {
        let user = users::Model {
            id: domain::Id::new_v4(),
            email: "a@x.com".to_string(),
            password: Some(password_auth::generate_hash("secret1")),
            display_name: None,
            nickname: None,
            email_verified_at: None,
            role: users::Role::User,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres).append_query_results([vec![user]]);
        let app = login_app(db);

        let response = app
            .oneshot(login_request(r#"{"email":"a@x.com","password":"wrong"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().get("set-cookie").is_none());
        assert_eq!(response_json(response).await["error"], "invalid_credentials");
    }
}
