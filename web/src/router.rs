use crate::{
    controller::health_check_controller, middleware::auth::require_auth, params, protect,
    sse_endpoint, AppState,
};
use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::services::ServeDir;

use crate::controller::{
    chapter_controller, chat_controller, chat_message_controller, comment_controller,
    oauth_controller, title_controller, user_controller, user_session_controller,
    verification_controller,
};

use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_rapidoc::RapiDoc;

// This is the global definition of our OpenAPI spec. To be a part
// of the rendered spec, a path and schema must be listed here.
#[derive(OpenApi)]
#[openapi(
        info(
            title = "Mangapulse API"
        ),
        paths(
            chapter_controller::index,
            chapter_controller::read,
            chapter_controller::create,
            chat_controller::create,
            chat_controller::index,
            chat_controller::read,
            chat_controller::pin,
            chat_controller::unpin,
            chat_message_controller::index,
            chat_message_controller::create,
            chat_message_controller::delete,
            chat_message_controller::toggle_reaction,
            comment_controller::index,
            comment_controller::create,
            comment_controller::delete,
            health_check_controller::health_check,
            oauth_controller::authorize,
            oauth_controller::callback,
            title_controller::index,
            title_controller::read,
            title_controller::create,
            title_controller::update,
            title_controller::delete,
            user_controller::create,
            user_controller::update,
            user_controller::update_role,
            user_session_controller::login,
            user_session_controller::logout,
            verification_controller::verify_email,
        ),
        components(
            schemas(
                domain::chapters::Model,
                domain::chat_members::Model,
                domain::chat_messages::Model,
                domain::chats::Model,
                chat_controller::ChatWithMembers,
                domain::comments::Model,
                domain::titles::Model,
                domain::users::Model,
                domain::user::Credentials,
                params::chat::CreateParams,
                params::chat::CreateMessageParams,
                params::chat::PinParams,
                params::chat::ReactionParams,
                params::comment::CreateParams,
                params::user::CreateParams,
                params::user::UpdateProfileParams,
                params::user::UpdateRoleParams,
            )
        ),
        modifiers(&SecurityAddon),
        tags(
            (name = "mangapulse", description = "Mangapulse reading & chat API")
        )
    )]
struct ApiDoc;

struct SecurityAddon;

// Defines our cookie session based authentication requirement for gaining access to our
// API endpoints for OpenAPI.
impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "cookie_auth",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    service::config::DEFAULT_SESSION_COOKIE_NAME,
                    "Signed session token returned from successful login via Set-Cookie header",
                ))),
            )
        }
    }
}

pub fn define_routes(app_state: AppState) -> Router {
    Router::new()
        .merge(chat_routes(app_state.clone()))
        .merge(catalog_routes(app_state.clone()))
        .merge(comment_routes(app_state.clone()))
        .merge(health_routes())
        .merge(oauth_routes(app_state.clone()))
        .merge(user_routes(app_state.clone()))
        .merge(user_session_routes(app_state.clone()))
        .merge(verification_routes(app_state))
        .merge(RapiDoc::with_openapi("/api-docs/openapi2.json", ApiDoc::openapi()).path("/rapidoc"))
        .fallback_service(static_routes())
}

fn health_routes() -> Router {
    Router::new().route(
        "/health_check",
        get(health_check_controller::health_check),
    )
}

fn user_routes(app_state: AppState) -> Router {
    Router::new()
        // Registration is the one public user endpoint
        .route("/users", post(user_controller::create))
        .merge(
            // PUT /users/{id}
            Router::new()
                .route("/users/{id}", put(user_controller::update))
                .route_layer(from_fn_with_state(
                    app_state.clone(),
                    protect::users::update,
                ))
                .route_layer(from_fn_with_state(app_state.clone(), require_auth)),
        )
        .merge(
            // PUT /users/{id}/role
            Router::new()
                .route("/users/{id}/role", put(user_controller::update_role))
                .route_layer(from_fn_with_state(
                    app_state.clone(),
                    protect::users::update_role,
                ))
                .route_layer(from_fn_with_state(app_state.clone(), require_auth)),
        )
        .with_state(app_state)
}

fn user_session_routes(app_state: AppState) -> Router {
    // Logout stays reachable without a live session so stale clients can
    // always clear their cookies.
    Router::new()
        .route("/login", post(user_session_controller::login))
        .route("/logout", delete(user_session_controller::logout))
        .with_state(app_state)
}

fn verification_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/verify_email", get(verification_controller::verify_email))
        .with_state(app_state)
}

/// Routes for the OAuth login flow. Both legs are public: authorize starts a
/// login, and the callback is reached via the provider's redirect.
fn oauth_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/oauth/authorize", get(oauth_controller::authorize))
        .route("/oauth/callback", get(oauth_controller::callback))
        .with_state(app_state)
}

fn chat_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/chats", post(chat_controller::create))
        .route("/chats", get(chat_controller::index))
        .merge(
            // Everything underneath a specific chat is members-only
            Router::new()
                .route("/chats/{chat_id}", get(chat_controller::read))
                .route("/chats/{chat_id}/pin", put(chat_controller::pin))
                .route("/chats/{chat_id}/pin", delete(chat_controller::unpin))
                .route(
                    "/chats/{chat_id}/messages",
                    get(chat_message_controller::index),
                )
                .route(
                    "/chats/{chat_id}/messages",
                    post(chat_message_controller::create),
                )
                .route(
                    "/chats/{chat_id}/messages/{message_id}",
                    delete(chat_message_controller::delete),
                )
                .route(
                    "/chats/{chat_id}/messages/{message_id}/reactions",
                    put(chat_message_controller::toggle_reaction),
                )
                .route(
                    "/chats/{chat_id}/events",
                    get(sse_endpoint::handler::chat_events),
                )
                .route_layer(from_fn_with_state(
                    app_state.clone(),
                    protect::chats::member,
                )),
        )
        .route_layer(from_fn_with_state(app_state.clone(), require_auth))
        .with_state(app_state)
}

fn catalog_routes(app_state: AppState) -> Router {
    Router::new()
        // Reading the catalog is public
        .route("/titles", get(title_controller::index))
        .route("/titles/{id}", get(title_controller::read))
        .route("/titles/{id}/chapters", get(chapter_controller::index))
        .route("/chapters/{id}", get(chapter_controller::read))
        .merge(
            // Catalog mutations are staff-only
            Router::new()
                .route("/titles", post(title_controller::create))
                .route("/titles/{id}", put(title_controller::update))
                .route("/titles/{id}", delete(title_controller::delete))
                .route("/titles/{id}/chapters", post(chapter_controller::create))
                .route_layer(from_fn_with_state(
                    app_state.clone(),
                    protect::catalog::moderator,
                ))
                .route_layer(from_fn_with_state(app_state.clone(), require_auth)),
        )
        .with_state(app_state)
}

fn comment_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/titles/{id}/comments", get(comment_controller::index))
        .merge(
            Router::new()
                .route("/titles/{id}/comments", post(comment_controller::create))
                .route("/comments/{id}", delete(comment_controller::delete))
                .route_layer(from_fn_with_state(app_state.clone(), require_auth)),
        )
        .with_state(app_state)
}

// This will serve static files that we can use as a "fallback" for when the server panics
pub fn static_routes() -> Router {
    Router::new().nest_service("/", ServeDir::new("./"))
}
