use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use log::*;
use sea_orm::DatabaseConnection;
use service::config::{ApiVersion, Config};
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

mod controller;
mod error;
mod extractors;
mod middleware;
mod params;
mod protect;
mod router;
mod sse_endpoint;

pub use self::error::{Error, Result};

// Web-level state shared by every handler. Needs to implement Clone to be
// able to be passed into Router as State.
#[derive(Clone)]
pub struct AppState {
    pub database_connection: Arc<DatabaseConnection>,
    pub config: Config,
    pub sse_manager: Arc<sse::Manager>,
}

impl AppState {
    pub fn new(config: Config, db: &Arc<DatabaseConnection>, sse_manager: Arc<sse::Manager>) -> Self {
        Self {
            database_connection: Arc::clone(db),
            config,
            sse_manager,
        }
    }

    pub fn db_conn_ref(&self) -> &DatabaseConnection {
        self.database_connection.as_ref()
    }
}

pub async fn init_server(app_state: AppState) -> anyhow::Result<()> {
    let host = app_state
        .config
        .interface
        .clone()
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let port = app_state.config.port;
    let server_url = format!("{host}:{port}");

    let listen_addr = SocketAddr::from_str(&server_url)?;

    info!("Server starting... listening for connections on http://{listen_addr}");

    let origins = app_state
        .config
        .allowed_origins
        .iter()
        .filter_map(|origin| {
            origin
                .parse::<HeaderValue>()
                .inspect_err(|_| warn!("Dropping unparseable CORS origin {origin}"))
                .ok()
        })
        .collect::<Vec<_>>();

    let cors_layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_credentials(true)
        .allow_headers([
            ACCEPT,
            AUTHORIZATION,
            CONTENT_TYPE,
            ApiVersion::field_name().parse()?,
        ])
        .allow_origin(origins);

    let router = router::define_routes(app_state).layer(cors_layer);

    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
