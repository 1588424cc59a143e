// ABOUTME: HTTP API layer for the Keel settings subsystem
// ABOUTME: Router, shared state and the settings endpoint wiring

pub mod auth;
pub mod endpoint;
pub mod error;
pub mod response;
pub mod settings_handlers;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub use endpoint::{IntegrityNonces, SettingsEndpoint};
pub use error::EndpointError;
pub use response::{ApiResponse, SettingsResult};

/// State shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub endpoint: Arc<SettingsEndpoint>,
    /// SHA-256 hex of the admin bearer token; `None` disables admin access
    pub admin_token_hash: Option<Arc<str>>,
    pub menu_priority: i32,
}

impl AppState {
    pub fn new(
        endpoint: SettingsEndpoint,
        admin_token_hash: Option<String>,
        menu_priority: i32,
    ) -> Self {
        Self {
            endpoint: Arc::new(endpoint),
            admin_token_hash: admin_token_hash.map(Arc::from),
            menu_priority,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(settings_handlers::health))
        .route(
            "/api/settings",
            get(settings_handlers::get_settings).post(settings_handlers::save_settings),
        )
        .route("/api/settings/reset", post(settings_handlers::reset_settings))
        .route("/api/settings/nonces", get(settings_handlers::get_nonces))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
