//! Route definitions

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::services::ServeDir;

use crate::handlers::{health, webhook};
use crate::state::AppState;

/// Create the main router
pub fn create_router(upload_dir: &str) -> Router<AppState> {
    Router::new()
        .route("/", get(health::home))
        .route("/webhook/sms", post(webhook::inbound_sms))
        // Re-hosted attachment media referenced by broadcast links
        .nest_service("/media", ServeDir::new(upload_dir))
        .merge(health_routes())
}

/// Health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
}
