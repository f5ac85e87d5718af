//! Server setup and initialization
//!
//! Builds the dependency graph (pool, repositories, transport, blob store,
//! service context), starts the digest scheduler, and runs the HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use flock_common::{AppConfig, AppError};
use flock_db::{
    create_pool, PgBroadcastRepository, PgDeliveryRepository, PgDirectoryRepository,
    PgReactionRepository,
};
use flock_service::{DigestScheduler, ServiceContextBuilder};
use flock_transport::{build_transport, DiskBlobStore, MediaFetcher};
use tokio::net::TcpListener;
use tracing::info;

use crate::middleware::apply_middleware;
use crate::routes::create_router;
use crate::state::AppState;

/// Build the complete Axum application with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    let router = create_router(&state.config().storage.upload_dir);
    let router = apply_middleware(router);
    router.with_state(state)
}

/// Initialize all dependencies and create AppState
pub async fn create_app_state(config: AppConfig) -> Result<AppState, AppError> {
    // Create database pool
    info!("Connecting to PostgreSQL...");
    let db_config = flock_db::DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        min_connections: config.database.min_connections,
        ..Default::default()
    };
    let pool = create_pool(&db_config)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;
    info!("PostgreSQL connection established");

    // Apply migrations
    flock_db::MIGRATOR
        .run(&pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    // Outbound adapters
    let transport = build_transport(&config.transport);
    let blob_store = Arc::new(DiskBlobStore::new(&config.storage));
    let media_fetcher = MediaFetcher::new(&config.transport);

    // Repositories
    let directory = Arc::new(PgDirectoryRepository::new(pool.clone()));
    let broadcasts = Arc::new(PgBroadcastRepository::new(pool.clone()));
    let reactions = Arc::new(PgReactionRepository::new(pool.clone()));
    let deliveries = Arc::new(PgDeliveryRepository::new(pool));

    // Build service context
    let service_context = ServiceContextBuilder::new()
        .directory(directory)
        .broadcasts(broadcasts)
        .reactions(reactions)
        .deliveries(deliveries)
        .transport(transport)
        .blob_store(blob_store)
        .engine(config.engine.clone())
        .build()
        .map_err(|e| AppError::Config(e.to_string()))?;
    let service_context = Arc::new(service_context);

    // Background digest scheduler
    let scheduler = DigestScheduler::start(service_context.clone());

    Ok(AppState::new(
        service_context,
        scheduler,
        media_fetcher,
        config,
    ))
}

/// Run the HTTP server
pub async fn run_server(app: Router, addr: SocketAddr) -> Result<(), AppError> {
    info!("Starting HTTP server on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Config(format!("Failed to bind to {}: {}", addr, e)))?;

    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::Config(format!("Server error: {}", e)))?;

    Ok(())
}

/// Run the complete server with configuration
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.api.port));

    // Create app state
    let state = create_app_state(config).await?;

    // Build application
    let app = create_app(state);

    // Run server
    run_server(app, addr).await
}
