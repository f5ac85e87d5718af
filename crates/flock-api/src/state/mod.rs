//! Application state
//!
//! Shared state for the Axum application: the service context, the digest
//! scheduler handle, the inbound media fetcher, and configuration.

use std::sync::Arc;

use flock_common::AppConfig;
use flock_service::{DigestScheduler, ServiceContext};
use flock_transport::MediaFetcher;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    service_context: Arc<ServiceContext>,
    scheduler: DigestScheduler,
    media_fetcher: Arc<MediaFetcher>,
    config: Arc<AppConfig>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(
        service_context: Arc<ServiceContext>,
        scheduler: DigestScheduler,
        media_fetcher: MediaFetcher,
        config: AppConfig,
    ) -> Self {
        Self {
            service_context,
            scheduler,
            media_fetcher: Arc::new(media_fetcher),
            config: Arc::new(config),
        }
    }

    /// Get the service context
    pub fn service_context(&self) -> &ServiceContext {
        &self.service_context
    }

    /// Get the digest scheduler handle
    pub fn scheduler(&self) -> &DigestScheduler {
        &self.scheduler
    }

    /// Get the inbound media fetcher
    pub fn media_fetcher(&self) -> &MediaFetcher {
        &self.media_fetcher
    }

    /// Get the application configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("service_context", &"ServiceContext")
            .field("config", &"AppConfig")
            .finish()
    }
}
