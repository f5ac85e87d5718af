//! Flock server entry point
//!
//! Run with:
//! ```bash
//! cargo run -p flock-api
//! ```
//!
//! Configuration is loaded from environment variables (with .env support).

use flock_common::{try_init_tracing, AppConfig, TracingConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Configuration comes first: the tracing format depends on it
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    // JSON logs in production, pretty otherwise
    let tracing_config = if config.app.env.is_production() {
        TracingConfig::production()
    } else {
        TracingConfig::default()
    };
    if let Err(e) = try_init_tracing(tracing_config) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    info!(
        env = ?config.app.env,
        port = config.api.port,
        "Starting flock broadcast server"
    );

    if let Err(e) = flock_api::run(config).await {
        error!(error = %e, "Server failed to start");
        std::process::exit(1);
    }
}
