//! # flock-api
//!
//! Webhook ingress built with Axum: the provider SMS webhook, health
//! endpoints, media hosting, and server wiring.

pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use server::{create_app, create_app_state, run, run_server};
pub use state::AppState;
