//! # flock-transport
//!
//! Outbound adapters: the Twilio-style SMS transport, a console transport
//! for development/test mode, disk-backed blob storage for attachment
//! media, and inbound media fetching.

mod blob;
mod console;
mod media;
mod twilio;

pub use blob::DiskBlobStore;
pub use console::ConsoleTransport;
pub use media::{FetchedMedia, MediaFetcher, MediaFetchError};
pub use twilio::TwilioTransport;

use std::sync::Arc;

use flock_common::TransportConfig;
use flock_core::Transport;

/// Pick the transport for the configured credentials: live provider when
/// fully configured, console logging (test mode) otherwise.
pub fn build_transport(config: &TransportConfig) -> Arc<dyn Transport> {
    if config.is_live() {
        Arc::new(TwilioTransport::new(config))
    } else {
        tracing::warn!("provider credentials missing, outbound messages will only be logged");
        Arc::new(ConsoleTransport::default())
    }
}
