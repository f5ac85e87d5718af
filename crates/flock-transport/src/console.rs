//! Console transport - logs outbound messages instead of sending them
//!
//! Used when provider credentials are absent, so the whole pipeline can run
//! locally without a provider account.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tracing::{info, instrument};

use flock_core::{SendReceipt, Transport, TransportError};

/// Transport that logs every send and always succeeds
#[derive(Debug, Default)]
pub struct ConsoleTransport {
    counter: AtomicU64,
}

#[async_trait]
impl Transport for ConsoleTransport {
    #[instrument(skip(self, text), fields(to = %address))]
    async fn send(&self, address: &str, text: &str) -> Result<SendReceipt, TransportError> {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        info!(to = %address, body = %text, "[TEST MODE] would send message");
        Ok(SendReceipt::new(format!("console-{n}")))
    }
}
