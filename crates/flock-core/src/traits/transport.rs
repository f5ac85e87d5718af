//! Outbound ports - text transport and attachment blob storage

use async_trait::async_trait;
use thiserror::Error;

/// Provider acknowledgment for one accepted send
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SendReceipt {
    pub provider_id: Option<String>,
}

impl SendReceipt {
    pub fn new(provider_id: impl Into<String>) -> Self {
        Self {
            provider_id: Some(provider_id.into()),
        }
    }
}

/// Transport failures are per-recipient and recoverable; the engine retries
/// and records them, it never aborts a batch on one.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("provider rejected send to {address}: {reason}")]
    Rejected { address: String, reason: String },

    #[error("transport unavailable: {0}")]
    Unavailable(String),
}

/// Send-one-message-to-one-address capability.
///
/// Implementations must be safe to call concurrently from multiple workers.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, address: &str, text: &str) -> Result<SendReceipt, TransportError>;
}

/// Blob storage failures degrade the message to text-only, never abort it
#[derive(Debug, Error)]
pub enum BlobError {
    #[error("blob storage failure: {0}")]
    Storage(String),

    #[error("unsupported media type: {0}")]
    UnsupportedType(String),
}

/// Store-bytes-return-URL capability for attachment media
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn store(&self, bytes: &[u8], content_type: &str) -> Result<String, BlobError>;
}
