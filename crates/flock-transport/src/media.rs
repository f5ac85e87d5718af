//! Inbound media fetching
//!
//! Provider webhooks deliver attachments as URLs on the provider's CDN.
//! The fetcher downloads them so the blob store can re-host under our own
//! public base.

use thiserror::Error;
use tracing::instrument;

use flock_common::TransportConfig;

/// Downloaded media body plus its content type
#[derive(Debug, Clone)]
pub struct FetchedMedia {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Media fetch failures degrade the inbound message to text-only
#[derive(Debug, Error)]
pub enum MediaFetchError {
    #[error("media fetch failed: {0}")]
    Http(String),

    #[error("media fetch returned status {0}")]
    Status(u16),
}

/// Downloads provider-hosted inbound media
pub struct MediaFetcher {
    client: reqwest::Client,
    /// Basic auth for provider media URLs, when configured for live mode
    credentials: Option<(String, String)>,
}

impl MediaFetcher {
    /// Create a fetcher; provider credentials are reused for media URLs
    pub fn new(config: &TransportConfig) -> Self {
        let credentials = match (&config.account_sid, &config.auth_token) {
            (Some(sid), Some(token)) => Some((sid.clone(), token.clone())),
            _ => None,
        };

        Self {
            client: reqwest::Client::new(),
            credentials,
        }
    }

    /// Download one media URL to bytes
    #[instrument(skip(self))]
    pub async fn fetch(&self, url: &str) -> Result<FetchedMedia, MediaFetchError> {
        let mut request = self.client.get(url);
        if let Some((sid, token)) = &self.credentials {
            request = request.basic_auth(sid, Some(token));
        }

        let response = request
            .send()
            .await
            .map_err(|e| MediaFetchError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MediaFetchError::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| MediaFetchError::Http(e.to_string()))?;

        Ok(FetchedMedia {
            bytes: bytes.to_vec(),
            content_type,
        })
    }
}
