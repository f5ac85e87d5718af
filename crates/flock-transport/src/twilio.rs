//! Twilio-style SMS transport
//!
//! POSTs to the provider Messages endpoint with HTTP basic auth. One
//! instance is shared by all fan-out workers; `reqwest::Client` is
//! internally pooled and safe for concurrent use.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

use flock_common::TransportConfig;
use flock_core::{SendReceipt, Transport, TransportError};

/// Provider response body for an accepted message
#[derive(Debug, Deserialize)]
struct MessageResponse {
    sid: String,
}

/// SMS transport backed by the Twilio REST API
pub struct TwilioTransport {
    client: reqwest::Client,
    account_sid: String,
    auth_token: String,
    from_number: String,
    messages_url: String,
}

impl TwilioTransport {
    /// Create a transport from provider configuration.
    ///
    /// Callers should check `TransportConfig::is_live` first; missing
    /// credentials here become empty strings and every send will be rejected.
    pub fn new(config: &TransportConfig) -> Self {
        let account_sid = config.account_sid.clone().unwrap_or_default();
        let messages_url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            config.base_url.trim_end_matches('/'),
            account_sid
        );

        Self {
            client: reqwest::Client::new(),
            account_sid,
            auth_token: config.auth_token.clone().unwrap_or_default(),
            from_number: config.from_number.clone(),
            messages_url,
        }
    }
}

#[async_trait]
impl Transport for TwilioTransport {
    #[instrument(skip(self, text), fields(to = %address))]
    async fn send(&self, address: &str, text: &str) -> Result<SendReceipt, TransportError> {
        let params = [
            ("To", address),
            ("From", self.from_number.as_str()),
            ("Body", text),
        ];

        let response = self
            .client
            .post(&self.messages_url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&params)
            .send()
            .await
            .map_err(|e| TransportError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Rejected {
                address: address.to_string(),
                reason: format!("{status}: {body}"),
            });
        }

        let message: MessageResponse = response
            .json()
            .await
            .map_err(|e| TransportError::Unavailable(e.to_string()))?;

        debug!(sid = %message.sid, "provider accepted message");
        Ok(SendReceipt::new(message.sid))
    }
}
