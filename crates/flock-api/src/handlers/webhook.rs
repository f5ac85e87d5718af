//! Provider webhook handler
//!
//! The SMS provider POSTs inbound messages as form fields (`From`, `Body`,
//! `NumMedia`, `MediaUrl{N}`, `MediaContentType{N}`). The reply, when the
//! engine produces one, goes back as TwiML; the webhook always answers 200
//! so the provider never retries a message the engine already handled.

use std::collections::HashMap;

use axum::{
    extract::State,
    http::header::CONTENT_TYPE,
    response::{IntoResponse, Response},
    Form,
};
use tracing::{error, instrument, warn};

use flock_service::{InboundMedia, InboundService};

use crate::state::AppState;

/// Cap on attachments pulled from one inbound message
const MAX_INBOUND_MEDIA: usize = 10;

/// POST /webhook/sms
#[instrument(skip_all)]
pub async fn inbound_sms(
    State(state): State<AppState>,
    Form(params): Form<HashMap<String, String>>,
) -> Response {
    let from = params.get("From").map(|s| s.trim()).unwrap_or_default();
    let body = params.get("Body").map(String::as_str).unwrap_or_default();

    if from.is_empty() {
        warn!("webhook call without a From field");
        return twiml(None);
    }

    let media = fetch_inbound_media(&state, &params).await;

    let service = InboundService::new(state.service_context()).with_scheduler(state.scheduler());
    match service.handle_inbound(from, body, media).await {
        Ok(reply) => twiml(reply.as_deref()),
        Err(e) => {
            error!(error = %e, "inbound handling failed");
            twiml(Some(&e.user_message()))
        }
    }
}

/// Download provider-hosted media so the engine can re-host it.
/// Failures degrade the message to text-only.
async fn fetch_inbound_media(
    state: &AppState,
    params: &HashMap<String, String>,
) -> Vec<InboundMedia> {
    let num_media = params
        .get("NumMedia")
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(0)
        .min(MAX_INBOUND_MEDIA);

    let mut media = Vec::with_capacity(num_media);
    for i in 0..num_media {
        let Some(url) = params.get(&format!("MediaUrl{i}")) else {
            continue;
        };
        match state.media_fetcher().fetch(url).await {
            Ok(fetched) => {
                let content_type = params
                    .get(&format!("MediaContentType{i}"))
                    .cloned()
                    .unwrap_or(fetched.content_type);
                media.push(InboundMedia {
                    bytes: fetched.bytes,
                    content_type,
                });
            }
            Err(e) => warn!(error = %e, index = i, "inbound media fetch failed"),
        }
    }
    media
}

/// Render a TwiML response, empty when there is nothing to reply
fn twiml(message: Option<&str>) -> Response {
    let body = match message {
        Some(text) => format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response><Message>{}</Message></Response>",
            escape_xml(text)
        ),
        None => "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response/>".to_string(),
    };

    ([(CONTENT_TYPE, "application/xml")], body).into_response()
}

/// Minimal XML text escaping for TwiML bodies
fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
