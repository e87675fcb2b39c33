//! Webhook endpoint handlers.
//!
//! The delivery handler acknowledges anything it cannot use with 200 so the
//! platform does not retry, and forwards text messages one at a time in the
//! order they arrived. Forward outcomes are logged, never returned.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Query, State},
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::WebhookError;
use crate::forward::Forwarder;
use crate::web::verify::{verify_subscription, Verification, VerifyQuery};
use crate::web::WEBHOOK_PATH;
use crate::whatsapp::{parse_event, Extraction, IgnoreReason, InboundMessage, RawMessage};
use crate::Config;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub forwarder: Forwarder,
}

impl AppState {
    pub fn new(config: Config, forwarder: Forwarder) -> Self {
        Self {
            config: Arc::new(config),
            forwarder,
        }
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Service info returned by `GET /`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub downstream_url: String,
    pub webhook: &'static str,
    pub note: &'static str,
}

/// Health check endpoint.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "running",
        version: env!("CARGO_PKG_VERSION"),
        downstream_url: state.config.downstream_base_url.clone(),
        webhook: WEBHOOK_PATH,
        note: "WhatsApp webhook relay operational.",
    })
}

// =============================================================================
// Subscription Handshake
// =============================================================================

/// Webhook verification endpoint (GET).
///
/// Returns the challenge as plain text with 200, or an empty 403.
pub async fn verify_webhook(
    State(state): State<AppState>,
    query: Result<Query<VerifyQuery>, QueryRejection>,
) -> Response {
    let query = match query {
        Ok(Query(query)) => query,
        Err(rejection) => {
            warn!(error = %rejection, "webhook_verification_bad_query");
            return StatusCode::FORBIDDEN.into_response();
        }
    };

    match verify_subscription(query, &state.config.verify_token) {
        Verification::Verified(challenge) => (StatusCode::OK, challenge).into_response(),
        Verification::Rejected => StatusCode::FORBIDDEN.into_response(),
    }
}

// =============================================================================
// Event Delivery
// =============================================================================

/// Acknowledgment bodies for deliveries.
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum WebhookAck {
    /// `{"received": true}`: nothing to process.
    Received { received: bool },
    /// `{"status": "ok"}`: messages processed.
    Processed { status: &'static str },
}

impl WebhookAck {
    pub fn received() -> Self {
        WebhookAck::Received { received: true }
    }

    pub fn processed() -> Self {
        WebhookAck::Processed { status: "ok" }
    }
}

/// Whether the request declares a JSON body.
///
/// Only `application/json` (with optional parameters) counts; anything else
/// is treated as an empty delivery.
fn is_json_request(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|essence| essence.trim().eq_ignore_ascii_case("application/json"))
        .unwrap_or(false)
}

/// Webhook receiver endpoint (POST).
///
/// This endpoint:
/// 1. Acknowledges non-JSON, non-WhatsApp or message-less notifications
/// 2. Forwards each text message sequentially, skipping other types
/// 3. Returns 200 whatever the forward outcomes
///
/// Only a structurally broken body yields 500.
pub async fn receive_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, WebhookError> {
    info!(body_length = body.len(), "webhook_delivery_received");

    if !is_json_request(&headers) {
        info!(
            reason = IgnoreReason::NotJson.as_str(),
            content_type = ?headers.get(CONTENT_TYPE),
            "webhook_delivery_ignored"
        );
        return Ok(Json(WebhookAck::received()));
    }

    let messages = match parse_event(&body)? {
        Extraction::Ignored(reason) => {
            info!(reason = reason.as_str(), "webhook_delivery_ignored");
            return Ok(Json(WebhookAck::received()));
        }
        Extraction::Messages(messages) => messages,
    };

    let mut forwarded = 0usize;
    let mut delivered = 0usize;
    let mut skipped = 0usize;

    for message in messages.iter().map(RawMessage::new) {
        match message.classify()? {
            InboundMessage::Text { from, body } => {
                info!(
                    from = %from,
                    text_length = body.len(),
                    "webhook_text_received"
                );

                if state.forwarder.forward(from, body).await.is_some() {
                    delivered += 1;
                }
                forwarded += 1;
            }
            InboundMessage::Anonymous { body } => {
                warn!(text_length = body.len(), "webhook_text_without_sender");
                skipped += 1;
            }
            InboundMessage::Unsupported { kind } => {
                info!(kind = ?kind, "webhook_non_text_ignored");
                skipped += 1;
            }
        }
    }

    info!(
        forwarded = forwarded,
        delivered = delivered,
        skipped = skipped,
        "webhook_delivery_processed"
    );

    Ok(Json(WebhookAck::processed()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_webhook_ack_bodies() {
        assert_eq!(
            serde_json::to_value(WebhookAck::received()).unwrap(),
            serde_json::json!({ "received": true })
        );
        assert_eq!(
            serde_json::to_value(WebhookAck::processed()).unwrap(),
            serde_json::json!({ "status": "ok" })
        );
    }

    #[test]
    fn test_is_json_request() {
        let mut headers = HeaderMap::new();
        assert!(!is_json_request(&headers));

        headers.insert(CONTENT_TYPE, "application/json".parse().unwrap());
        assert!(is_json_request(&headers));

        headers.insert(CONTENT_TYPE, "Application/JSON; charset=utf-8".parse().unwrap());
        assert!(is_json_request(&headers));

        headers.insert(CONTENT_TYPE, "text/plain".parse().unwrap());
        assert!(!is_json_request(&headers));

        headers.insert(
            CONTENT_TYPE,
            "application/x-www-form-urlencoded".parse().unwrap(),
        );
        assert!(!is_json_request(&headers));
    }
}
