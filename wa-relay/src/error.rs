//! Errors that surface to the inbound caller.
//!
//! Only structural problems with a delivery payload reach the platform, and
//! always as the same generic 500 body. Downstream failures never do; see
//! [`crate::forward::ForwardError`].

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

/// A delivery payload that could not be processed.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    /// The body is not JSON.
    #[error("malformed webhook body: {0}")]
    MalformedBody(#[from] serde_json::Error),

    /// A field that must be a list or object has another JSON type.
    #[error("unexpected shape at `{0}`")]
    UnexpectedShape(&'static str),

    /// A text message lacks a field it must carry.
    #[error("text message is missing `{0}`")]
    MissingField(&'static str),
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        error!(error = %self, "webhook_processing_failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "internal_error" })),
        )
            .into_response()
    }
}
