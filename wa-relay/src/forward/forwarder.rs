//! Best-effort HTTP forwarding to the downstream chat service.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tracing::{error, info};

use super::payload::ForwardPayload;
use crate::Config;

/// Longest downstream error body kept in logs.
const MAX_ERROR_BODY_CHARS: usize = 256;

/// Errors from a single forward attempt.
#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    /// Transport failure: connect error, timeout, body read error.
    #[error("downstream request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The downstream service answered with a non-success status.
    #[error("downstream returned non-success status {status}: {body}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated.
        body: String,
    },
}

/// Shared forwarder holding a pooled HTTP client.
///
/// Cloning is cheap; all clones share one connection pool.
#[derive(Clone)]
pub struct Forwarder {
    inner: Arc<ForwarderInner>,
}

struct ForwarderInner {
    client: Client,
    chat_url: String,
    timeout: Duration,
}

impl Forwarder {
    /// Create a forwarder posting to `chat_url` with the given per-call timeout.
    pub fn new(chat_url: String, timeout: Duration) -> Result<Self, ForwardError> {
        let client = Client::builder()
            .user_agent(concat!("wa-relay/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(ForwarderInner {
                client,
                chat_url,
                timeout,
            }),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ForwardError> {
        Self::new(config.chat_url(), config.forward_timeout)
    }

    pub fn chat_url(&self) -> &str {
        &self.inner.chat_url
    }

    /// Post one payload and return the downstream response body.
    ///
    /// A JSON body is returned as parsed; any other body as a JSON string,
    /// and an empty body as `null`.
    pub async fn send(&self, payload: &ForwardPayload) -> Result<Value, ForwardError> {
        let response = self
            .inner
            .client
            .post(&self.inner.chat_url)
            .timeout(self.inner.timeout)
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ForwardError::HttpStatus {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        Ok(parse_body(body))
    }

    /// Forward a message, logging the outcome.
    ///
    /// Failures are logged and reported as `None`; they never propagate.
    pub async fn forward(&self, user_id: &str, text: &str) -> Option<Value> {
        let payload = ForwardPayload::new(user_id, text);

        info!(
            user_id = %user_id,
            text_length = text.len(),
            url = %self.inner.chat_url,
            "forward_starting"
        );

        match self.send(&payload).await {
            Ok(response) => {
                info!(user_id = %user_id, response = %response, "forward_ok");
                Some(response)
            }
            Err(ForwardError::HttpStatus { status, body }) => {
                // Prefer the downstream's structured error when it sent one.
                let detail = parse_body(body);
                error!(
                    user_id = %user_id,
                    status_code = status,
                    error = %detail,
                    "forward_failed"
                );
                None
            }
            Err(ForwardError::Request(e)) => {
                if e.is_timeout() {
                    error!(
                        user_id = %user_id,
                        timeout_seconds = self.inner.timeout.as_secs_f64(),
                        error = %e,
                        "forward_timeout"
                    );
                } else if e.is_connect() {
                    error!(user_id = %user_id, error = %e, "forward_connect_error");
                } else {
                    error!(user_id = %user_id, error = %e, "forward_failed");
                }
                None
            }
        }
    }
}

fn parse_body(body: String) -> Value {
    if body.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(&body).unwrap_or(Value::String(body))
}

fn truncate_body(raw: &str) -> String {
    if raw.chars().count() > MAX_ERROR_BODY_CHARS {
        let shortened: String = raw.chars().take(MAX_ERROR_BODY_CHARS).collect();
        return format!("{shortened}...[truncated]");
    }
    raw.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forwarder_creation() {
        let forwarder =
            Forwarder::new("http://127.0.0.1:8000/chat".to_string(), Duration::from_secs(15))
                .unwrap();
        let clone = forwarder.clone();

        assert_eq!(clone.chat_url(), "http://127.0.0.1:8000/chat");
        assert_eq!(Arc::strong_count(&forwarder.inner), 2);
    }

    #[test]
    fn test_from_config_uses_chat_url() {
        let config = Config {
            downstream_base_url: "https://rag.example.com".to_string(),
            ..Config::default()
        };
        let forwarder = Forwarder::from_config(&config).unwrap();
        assert_eq!(forwarder.chat_url(), "https://rag.example.com/chat");
    }

    #[test]
    fn test_parse_body() {
        assert_eq!(parse_body(String::new()), Value::Null);
        assert_eq!(
            parse_body(r#"{"reply":"hello"}"#.to_string()),
            serde_json::json!({ "reply": "hello" })
        );
        assert_eq!(
            parse_body("plain text".to_string()),
            Value::String("plain text".to_string())
        );
    }

    #[test]
    fn test_truncate_body() {
        assert_eq!(truncate_body("short"), "short");

        let long = "x".repeat(400);
        let truncated = truncate_body(&long);
        assert!(truncated.ends_with("...[truncated]"));
        assert_eq!(truncated.len(), MAX_ERROR_BODY_CHARS + "...[truncated]".len());
    }
}
