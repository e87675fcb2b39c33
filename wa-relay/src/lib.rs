//! WA Relay - stateless WhatsApp webhook relay.
//!
//! Receives WhatsApp Cloud API webhooks, answers the subscription handshake,
//! and forwards every inbound text message to a downstream chat service.
//!
//! ## Architecture
//!
//! ```text
//! WhatsApp → POST /webhook → parse_event() → Forwarder → POST {downstream}/chat
//! ```
//!
//! Nothing is queued, stored or retried. Forward failures are logged only.

pub mod config;
pub mod error;
pub mod forward;
pub mod web;
pub mod whatsapp;

// Re-export commonly used types
pub use config::Config;
pub use error::WebhookError;
pub use forward::{ForwardError, ForwardPayload, Forwarder};
pub use web::{router, AppState};
pub use whatsapp::{parse_event, Extraction, IgnoreReason};
