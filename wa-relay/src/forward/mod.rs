//! Forwarding of text messages to the downstream chat service.
//!
//! ```text
//! (user_id, text) → ForwardPayload → POST {downstream}/chat
//! ```
//!
//! Each call is one-shot: no retry, no backoff. The outcome is only logged.

pub mod forwarder;
pub mod payload;

pub use forwarder::{ForwardError, Forwarder};
pub use payload::ForwardPayload;
