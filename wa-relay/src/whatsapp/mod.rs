//! WhatsApp webhook payload parsing.
//!
//! ## Processing Flow
//!
//! ```text
//! raw body → parse_event() → Extraction::Ignored | Extraction::Messages → classify()
//! ```

pub mod types;

use serde_json::Value;
use tracing::{debug, info};

use crate::error::WebhookError;

pub use types::{
    Change, Entry, InboundEvent, InboundMessage, RawMessage, TEXT_MESSAGE_TYPE, WHATSAPP_OBJECT,
};

/// Why a delivery was acknowledged without processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The request did not carry a JSON body.
    NotJson,
    /// The `object` discriminator is missing or not a WhatsApp account.
    UnexpectedObject,
    /// No message list under the first entry's first change.
    NoMessages,
}

impl IgnoreReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            IgnoreReason::NotJson => "not_json",
            IgnoreReason::UnexpectedObject => "unexpected_object",
            IgnoreReason::NoMessages => "no_messages",
        }
    }
}

/// Outcome of reading a delivery payload.
#[derive(Debug)]
pub enum Extraction {
    Ignored(IgnoreReason),
    /// Raw messages of the first change, in delivery order, not yet inspected.
    Messages(Vec<Value>),
}

/// Parse a delivery body and pull out the message list.
///
/// Only `entry[0].changes[0].value.messages` is looked at; anything else in
/// the payload may have any shape. Individual messages are left untouched
/// until [`RawMessage::classify`].
pub fn parse_event(body: &[u8]) -> Result<Extraction, WebhookError> {
    let value: Value = serde_json::from_slice(body)?;
    let event = InboundEvent::new(&value);

    if !event.is_whatsapp() {
        debug!(object = ?event.object(), "webhook_object_ignored");
        return Ok(Extraction::Ignored(IgnoreReason::UnexpectedObject));
    }

    let messages = match event.first_change() {
        Some(change) => change.messages()?,
        None => None,
    };

    match messages {
        Some(messages) => {
            info!(message_count = messages.len(), "webhook_messages_extracted");
            Ok(Extraction::Messages(
                messages.iter().map(|m| m.as_value().clone()).collect(),
            ))
        }
        None => {
            debug!("webhook_no_messages");
            Ok(Extraction::Ignored(IgnoreReason::NoMessages))
        }
    }
}
