//! Inbound WhatsApp Cloud API payload views.
//!
//! The platform controls the shape, so nothing is parsed up front. Each
//! level is a thin view over the raw JSON with `Option` accessors: a missing
//! or oddly typed level means "nothing to forward" rather than a failure.
//! Only the first entry and its first change are ever looked at, and a
//! message is only inspected when it is reached.

use serde_json::Value;

use crate::error::WebhookError;

/// Discriminator value for WhatsApp Business Account notifications.
pub const WHATSAPP_OBJECT: &str = "whatsapp_business_account";

/// Message type carrying a text body.
pub const TEXT_MESSAGE_TYPE: &str = "text";

/// Root webhook notification.
#[derive(Debug, Clone, Copy)]
pub struct InboundEvent<'a>(&'a Value);

/// One element of `entry`.
#[derive(Debug, Clone, Copy)]
pub struct Entry<'a>(&'a Value);

/// One element of an entry's `changes`.
#[derive(Debug, Clone, Copy)]
pub struct Change<'a>(&'a Value);

/// A single message as delivered by the platform.
#[derive(Debug, Clone, Copy)]
pub struct RawMessage<'a>(&'a Value);

/// A message classified for forwarding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundMessage<'a> {
    Text { from: &'a str, body: &'a str },
    /// A text message with no usable sender.
    Anonymous { body: &'a str },
    Unsupported { kind: Option<&'a str> },
}

impl<'a> InboundEvent<'a> {
    pub fn new(value: &'a Value) -> Self {
        Self(value)
    }

    /// The `object` discriminator, when it is a string.
    pub fn object(&self) -> Option<&'a str> {
        self.0.get("object").and_then(Value::as_str)
    }

    pub fn is_whatsapp(&self) -> bool {
        self.object() == Some(WHATSAPP_OBJECT)
    }

    pub fn first_entry(&self) -> Option<Entry<'a>> {
        first_of(self.0, "entry").map(Entry)
    }

    /// The first change of the first entry, if both exist.
    pub fn first_change(&self) -> Option<Change<'a>> {
        self.first_entry()?.first_change()
    }
}

impl<'a> Entry<'a> {
    pub fn first_change(&self) -> Option<Change<'a>> {
        first_of(self.0, "changes").map(Change)
    }
}

impl<'a> Change<'a> {
    /// The raw `value.messages` field. `None` when absent or `null`.
    pub fn messages_value(&self) -> Option<&'a Value> {
        self.0
            .get("value")?
            .get("messages")
            .filter(|messages| !messages.is_null())
    }

    /// Messages carried by this change.
    ///
    /// `Ok(None)` when there is no message list; an error when `messages`
    /// is present but not a list.
    pub fn messages(&self) -> Result<Option<Vec<RawMessage<'a>>>, WebhookError> {
        let Some(value) = self.messages_value() else {
            return Ok(None);
        };

        let list = value
            .as_array()
            .ok_or(WebhookError::UnexpectedShape("value.messages"))?;

        Ok(Some(list.iter().map(RawMessage).collect()))
    }
}

impl<'a> RawMessage<'a> {
    pub fn new(value: &'a Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &'a Value {
        self.0
    }

    /// Message type: "text", "image", "audio", ...
    pub fn kind(&self) -> Option<&'a str> {
        self.0.get("type").and_then(Value::as_str)
    }

    /// Sender WhatsApp ID (phone number).
    pub fn from(&self) -> Option<&'a str> {
        self.0.get("from").and_then(Value::as_str)
    }

    pub fn is_text(&self) -> bool {
        self.kind() == Some(TEXT_MESSAGE_TYPE)
    }

    /// Classify this message.
    ///
    /// Non-text messages are `Unsupported` and their other fields are never
    /// read. A text message without a string `text.body` is a structural
    /// error.
    pub fn classify(&self) -> Result<InboundMessage<'a>, WebhookError> {
        if !self.is_text() {
            return Ok(InboundMessage::Unsupported { kind: self.kind() });
        }

        let body = self
            .0
            .get("text")
            .and_then(|text| text.get("body"))
            .and_then(Value::as_str)
            .ok_or(WebhookError::MissingField("text.body"))?;

        Ok(match self.from() {
            Some(from) => InboundMessage::Text { from, body },
            None => InboundMessage::Anonymous { body },
        })
    }
}

/// First element of the array under `key`, if `key` holds a non-empty array.
fn first_of<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    value.get(key)?.as_array()?.first()
}
