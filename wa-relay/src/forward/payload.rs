//! Message format sent to the downstream chat service.

use serde::{Deserialize, Serialize};

/// Body of `POST {downstream}/chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardPayload {
    /// Sender WhatsApp ID
    pub user_id: String,
    /// Message text, verbatim
    pub text: String,
}

impl ForwardPayload {
    pub fn new(user_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            text: text.into(),
        }
    }
}
