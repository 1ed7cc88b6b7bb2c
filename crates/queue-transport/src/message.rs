//! # Raw Queue Message
//!
//! A message as it travels over the queue: string headers and a string body.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Header names carried on queue messages.
pub mod headers {
    /// Transaction correlation id.
    pub const REQUEST_ID: &str = "X-Request-Id";
    /// System that published the message.
    pub const ORIGIN_SYSTEM_ID: &str = "Origin-System-Id";
    /// Body content type.
    pub const CONTENT_TYPE: &str = "Content-Type";
    /// Unique id of a single message.
    pub const MESSAGE_ID: &str = "Message-Id";
    /// Kind of payload carried in the body.
    pub const MESSAGE_TYPE: &str = "Message-Type";
    /// Time the message was produced.
    pub const MESSAGE_TIMESTAMP: &str = "Message-Timestamp";
}

/// A message read from or written to a queue topic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMessage {
    /// Message headers.
    pub headers: HashMap<String, String>,
    /// Message body.
    pub body: String,
}

impl RawMessage {
    /// Create a message from headers and body.
    #[must_use]
    pub fn new(headers: HashMap<String, String>, body: impl Into<String>) -> Self {
        Self {
            headers,
            body: body.into(),
        }
    }

    /// Builder-style header insertion.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Look up a header value.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}
