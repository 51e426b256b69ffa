//! Moderated Channel Contracts
//!
//! Data types shared by the store, the pipeline and the HTTP surface.
//! The message shape is the one every hub client reads back from `GET /`.

mod hub;
mod moderation;

pub use hub::*;
pub use moderation::*;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Sender name reserved for messages authored by the channel itself
pub const SYSTEM_SENDER: &str = "Server";

/// Maximum number of messages retained in the log
pub const MESSAGE_WINDOW: usize = 4;

/// A single entry in the channel history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Text body
    pub content: String,

    /// Display identity of the author
    pub sender: String,

    /// Caller-supplied timestamp, stored as received
    pub timestamp: Value,

    /// Opaque caller payload, `null` when absent
    #[serde(default)]
    pub extra: Value,
}

impl Message {
    /// Create a user-authored message
    pub fn new(
        content: impl Into<String>,
        sender: impl Into<String>,
        timestamp: impl Into<Value>,
    ) -> Self {
        Self {
            content: content.into(),
            sender: sender.into(),
            timestamp: timestamp.into(),
            extra: Value::Null,
        }
    }

    /// Create a channel-authored reply that mirrors the triggering message
    pub fn system(content: impl Into<String>, timestamp: Value, extra: Value) -> Self {
        Self {
            content: content.into(),
            sender: SYSTEM_SENDER.to_string(),
            timestamp,
            extra,
        }
    }

    /// Attach an extra payload
    pub fn with_extra(mut self, extra: Value) -> Self {
        self.extra = extra;
        self
    }

    /// Whether the channel authored this message
    pub fn is_system(&self) -> bool {
        self.sender == SYSTEM_SENDER
    }
}

/// Inbound `POST /` payload before validation
///
/// Every field is optional here so that a missing field can be reported by
/// name instead of as a generic decode failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InboundMessage {
    #[serde(default)]
    pub content: Option<String>,

    #[serde(default)]
    pub sender: Option<String>,

    #[serde(default)]
    pub timestamp: Option<Value>,

    #[serde(default)]
    pub extra: Option<Value>,
}

impl InboundMessage {
    /// Check required fields in order and build the stored message
    pub fn into_message(self) -> Result<Message, MissingField> {
        let content = self
            .content
            .filter(|c| !c.trim().is_empty())
            .ok_or(MissingField::Content)?;
        let sender = self
            .sender
            .filter(|s| !s.trim().is_empty())
            .ok_or(MissingField::Sender)?;
        let timestamp = self
            .timestamp
            .filter(|t| match t {
                Value::Null => false,
                Value::String(s) => !s.trim().is_empty(),
                _ => true,
            })
            .ok_or(MissingField::Timestamp)?;

        Ok(Message {
            content,
            sender,
            timestamp,
            extra: self.extra.unwrap_or(Value::Null),
        })
    }
}

/// Required inbound field that was absent or empty
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingField {
    Content,
    Sender,
    Timestamp,
}

impl MissingField {
    pub fn field_name(&self) -> &'static str {
        match self {
            MissingField::Content => "content",
            MissingField::Sender => "sender",
            MissingField::Timestamp => "timestamp",
        }
    }
}

impl fmt::Display for MissingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "No {}", self.field_name())
    }
}

impl std::error::Error for MissingField {}

/// `GET /health` body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub name: String,
}
