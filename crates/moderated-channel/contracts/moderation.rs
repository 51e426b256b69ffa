//! Moderation service wire types and the verdict it produces

use serde::{Deserialize, Serialize};

/// Response text used when the model reply has no `response` field
pub const DEFAULT_RESPONSE: &str = "Error: No response";

/// Speaker of a conversation turn; the channel only ever sends user turns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
}

/// One turn sent to the moderation service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: TurnRole,
    pub text: String,

    /// Image references attached to the turn
    #[serde(default)]
    pub images: Vec<String>,
}

impl ConversationTurn {
    pub fn user(text: impl Into<String>, images: Vec<String>) -> Self {
        Self {
            role: TurnRole::User,
            text: text.into(),
            images,
        }
    }
}

/// Request body for the moderation service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerationRequest {
    pub conversation_history: Vec<ConversationTurn>,
}

/// Successful reply from the moderation service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModerationReply {
    /// Raw model output, usually JSON wrapped in prose or a code fence
    #[serde(default)]
    pub response: String,
}

/// Allow/deny decision plus generated reply for one inbound message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub allowed: bool,
    pub response: String,
}

impl Verdict {
    pub fn allow(response: impl Into<String>) -> Self {
        Self {
            allowed: true,
            response: response.into(),
        }
    }

    pub fn deny(response: impl Into<String>) -> Self {
        Self {
            allowed: false,
            response: response.into(),
        }
    }
}
