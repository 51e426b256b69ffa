//! Outbound HTTP clients
//!
//! - `moderation`: remote language model used to classify inbound messages
//! - `hub`: one-shot channel registration with the hub

pub mod hub;
pub mod moderation;

pub use hub::HubClient;
pub use moderation::{build_user_text, HttpModerationClient};

use async_trait::async_trait;

/// Client errors
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0}ms")]
    Timeout(u64),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },
}

impl ClientError {
    /// Short label used for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            ClientError::Network(_) => "network",
            ClientError::Timeout(_) => "timeout",
            ClientError::Parse(_) => "parse",
            ClientError::Server { .. } => "server",
        }
    }
}

/// Source of raw moderation replies
///
/// Implementations make a single attempt per call and never interpret the
/// reply; turning it into a verdict is the normalizer's job.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Moderator: Send + Sync {
    /// Classify one user message and return the model's raw reply text
    async fn classify(
        &self,
        user_text: &str,
        sender: &str,
        images: &[String],
    ) -> Result<String, ClientError>;
}
