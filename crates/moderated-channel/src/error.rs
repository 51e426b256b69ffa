//! Error types for the Moderated Channel
//!
//! Each layer owns a focused error enum; `ChannelError` gathers them for
//! callers that drive the whole service (CLI, server startup). Per-request
//! pipeline failures never reach it: they end as HTTP responses.

use thiserror::Error;

use crate::client::ClientError;
use crate::config::ConfigError;
use crate::store::StoreError;
use crate::telemetry::TelemetryError;

/// Main error type for channel operations
#[derive(Error, Debug)]
pub enum ChannelError {
    /// Configuration could not be loaded or is invalid
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Message store failure
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Outbound HTTP failure (moderation service or hub)
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Metrics registry failure
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),

    /// Server I/O error (bind, serve)
    #[error("Server error: {0}")]
    Server(#[from] std::io::Error),
}

impl ChannelError {
    /// Check if this is a user-facing error (vs internal)
    ///
    /// Bad configuration and a hub that refuses the registration (4xx) are
    /// fixable by the operator; everything else is internal.
    pub fn is_user_error(&self) -> bool {
        match self {
            ChannelError::Config(_) => true,
            ChannelError::Client(ClientError::Server { status, .. }) => {
                (400..500).contains(status)
            }
            _ => false,
        }
    }
}

/// Result type alias for channel operations
pub type Result<T> = std::result::Result<T, ChannelError>;
