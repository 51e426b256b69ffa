//! Telemetry module for the Moderated Channel
//!
//! Prometheus metrics for the inbound pipeline, kept on a private registry
//! and exposed through `GET /metrics`. Structured logs go through `tracing`
//! directly at each call site.

pub mod metrics;

pub use metrics::{ChannelMetrics, ReceiveResult};

use thiserror::Error;

/// Telemetry errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Metrics error: {0}")]
    MetricsError(#[from] prometheus::Error),

    #[error("Failed to encode metrics: {0}")]
    EncodingFailed(String),
}

pub type Result<T> = std::result::Result<T, TelemetryError>;
