//! Prometheus metrics for the Moderated Channel
//!
//! - `messages_received_total` (counter) - inbound messages by outcome
//! - `verdicts_total` (counter) - normalized verdicts by decision
//! - `moderation_failures_total` (counter) - unobtainable verdicts by reason
//! - `moderation_duration_seconds` (histogram) - moderation round-trip time
//! - `log_length` (gauge) - messages currently retained

use prometheus::{
    CounterVec, Encoder, Histogram, HistogramOpts, IntGauge, Opts, Registry, TextEncoder,
};

use super::{Result, TelemetryError};

const NAMESPACE: &str = "moderated_channel";

/// Outcome label for `messages_received_total`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiveResult {
    Accepted,
    Rejected,
    ModerationFailed,
    StoreFailed,
}

impl ReceiveResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReceiveResult::Accepted => "accepted",
            ReceiveResult::Rejected => "rejected",
            ReceiveResult::ModerationFailed => "moderation_failed",
            ReceiveResult::StoreFailed => "store_failed",
        }
    }
}

/// Channel metrics on a private registry
pub struct ChannelMetrics {
    registry: Registry,
    messages_received_total: CounterVec,
    verdicts_total: CounterVec,
    moderation_failures_total: CounterVec,
    moderation_duration_seconds: Histogram,
    log_length: IntGauge,
}

impl ChannelMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let messages_received_total = CounterVec::new(
            Opts::new(
                "messages_received_total",
                "Total number of inbound messages by outcome",
            )
            .namespace(NAMESPACE),
            &["result"],
        )?;

        let verdicts_total = CounterVec::new(
            Opts::new("verdicts_total", "Total number of moderation verdicts")
                .namespace(NAMESPACE),
            &["allowed"],
        )?;

        let moderation_failures_total = CounterVec::new(
            Opts::new(
                "moderation_failures_total",
                "Total number of moderation calls that produced no verdict",
            )
            .namespace(NAMESPACE),
            &["reason"],
        )?;

        let moderation_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "moderation_duration_seconds",
                "Moderation service round-trip time in seconds",
            )
            .namespace(NAMESPACE)
            .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        )?;

        let log_length = IntGauge::with_opts(
            Opts::new("log_length", "Number of messages currently retained").namespace(NAMESPACE),
        )?;

        registry.register(Box::new(messages_received_total.clone()))?;
        registry.register(Box::new(verdicts_total.clone()))?;
        registry.register(Box::new(moderation_failures_total.clone()))?;
        registry.register(Box::new(moderation_duration_seconds.clone()))?;
        registry.register(Box::new(log_length.clone()))?;

        Ok(Self {
            registry,
            messages_received_total,
            verdicts_total,
            moderation_failures_total,
            moderation_duration_seconds,
            log_length,
        })
    }

    pub fn record_received(&self, result: ReceiveResult) {
        self.messages_received_total
            .with_label_values(&[result.as_str()])
            .inc();
    }

    pub fn record_verdict(&self, allowed: bool) {
        let label = if allowed { "true" } else { "false" };
        self.verdicts_total.with_label_values(&[label]).inc();
    }

    pub fn record_moderation_failure(&self, reason: &str) {
        self.moderation_failures_total
            .with_label_values(&[reason])
            .inc();
    }

    pub fn observe_moderation_duration(&self, seconds: f64) {
        self.moderation_duration_seconds.observe(seconds);
    }

    pub fn set_log_length(&self, len: usize) {
        self.log_length.set(len as i64);
    }

    /// Prometheus text exposition of all channel metrics
    pub fn encode_text(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| TelemetryError::EncodingFailed(e.to_string()))
    }

    #[cfg(test)]
    pub(crate) fn received_count(&self, result: ReceiveResult) -> f64 {
        self.messages_received_total
            .with_label_values(&[result.as_str()])
            .get()
    }
}
