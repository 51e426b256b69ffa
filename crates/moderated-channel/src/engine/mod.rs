//! Inbound pipeline
//!
//! Each submitted message goes through:
//!
//! 1. **Validate** required fields (no outbound call if this fails)
//! 2. **Classify** with the moderator and normalize the reply into a verdict
//! 3. **Apply** the verdict to the message log: read, evict, append, write
//!
//! An unobtainable verdict (transport failure, error status, malformed reply)
//! fails closed: nothing is appended and the store is not touched. The apply
//! step runs under a single mutex so concurrent submissions cannot
//! interleave their read-modify-write of the log.

pub mod normalizer;

pub use normalizer::{extract_payload, normalize, NormalizeError};

use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::client::{ClientError, Moderator};
use crate::contracts::{InboundMessage, Message, MissingField, Verdict, MESSAGE_WINDOW};
use crate::store::{MessageStore, StoreError};
use crate::telemetry::{ChannelMetrics, ReceiveResult};

/// Why no verdict could be obtained
#[derive(Error, Debug)]
pub enum ModerationFailure {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Verdict(#[from] NormalizeError),
}

impl ModerationFailure {
    pub fn reason(&self) -> &'static str {
        match self {
            ModerationFailure::Client(e) => e.kind(),
            ModerationFailure::Verdict(e) => e.kind(),
        }
    }
}

/// Pipeline errors
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A required inbound field was missing; displays as e.g. "No content"
    #[error("{0}")]
    MissingField(#[from] MissingField),

    #[error("Moderation unavailable: {0}")]
    Moderation(#[from] ModerationFailure),

    #[error("Failed to store message: {0}")]
    Store(#[from] StoreError),
}

/// Result of a successful pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOutcome {
    /// Whether the user message was kept
    pub allowed: bool,
    /// Log length after the write
    pub log_len: usize,
}

/// Apply a verdict to `log` in place
///
/// Evicts the oldest entries first so that the log, after appending the user
/// message (if allowed) and the system reply, holds at most `window` entries.
pub fn apply_verdict(log: &mut Vec<Message>, message: Message, verdict: &Verdict, window: usize) {
    let incoming = if verdict.allowed { 2 } else { 1 };
    let keep = window.saturating_sub(incoming);
    if log.len() > keep {
        let excess = log.len() - keep;
        log.drain(..excess);
    }

    let reply = Message::system(
        verdict.response.clone(),
        message.timestamp.clone(),
        message.extra.clone(),
    );
    if verdict.allowed {
        log.push(message);
    }
    log.push(reply);
}

/// Orchestrates validation, moderation and the log update
pub struct InboundPipeline {
    moderator: Arc<dyn Moderator>,
    store: Arc<dyn MessageStore>,
    metrics: Arc<ChannelMetrics>,
    write_lock: Mutex<()>,
}

impl InboundPipeline {
    pub fn new(
        moderator: Arc<dyn Moderator>,
        store: Arc<dyn MessageStore>,
        metrics: Arc<ChannelMetrics>,
    ) -> Self {
        Self {
            moderator,
            store,
            metrics,
            write_lock: Mutex::new(()),
        }
    }

    /// Current message log
    pub async fn history(&self) -> Result<Vec<Message>, StoreError> {
        self.store.read().await
    }

    /// Run one inbound message through the pipeline
    pub async fn process(&self, inbound: InboundMessage) -> Result<PipelineOutcome, PipelineError> {
        let request_id = Uuid::new_v4();

        let message = inbound.into_message().map_err(|field| {
            tracing::debug!(%request_id, field = field.field_name(), "Rejected inbound message");
            self.metrics.record_received(ReceiveResult::Rejected);
            PipelineError::MissingField(field)
        })?;

        let verdict = match self.classify(&message).await {
            Ok(verdict) => verdict,
            Err(failure) => {
                tracing::warn!(
                    %request_id,
                    sender = %message.sender,
                    reason = failure.reason(),
                    error = %failure,
                    "No verdict obtained, message dropped"
                );
                self.metrics.record_moderation_failure(failure.reason());
                self.metrics.record_received(ReceiveResult::ModerationFailed);
                return Err(failure.into());
            }
        };
        self.metrics.record_verdict(verdict.allowed);

        let allowed = verdict.allowed;
        let log_len = match self.apply(message, &verdict).await {
            Ok(len) => len,
            Err(e) => {
                tracing::error!(%request_id, error = %e, "Failed to update message log");
                self.metrics.record_received(ReceiveResult::StoreFailed);
                return Err(e.into());
            }
        };

        self.metrics.record_received(ReceiveResult::Accepted);
        self.metrics.set_log_length(log_len);
        tracing::info!(%request_id, allowed, log_len, "Message processed");

        Ok(PipelineOutcome { allowed, log_len })
    }

    async fn classify(&self, message: &Message) -> Result<Verdict, ModerationFailure> {
        let start = Instant::now();
        let raw = self
            .moderator
            .classify(&message.content, &message.sender, &[])
            .await;
        self.metrics
            .observe_moderation_duration(start.elapsed().as_secs_f64());

        Ok(normalize(&raw?)?)
    }

    /// Read, evict, append and write as one critical section
    async fn apply(&self, message: Message, verdict: &Verdict) -> Result<usize, StoreError> {
        let _guard = self.write_lock.lock().await;

        let mut log = self.store.read().await?;
        apply_verdict(&mut log, message, verdict, MESSAGE_WINDOW);
        self.store.write(&log).await?;

        Ok(log.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockModerator;
    use crate::contracts::{DEFAULT_RESPONSE, SYSTEM_SENDER};
    use crate::store::InMemoryMessageStore;
    use proptest::prelude::*;
    use serde_json::json;

    fn inbound(content: &str) -> InboundMessage {
        serde_json::from_value(json!({
            "content": content,
            "sender": "Ada",
            "timestamp": format!("ts-{}", content),
        }))
        .unwrap()
    }

    fn pipeline(
        moderator: MockModerator,
        store: Arc<InMemoryMessageStore>,
    ) -> InboundPipeline {
        InboundPipeline::new(
            Arc::new(moderator),
            store,
            Arc::new(ChannelMetrics::new().unwrap()),
        )
    }

    fn replying(reply: &'static str) -> MockModerator {
        let mut moderator = MockModerator::new();
        moderator
            .expect_classify()
            .returning(move |_, _, _| Ok(reply.to_string()));
        moderator
    }

    #[tokio::test]
    async fn test_allowed_message_appends_pair() {
        let store = Arc::new(InMemoryMessageStore::new());
        let pipeline = pipeline(
            replying(r#"{"response": "Add salt.", "allowed": true}"#),
            store.clone(),
        );

        let outcome = pipeline.process(inbound("pasta")).await.unwrap();
        assert_eq!(outcome, PipelineOutcome { allowed: true, log_len: 2 });

        let log = store.snapshot();
        assert_eq!(log[0].content, "pasta");
        assert_eq!(log[0].sender, "Ada");
        assert_eq!(log[1].content, "Add salt.");
        assert_eq!(log[1].sender, SYSTEM_SENDER);
        assert_eq!(log[1].timestamp, json!("ts-pasta"));
        assert_eq!(store.read_count(), 1);
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn test_denied_message_keeps_only_reply() {
        let store = Arc::new(InMemoryMessageStore::new());
        let pipeline = pipeline(
            replying("```json\n{\"response\": \"Not about cooking.\", \"allowed\": \"FALSE\"}\n```"),
            store.clone(),
        );

        let outcome = pipeline.process(inbound("stocks")).await.unwrap();
        assert!(!outcome.allowed);

        let log = store.snapshot();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].content, "Not about cooking.");
        assert!(log[0].is_system());
    }

    #[tokio::test]
    async fn test_missing_allowed_defaults_to_append() {
        let store = Arc::new(InMemoryMessageStore::new());
        let pipeline = pipeline(replying("{}"), store.clone());

        pipeline.process(inbound("soup")).await.unwrap();

        let log = store.snapshot();
        assert_eq!(log.len(), 2);
        assert_eq!(log[1].content, DEFAULT_RESPONSE);
    }

    #[tokio::test]
    async fn test_missing_field_skips_moderation() {
        let mut moderator = MockModerator::new();
        moderator.expect_classify().times(0);
        let store = Arc::new(InMemoryMessageStore::new());
        let pipeline = pipeline(moderator, store.clone());

        let err = pipeline
            .process(serde_json::from_value(json!({"content": "x", "timestamp": 1})).unwrap())
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::MissingField(MissingField::Sender)));
        assert_eq!(err.to_string(), "No sender");
        assert_eq!(store.read_count(), 0);
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_client_failure_fails_closed() {
        let mut moderator = MockModerator::new();
        moderator
            .expect_classify()
            .times(1)
            .returning(|_, _, _| Err(ClientError::Timeout(30_000)));
        let store = Arc::new(InMemoryMessageStore::new());
        let pipeline = pipeline(moderator, store.clone());

        let err = pipeline.process(inbound("bread")).await.unwrap_err();
        match err {
            PipelineError::Moderation(failure) => assert_eq!(failure.reason(), "timeout"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(store.read_count(), 0);
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_malformed_verdict_fails_closed() {
        let store = Arc::new(InMemoryMessageStore::new());
        let pipeline = pipeline(replying("[\"not\", \"an\", \"object\"]"), store.clone());

        let err = pipeline.process(inbound("cake")).await.unwrap_err();
        match err {
            PipelineError::Moderation(failure) => assert_eq!(failure.reason(), "not_an_object"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_store_failure_surfaces() {
        let store = Arc::new(InMemoryMessageStore::new());
        store.set_fail_writes(true);
        let pipeline = pipeline(replying(r#"{"response": "ok"}"#), store.clone());

        let err = pipeline.process(inbound("rice")).await.unwrap_err();
        assert!(matches!(err, PipelineError::Store(_)));
    }

    #[tokio::test]
    async fn test_unreadable_log_is_never_overwritten() {
        let seed = vec![Message::new("keep me", "Ada", "t0")];
        let store = Arc::new(InMemoryMessageStore::with_messages(seed.clone()));
        store.set_fail_reads(true);
        let pipeline = pipeline(replying(r#"{"response": "ok"}"#), store.clone());

        let err = pipeline.process(inbound("rice")).await.unwrap_err();
        assert!(matches!(err, PipelineError::Store(StoreError::Io(_))));
        assert_eq!(store.write_count(), 0);
        assert_eq!(store.snapshot(), seed);
        assert!(pipeline.history().await.is_err());
    }

    #[tokio::test]
    async fn test_moderator_receives_content_and_sender() {
        let mut moderator = MockModerator::new();
        moderator
            .expect_classify()
            .withf(|text: &str, sender: &str, images: &[String]| {
                text == "gnocchi" && sender == "Ada" && images.is_empty()
            })
            .times(1)
            .returning(|_, _, _| Ok(r#"{"response": "ok"}"#.to_string()));
        let pipeline = pipeline(moderator, Arc::new(InMemoryMessageStore::new()));

        pipeline.process(inbound("gnocchi")).await.unwrap();
    }

    #[tokio::test]
    async fn test_concurrent_submissions_are_not_lost() {
        let store = Arc::new(InMemoryMessageStore::new());
        let pipeline = Arc::new(pipeline(
            replying(r#"{"response": "ok", "allowed": false}"#),
            store.clone(),
        ));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let pipeline = Arc::clone(&pipeline);
                tokio::spawn(async move { pipeline.process(inbound(&format!("m{i}"))).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(store.write_count(), 8);
        assert_eq!(store.snapshot().len(), MESSAGE_WINDOW);
    }

    #[test]
    fn test_apply_verdict_evicts_before_append() {
        let mut log: Vec<Message> = (0..4)
            .map(|i| Message::new(format!("old{i}"), "Ada", i))
            .collect();

        apply_verdict(&mut log, Message::new("new", "Ada", 9), &Verdict::allow("r"), 4);

        let contents: Vec<_> = log.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["old2", "old3", "new", "r"]);
    }

    #[test]
    fn test_apply_verdict_denied_evicts_one() {
        let mut log: Vec<Message> = (0..4)
            .map(|i| Message::new(format!("old{i}"), "Ada", i))
            .collect();

        apply_verdict(&mut log, Message::new("new", "Ada", 9), &Verdict::deny("no"), 4);

        let contents: Vec<_> = log.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["old1", "old2", "old3", "no"]);
    }

    #[test]
    fn test_apply_verdict_trims_oversized_log() {
        let mut log: Vec<Message> = (0..7)
            .map(|i| Message::new(format!("old{i}"), "Ada", i))
            .collect();

        apply_verdict(&mut log, Message::new("new", "Ada", 9), &Verdict::allow("r"), 4);
        assert_eq!(log.len(), 4);
        assert_eq!(log[0].content, "old5");
    }

    #[test]
    fn test_reply_carries_timestamp_and_extra() {
        let mut log = Vec::new();
        let message = Message::new("q", "Ada", "t").with_extra(json!({"img": "a.png"}));

        apply_verdict(&mut log, message, &Verdict::deny("no"), 4);
        assert_eq!(log[0].timestamp, json!("t"));
        assert_eq!(log[0].extra, json!({"img": "a.png"}));
    }

    proptest! {
        #[test]
        fn prop_window_bound_holds(
            initial in 0usize..8,
            decisions in proptest::collection::vec(any::<bool>(), 1..20),
        ) {
            let mut log: Vec<Message> = (0..initial)
                .map(|i| Message::new(format!("seed{i}"), "Ada", i))
                .collect();

            for (i, allowed) in decisions.iter().enumerate() {
                let verdict = if *allowed { Verdict::allow("r") } else { Verdict::deny("r") };
                apply_verdict(&mut log, Message::new(format!("m{i}"), "Ada", i), &verdict, MESSAGE_WINDOW);

                prop_assert!(log.len() <= MESSAGE_WINDOW);
                let last = log.last().unwrap();
                prop_assert!(last.is_system());
                if *allowed {
                    prop_assert_eq!(&log[log.len() - 2].content, &format!("m{i}"));
                }
            }
        }
    }
}
