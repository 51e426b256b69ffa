//! In-memory message store

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use super::{MessageStore, StoreError, StoreResult};
use crate::contracts::Message;

/// Message log held in process memory
///
/// Counts reads and writes, and can be told to fail writes, so callers can
/// assert how the pipeline touches storage.
#[derive(Debug, Default)]
pub struct InMemoryMessageStore {
    messages: Mutex<Vec<Message>>,
    reads: AtomicUsize,
    writes: AtomicUsize,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl InMemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing log
    pub fn with_messages(messages: Vec<Message>) -> Self {
        Self {
            messages: Mutex::new(messages),
            ..Default::default()
        }
    }

    /// Make subsequent reads fail with an I/O error
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent writes fail with an I/O error
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Current log without counting a read
    pub fn snapshot(&self) -> Vec<Message> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn read(&self) -> StoreResult<Vec<Message>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(simulated("simulated read failure"));
        }
        Ok(self.snapshot())
    }

    async fn write(&self, messages: &[Message]) -> StoreResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(simulated("simulated write failure"));
        }

        self.writes.fetch_add(1, Ordering::SeqCst);
        *self.messages.lock().unwrap_or_else(PoisonError::into_inner) = messages.to_vec();
        Ok(())
    }
}

fn simulated(message: &str) -> StoreError {
    StoreError::Io(std::io::Error::new(std::io::ErrorKind::Other, message))
}
