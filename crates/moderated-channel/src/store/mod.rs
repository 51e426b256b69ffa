//! Message store
//!
//! The message log is persisted as one JSON array snapshot. Reads always
//! return the whole log and writes always replace it; there is no
//! incremental update path.
//!
//! - `file`: snapshot on disk (production)
//! - `memory`: in-process snapshot (tests, ephemeral runs)

mod file;
mod memory;

pub use file::FileMessageStore;
pub use memory::InMemoryMessageStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::contracts::Message;

/// Store errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize message log: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Whole-snapshot message log storage
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Load the full log
    ///
    /// A missing or corrupt snapshot yields an empty log. Any other I/O
    /// failure is returned so that callers never overwrite a log they could
    /// not read.
    async fn read(&self) -> StoreResult<Vec<Message>>;

    /// Replace the snapshot with `messages`
    async fn write(&self, messages: &[Message]) -> StoreResult<()>;
}
