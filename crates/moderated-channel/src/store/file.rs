//! File-backed message store

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

use super::{MessageStore, StoreResult};
use crate::contracts::Message;

/// Message log stored as a JSON array in a single file
#[derive(Debug, Clone)]
pub struct FileMessageStore {
    path: PathBuf,
}

impl FileMessageStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling file used to stage a snapshot before it replaces the real one
    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "messages.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl MessageStore for FileMessageStore {
    async fn read(&self) -> StoreResult<Vec<Message>> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                tracing::error!(
                    path = %self.path.display(),
                    error = %e,
                    "Failed to read message log"
                );
                return Err(e.into());
            }
        };

        match serde_json::from_slice::<Vec<Message>>(&bytes) {
            Ok(messages) => Ok(messages),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Message log is corrupt, treating as empty"
                );
                Ok(Vec::new())
            }
        }
    }

    async fn write(&self, messages: &[Message]) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let content = serde_json::to_vec(messages)?;
        let staging = self.staging_path();
        fs::write(&staging, content).await?;
        fs::rename(&staging, &self.path).await?;

        tracing::debug!(
            path = %self.path.display(),
            count = messages.len(),
            "Message log written"
        );
        Ok(())
    }
}
