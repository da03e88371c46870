//! Persistent key-value storage abstraction.
//!
//! The client core persists exactly two kinds of document: cache envelopes
//! under `@cache:<key>` and the offline queue under `@offline_queue`, plus
//! a handful of plain session flags. [`KeyValueStore`] is the seam that
//! hosts can back with whatever their platform offers; [`FileStore`] is
//! the default file-backed implementation and [`MemoryStore`] backs tests.

mod file;
mod memory;

use async_trait::async_trait;
use thiserror::Error;

use crate::error::{ErrorClassification, ErrorSeverity};

pub use file::FileStore;
pub use memory::MemoryStore;

/// Storage operation errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Corrupt store document: {0}")]
    Corrupt(String),
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl ErrorClassification for StorageError {
    fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_))
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Io(_) | Self::Serialization(_) => ErrorSeverity::Error,
            Self::Corrupt(_) => ErrorSeverity::Critical,
        }
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Async key-value storage backend.
///
/// Values are opaque strings; callers own their envelope formats. All
/// implementations must be safe for concurrent use.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Fetch the value stored under `key`, if any.
    async fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Remove the value stored under `key`. Removing a missing key is not
    /// an error.
    async fn remove(&self, key: &str) -> StorageResult<()>;

    /// List all keys starting with `prefix`.
    async fn keys_with_prefix(&self, prefix: &str) -> StorageResult<Vec<String>>;

    /// Drop every key in the store.
    async fn clear(&self) -> StorageResult<()>;
}
