//! Infrastructure building blocks for the Ajo client core.
//!
//! Everything here is host-agnostic: storage and clock abstractions, the
//! TTL cache store, the durable offline queue, the credential store and
//! token manager, and the connectivity seam. Network-facing code lives in
//! `ajo-infra`; this crate never issues an HTTP request.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod auth;
pub mod cache;
pub mod collections;
pub mod error;
pub mod net;
pub mod storage;
pub mod sync;
pub mod testing;
pub mod time;

// Re-export commonly used types and traits for convenience
// ------------------------
pub use auth::{
    AuthSession, CredentialError, CredentialStore, KeyringSecretStore, RefreshError, SecretStore,
    SecretStoreError, SessionTokens, TokenManager, TokenManagerError, TokenRefresher,
};
pub use cache::{CacheLookup, CacheStore};
pub use error::{ErrorClassification, ErrorSeverity};
pub use net::{ConnectivityMonitor, ManualConnectivity};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
pub use sync::{
    ActionKind, FailureOutcome, OfflineQueue, QueueConfig, QueueError, QueueEvent, QueueStatus,
    QueuedAction,
};
pub use time::{Clock, MockClock, SystemClock};
