//! Traits for secret storage and token refresh.
//!
//! These traits enable dependency injection and testing by abstracting
//! the platform keychain and the auth backend.

use async_trait::async_trait;
use thiserror::Error;

use super::types::SessionTokens;
use crate::error::{ErrorClassification, ErrorSeverity};

/// Secret storage errors.
#[derive(Debug, Error)]
pub enum SecretStoreError {
    #[error("Secret not found")]
    NotFound,

    #[error("Secret store backend error: {0}")]
    Backend(String),
}

/// Trait for platform-backed secret storage.
///
/// Only token bytes go through this trait; non-secret session flags use
/// the plain key-value store.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Store a secret under `name`, replacing any previous value.
    async fn set_secret(&self, name: &str, value: &str) -> Result<(), SecretStoreError>;

    /// Retrieve the secret stored under `name`.
    ///
    /// # Errors
    /// Returns `SecretStoreError::NotFound` when no secret exists.
    async fn get_secret(&self, name: &str) -> Result<String, SecretStoreError>;

    /// Delete the secret stored under `name`. Deleting a missing secret
    /// is not an error.
    async fn delete_secret(&self, name: &str) -> Result<(), SecretStoreError>;

    /// Whether a secret exists under `name`.
    async fn secret_exists(&self, name: &str) -> bool;
}

/// Token refresh errors.
#[derive(Debug, Error)]
pub enum RefreshError {
    /// The refresh endpoint was unreachable.
    #[error("Refresh transport error: {0}")]
    Network(String),

    /// The backend rejected the refresh token.
    #[error("Refresh rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The refresh response could not be parsed.
    #[error("Refresh response error: {0}")]
    Serialization(String),
}

impl ErrorClassification for RefreshError {
    fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Network(_) => ErrorSeverity::Warning,
            Self::Rejected { .. } => ErrorSeverity::Error,
            Self::Serialization(_) => ErrorSeverity::Error,
        }
    }
}

/// Trait for exchanging a refresh token for a new token pair.
///
/// Implemented by the auth API client in `ajo-infra`; tests substitute
/// counting/failing mocks.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    /// Exchange `refresh_token` for a fresh pair.
    ///
    /// # Errors
    /// Returns an error if the endpoint is unreachable, rejects the
    /// token, or answers with an unparseable body.
    async fn refresh(&self, refresh_token: &str) -> Result<SessionTokens, RefreshError>;
}
