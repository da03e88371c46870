//! Mock implementations of the crate's trait seams.
//!
//! Used by unit tests here and by `ajo-infra`'s integration tests; kept
//! in the library (not `#[cfg(test)]`) so downstream crates can reuse
//! them.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::auth::{RefreshError, SecretStore, SecretStoreError, SessionTokens, TokenRefresher};

/// In-memory secret store for tests.
#[derive(Debug, Default)]
pub struct MockSecretStore {
    secrets: Mutex<HashMap<String, String>>,
}

impl MockSecretStore {
    /// Create an empty mock store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SecretStore for MockSecretStore {
    async fn set_secret(&self, name: &str, value: &str) -> Result<(), SecretStoreError> {
        let mut secrets =
            self.secrets.lock().map_err(|e| SecretStoreError::Backend(e.to_string()))?;
        secrets.insert(name.to_string(), value.to_string());
        Ok(())
    }

    async fn get_secret(&self, name: &str) -> Result<String, SecretStoreError> {
        let secrets =
            self.secrets.lock().map_err(|e| SecretStoreError::Backend(e.to_string()))?;
        secrets.get(name).cloned().ok_or(SecretStoreError::NotFound)
    }

    async fn delete_secret(&self, name: &str) -> Result<(), SecretStoreError> {
        let mut secrets =
            self.secrets.lock().map_err(|e| SecretStoreError::Backend(e.to_string()))?;
        secrets.remove(name);
        Ok(())
    }

    async fn secret_exists(&self, name: &str) -> bool {
        self.secrets.lock().map(|s| s.contains_key(name)).unwrap_or(false)
    }
}

/// Refresher that counts calls and hands out sequential token pairs
/// (`access-1`/`refresh-1`, `access-2`/`refresh-2`, ...).
#[derive(Debug, Default)]
pub struct CountingRefresher {
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl CountingRefresher {
    /// Create a refresher that answers immediately.
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every refresh, widening the window in which concurrent
    /// callers can pile up.
    #[must_use]
    pub fn with_delay_ms(mut self, millis: u64) -> Self {
        self.delay = Some(Duration::from_millis(millis));
        self
    }

    /// Number of refresh calls observed.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenRefresher for CountingRefresher {
    async fn refresh(&self, _refresh_token: &str) -> Result<SessionTokens, RefreshError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(SessionTokens::new(format!("access-{call}"), format!("refresh-{call}")))
    }
}

/// Refresher that always reports a rejected token.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingRefresher;

#[async_trait]
impl TokenRefresher for FailingRefresher {
    async fn refresh(&self, _refresh_token: &str) -> Result<SessionTokens, RefreshError> {
        Err(RefreshError::Rejected { status: 401, message: "refresh token revoked".to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Validates `CountingRefresher` sequential tokens.
    ///
    /// Assertions:
    /// - Confirms each call yields the next numbered pair and bumps the
    ///   counter.
    #[tokio::test]
    async fn test_counting_refresher_sequence() {
        let refresher = CountingRefresher::new();

        let first = refresher.refresh("r").await.unwrap();
        let second = refresher.refresh("r").await.unwrap();

        assert_eq!(first.access_token, "access-1");
        assert_eq!(second.access_token, "access-2");
        assert_eq!(refresher.calls(), 2);
    }

    /// Validates `MockSecretStore` NotFound behavior.
    ///
    /// Assertions:
    /// - Confirms a missing secret reads as `NotFound`.
    #[tokio::test]
    async fn test_mock_secret_store_not_found() {
        let store = MockSecretStore::new();
        assert!(matches!(store.get_secret("ghost").await, Err(SecretStoreError::NotFound)));
    }
}
