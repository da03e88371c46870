//! Session persistence layered over the secret store.
//!
//! Tokens are the only values requiring confidentiality at rest and live
//! in the [`SecretStore`]; the `user_id` session flag is not secret and
//! goes to the plain key-value store.

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use super::traits::{SecretStore, SecretStoreError};
use super::types::{AuthSession, SessionTokens};
use crate::storage::{KeyValueStore, StorageError};

const ACCESS_PREFIX: &str = "access.";
const REFRESH_PREFIX: &str = "refresh.";
const USER_ID_KEY: &str = "@session:user_id";

/// Credential persistence errors.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error(transparent)]
    Secret(#[from] SecretStoreError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Persists the auth session across process restarts.
pub struct CredentialStore {
    secrets: Arc<dyn SecretStore>,
    flags: Arc<dyn KeyValueStore>,
    account: String,
}

impl CredentialStore {
    /// Create a store scoped to `account` (one session per account).
    pub fn new(
        secrets: Arc<dyn SecretStore>,
        flags: Arc<dyn KeyValueStore>,
        account: impl Into<String>,
    ) -> Self {
        Self { secrets, flags, account: account.into() }
    }

    fn access_key(&self) -> String {
        format!("{}{}", ACCESS_PREFIX, self.account)
    }

    fn refresh_key(&self) -> String {
        format!("{}{}", REFRESH_PREFIX, self.account)
    }

    /// Persist tokens and the optional user id.
    pub async fn store_session(
        &self,
        tokens: &SessionTokens,
        user_id: Option<&str>,
    ) -> Result<(), CredentialError> {
        debug!(account = %self.account, "storing session credentials");

        self.secrets.set_secret(&self.access_key(), &tokens.access_token).await?;
        self.secrets.set_secret(&self.refresh_key(), &tokens.refresh_token).await?;

        match user_id {
            Some(id) => self.flags.set(USER_ID_KEY, id).await?,
            None => self.flags.remove(USER_ID_KEY).await?,
        }

        Ok(())
    }

    /// Restore a persisted session, if one exists.
    pub async fn load_session(&self) -> Result<Option<AuthSession>, CredentialError> {
        let access_token = match self.secrets.get_secret(&self.access_key()).await {
            Ok(value) => value,
            Err(SecretStoreError::NotFound) => return Ok(None),
            Err(other) => return Err(other.into()),
        };

        let refresh_token = match self.secrets.get_secret(&self.refresh_key()).await {
            Ok(value) => value,
            // A lone access token is useless: treat as no session
            Err(SecretStoreError::NotFound) => return Ok(None),
            Err(other) => return Err(other.into()),
        };

        let user_id = self.flags.get(USER_ID_KEY).await?;

        debug!(account = %self.account, "restored persisted session");
        Ok(Some(AuthSession::authenticated(
            SessionTokens { access_token, refresh_token },
            user_id,
        )))
    }

    /// Delete every persisted session value. Idempotent.
    pub async fn clear_session(&self) -> Result<(), CredentialError> {
        debug!(account = %self.account, "clearing session credentials");

        let _ = self.secrets.delete_secret(&self.access_key()).await;
        let _ = self.secrets.delete_secret(&self.refresh_key()).await;
        self.flags.remove(USER_ID_KEY).await?;

        Ok(())
    }

    /// Whether a persisted session exists.
    pub async fn has_session(&self) -> bool {
        self.secrets.secret_exists(&self.access_key()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::testing::MockSecretStore;

    fn store() -> CredentialStore {
        CredentialStore::new(
            Arc::new(MockSecretStore::new()),
            Arc::new(MemoryStore::new()),
            "main",
        )
    }

    /// Validates `CredentialStore` behavior for the store/load roundtrip
    /// scenario.
    ///
    /// Assertions:
    /// - Confirms tokens and user id survive the roundtrip.
    #[tokio::test]
    async fn test_store_and_load_roundtrip() {
        let store = store();
        let tokens = SessionTokens::new("acc-1", "ref-1");

        store.store_session(&tokens, Some("u1")).await.unwrap();

        let session = store.load_session().await.unwrap().unwrap();
        assert_eq!(session.tokens, Some(tokens));
        assert_eq!(session.user_id.as_deref(), Some("u1"));
        assert!(store.has_session().await);
    }

    /// Validates `CredentialStore::load_session` behavior for the empty
    /// store scenario.
    ///
    /// Assertions:
    /// - Confirms loading with nothing persisted yields `None`.
    #[tokio::test]
    async fn test_load_without_session() {
        let store = store();
        assert!(store.load_session().await.unwrap().is_none());
        assert!(!store.has_session().await);
    }

    /// Validates `CredentialStore::clear_session` idempotency.
    ///
    /// Assertions:
    /// - Confirms clearing twice succeeds and leaves no session behind.
    #[tokio::test]
    async fn test_clear_is_idempotent() {
        let store = store();
        store.store_session(&SessionTokens::new("a", "r"), Some("u1")).await.unwrap();

        store.clear_session().await.unwrap();
        store.clear_session().await.unwrap();

        assert!(store.load_session().await.unwrap().is_none());
    }
}
