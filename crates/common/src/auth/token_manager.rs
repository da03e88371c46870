//! Token lifecycle management.
//!
//! Owns the in-memory session, its persisted mirror, and the
//! refresh-on-401 path. The single-flight guarantee lives here: however
//! many requests observe a 401 concurrently, exactly one network refresh
//! runs, and every waiter resolves against its outcome.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use super::credentials::{CredentialError, CredentialStore};
use super::traits::TokenRefresher;
use super::types::{AuthSession, SessionTokens};

/// Token manager errors.
#[derive(Debug, Error)]
pub enum TokenManagerError {
    /// No session (not logged in, or logged out by a failed refresh).
    #[error("Not authenticated (no session)")]
    NotAuthenticated,

    /// The refresh call failed; the session has been cleared.
    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),

    /// The persisted mirror could not be read or written.
    #[error(transparent)]
    Credentials(#[from] CredentialError),
}

/// Manages the auth session and coalesces concurrent refreshes.
///
/// State machine: `idle → refreshing → idle` — a successful refresh
/// installs the new pair, a failed one clears the whole session (hard
/// logout). Re-entrant refresh calls during `refreshing` attach to the
/// in-flight outcome instead of issuing another network call.
pub struct TokenManager {
    refresher: Arc<dyn TokenRefresher>,
    credentials: CredentialStore,
    session: RwLock<AuthSession>,
    /// Serializes refresh attempts; waiters queue here.
    refresh_gate: Mutex<()>,
    /// Bumped on every session change so gate waiters can tell whether
    /// the refresh they queued behind already did the work.
    generation: AtomicU64,
}

impl TokenManager {
    /// Create a manager with an empty session.
    pub fn new(refresher: Arc<dyn TokenRefresher>, credentials: CredentialStore) -> Self {
        Self {
            refresher,
            credentials,
            session: RwLock::new(AuthSession::default()),
            refresh_gate: Mutex::new(()),
            generation: AtomicU64::new(0),
        }
    }

    /// Restore a persisted session, if any.
    ///
    /// Called once on startup. Returns `true` when a session was
    /// restored.
    pub async fn initialize(&self) -> Result<bool, TokenManagerError> {
        match self.credentials.load_session().await? {
            Some(session) => {
                *self.session.write().await = session;
                self.generation.fetch_add(1, Ordering::AcqRel);
                info!("session restored from credential store");
                Ok(true)
            }
            None => {
                debug!("no persisted session found");
                Ok(false)
            }
        }
    }

    /// Install a session after login/registration.
    pub async fn install_session(
        &self,
        tokens: SessionTokens,
        user_id: Option<String>,
    ) -> Result<(), TokenManagerError> {
        self.credentials.store_session(&tokens, user_id.as_deref()).await?;
        *self.session.write().await = AuthSession::authenticated(tokens, user_id);
        self.generation.fetch_add(1, Ordering::AcqRel);
        info!("session installed");
        Ok(())
    }

    /// Clear the session everywhere (logout).
    pub async fn clear_session(&self) -> Result<(), TokenManagerError> {
        self.credentials.clear_session().await?;
        *self.session.write().await = AuthSession::default();
        self.generation.fetch_add(1, Ordering::AcqRel);
        info!("session cleared");
        Ok(())
    }

    /// Current access token, if authenticated.
    pub async fn access_token(&self) -> Option<String> {
        self.session.read().await.tokens.as_ref().map(|t| t.access_token.clone())
    }

    /// Current user id, if known.
    pub async fn user_id(&self) -> Option<String> {
        self.session.read().await.user_id.clone()
    }

    /// Whether a session is present.
    pub async fn is_authenticated(&self) -> bool {
        self.session.read().await.is_authenticated()
    }

    /// Snapshot of the current session.
    pub async fn session(&self) -> AuthSession {
        self.session.read().await.clone()
    }

    /// Refresh the access token, coalescing concurrent callers.
    ///
    /// Exactly one underlying refresh call runs at a time. Callers that
    /// queue behind an in-flight refresh observe its outcome: the new
    /// access token on success, `RefreshFailed` after a failure logged
    /// the session out.
    ///
    /// # Errors
    /// - `NotAuthenticated` when there is no session to refresh.
    /// - `RefreshFailed` when the refresh call fails — the session is
    ///   cleared before this returns (hard logout, no partial retry).
    pub async fn refresh(&self) -> Result<String, TokenManagerError> {
        let seen = self.generation.load(Ordering::Acquire);
        let _gate = self.refresh_gate.lock().await;

        // Someone else completed a refresh (or logout) while we waited
        // for the gate; resolve against that outcome.
        if self.generation.load(Ordering::Acquire) != seen {
            return match self.access_token().await {
                Some(token) => Ok(token),
                None => Err(TokenManagerError::RefreshFailed(
                    "session cleared by concurrent refresh failure".to_string(),
                )),
            };
        }

        let refresh_token = {
            let session = self.session.read().await;
            match &session.tokens {
                Some(tokens) => tokens.refresh_token.clone(),
                None => return Err(TokenManagerError::NotAuthenticated),
            }
        };

        debug!("refreshing access token");
        match self.refresher.refresh(&refresh_token).await {
            Ok(new_tokens) => {
                let user_id = self.user_id().await;
                self.credentials.store_session(&new_tokens, user_id.as_deref()).await?;

                let access_token = new_tokens.access_token.clone();
                self.session.write().await.tokens = Some(new_tokens);
                self.generation.fetch_add(1, Ordering::AcqRel);

                info!("access token refreshed");
                Ok(access_token)
            }
            Err(e) => {
                warn!(error = %e, "token refresh failed, forcing logout");
                if let Err(clear_err) = self.clear_session().await {
                    warn!(error = %clear_err, "failed to clear session after refresh failure");
                }
                Err(TokenManagerError::RefreshFailed(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::testing::{CountingRefresher, FailingRefresher, MockSecretStore};

    fn manager_with(refresher: Arc<dyn TokenRefresher>) -> TokenManager {
        let credentials = CredentialStore::new(
            Arc::new(MockSecretStore::new()),
            Arc::new(MemoryStore::new()),
            "main",
        );
        TokenManager::new(refresher, credentials)
    }

    async fn logged_in(refresher: Arc<dyn TokenRefresher>) -> TokenManager {
        let manager = manager_with(refresher);
        manager
            .install_session(SessionTokens::new("acc-0", "ref-0"), Some("u1".into()))
            .await
            .unwrap();
        manager
    }

    /// Validates `TokenManager::refresh` behavior for the not
    /// authenticated scenario.
    ///
    /// Assertions:
    /// - Ensures refreshing without a session yields `NotAuthenticated`.
    #[tokio::test]
    async fn test_refresh_without_session() {
        let manager = manager_with(Arc::new(CountingRefresher::new()));
        let result = manager.refresh().await;
        assert!(matches!(result, Err(TokenManagerError::NotAuthenticated)));
    }

    /// Validates `TokenManager::refresh` behavior for the successful
    /// refresh scenario.
    ///
    /// Assertions:
    /// - Confirms the returned token is the refreshed one.
    /// - Confirms the in-memory session and user id were updated/kept.
    #[tokio::test]
    async fn test_refresh_success_updates_session() {
        let refresher = Arc::new(CountingRefresher::new());
        let manager = logged_in(refresher.clone()).await;

        let token = manager.refresh().await.unwrap();
        assert_eq!(token, "access-1");
        assert_eq!(manager.access_token().await.as_deref(), Some("access-1"));
        assert_eq!(manager.user_id().await.as_deref(), Some("u1"));
        assert_eq!(refresher.calls(), 1);
    }

    /// Validates the single-flight guarantee for concurrent refreshes.
    ///
    /// Assertions:
    /// - Confirms 8 concurrent refresh calls issue exactly 1 underlying
    ///   refresh.
    /// - Confirms every caller observes the same refreshed token.
    #[tokio::test]
    async fn test_single_flight_refresh() {
        let refresher = Arc::new(CountingRefresher::new().with_delay_ms(50));
        let manager = Arc::new(logged_in(refresher.clone()).await);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let manager = manager.clone();
            handles.push(tokio::spawn(async move { manager.refresh().await }));
        }

        let mut tokens = Vec::new();
        for handle in handles {
            tokens.push(handle.await.unwrap().unwrap());
        }

        assert_eq!(refresher.calls(), 1);
        assert!(tokens.iter().all(|t| t == "access-1"), "tokens: {tokens:?}");
    }

    /// Validates `TokenManager::refresh` behavior for the hard logout
    /// scenario.
    ///
    /// Assertions:
    /// - Confirms a failed refresh clears both memory and the persisted
    ///   mirror.
    /// - Confirms subsequent refreshes see `NotAuthenticated`.
    #[tokio::test]
    async fn test_refresh_failure_forces_logout() {
        let manager = logged_in(Arc::new(FailingRefresher)).await;

        let result = manager.refresh().await;
        assert!(matches!(result, Err(TokenManagerError::RefreshFailed(_))));
        assert!(!manager.is_authenticated().await);
        assert!(!manager.credentials.has_session().await);

        let again = manager.refresh().await;
        assert!(matches!(again, Err(TokenManagerError::NotAuthenticated)));
    }

    /// Validates `TokenManager::initialize` behavior for the restore
    /// scenario.
    ///
    /// Assertions:
    /// - Confirms a second manager over the same stores restores the
    ///   session installed by the first.
    #[tokio::test]
    async fn test_initialize_restores_persisted_session() {
        let secrets = Arc::new(MockSecretStore::new());
        let flags = Arc::new(MemoryStore::new());

        let first = TokenManager::new(
            Arc::new(CountingRefresher::new()),
            CredentialStore::new(secrets.clone(), flags.clone(), "main"),
        );
        first
            .install_session(SessionTokens::new("acc", "ref"), Some("u9".into()))
            .await
            .unwrap();

        let second = TokenManager::new(
            Arc::new(CountingRefresher::new()),
            CredentialStore::new(secrets, flags, "main"),
        );
        assert!(second.initialize().await.unwrap());
        assert_eq!(second.access_token().await.as_deref(), Some("acc"));
        assert_eq!(second.user_id().await.as_deref(), Some("u9"));
    }
}
