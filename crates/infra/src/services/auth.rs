//! Authentication flows.
//!
//! Auth endpoints intentionally skip the response cache: session state
//! belongs to the token manager, and a stale `/auth/me` is worse than a
//! failed one. Offline, these calls fail fast instead of queueing — the
//! client's auth-path exemption guarantees it.

use std::sync::Arc;

use ajo_common::auth::{SessionTokens, TokenManager, TokenManagerError};
use ajo_domain::{ApiResult, AuthResponse, LoginRequest, RegisterRequest, UserProfile};
use tracing::{info, warn};

use crate::api::{ApiClient, GetOptions};

/// Login, registration, and session lifecycle.
pub struct AuthService {
    client: Arc<ApiClient>,
    tokens: Arc<TokenManager>,
}

impl AuthService {
    /// Create the service.
    pub fn new(client: Arc<ApiClient>, tokens: Arc<TokenManager>) -> Self {
        Self { client, tokens }
    }

    /// Restore a persisted session on app launch.
    ///
    /// Returns `true` when a session was restored.
    pub async fn restore(&self) -> Result<bool, TokenManagerError> {
        self.tokens.initialize().await
    }

    /// Sign in and install the session.
    pub async fn login(&self, request: &LoginRequest) -> ApiResult<UserProfile> {
        let response: AuthResponse = self.client.post("/auth/login", request).await?;
        self.install(response).await
    }

    /// Create an account and install the session.
    pub async fn register(&self, request: &RegisterRequest) -> ApiResult<UserProfile> {
        let response: AuthResponse = self.client.post("/auth/register", request).await?;
        self.install(response).await
    }

    /// Fetch the authenticated user. Never served from cache.
    pub async fn current_user(&self) -> ApiResult<UserProfile> {
        self.client
            .get_with("/auth/me", GetOptions { use_cache: false, retry_on_401: true })
            .await
    }

    /// End the session.
    ///
    /// The server call is best-effort — a dead network must not trap the
    /// user in a logged-in shell — but local state is always cleared.
    pub async fn logout(&self) -> ApiResult<()> {
        let server_result: ApiResult<serde_json::Value> =
            self.client.post("/auth/logout", &serde_json::json!({})).await;
        if let Err(e) = server_result {
            warn!(error = %e, "server logout failed, clearing local session anyway");
        }

        self.tokens
            .clear_session()
            .await
            .map_err(|e| ajo_domain::ApiError::storage(e.to_string()))?;
        info!("logged out");
        Ok(())
    }

    /// Whether a session is currently installed.
    pub async fn is_authenticated(&self) -> bool {
        self.tokens.is_authenticated().await
    }

    async fn install(&self, response: AuthResponse) -> ApiResult<UserProfile> {
        self.tokens
            .install_session(
                SessionTokens::new(response.access_token, response.refresh_token),
                Some(response.user.id.clone()),
            )
            .await
            .map_err(|e| ajo_domain::ApiError::storage(e.to_string()))?;

        Ok(response.user)
    }
}
