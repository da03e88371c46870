//! Session data structures.

use serde::{Deserialize, Serialize};

/// The access/refresh token pair for an authenticated session.
///
/// The backend rotates both tokens on every refresh, so the pair is
/// always stored and replaced together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: String,
}

impl SessionTokens {
    /// Create a token pair.
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self { access_token: access_token.into(), refresh_token: refresh_token.into() }
    }
}

/// In-memory authentication state.
///
/// The persisted mirror lives in the credential store; this value is the
/// working copy owned by the token manager. There is deliberately no
/// global instance — the session is injected into whatever needs it.
#[derive(Debug, Clone, Default)]
pub struct AuthSession {
    pub tokens: Option<SessionTokens>,
    pub user_id: Option<String>,
}

impl AuthSession {
    /// Session with tokens and an optional user id.
    pub fn authenticated(tokens: SessionTokens, user_id: Option<String>) -> Self {
        Self { tokens: Some(tokens), user_id }
    }

    /// Whether the session holds tokens.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.tokens.is_some()
    }

    /// Current access token, if authenticated.
    #[must_use]
    pub fn access_token(&self) -> Option<&str> {
        self.tokens.as_ref().map(|t| t.access_token.as_str())
    }
}
