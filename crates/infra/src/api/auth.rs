//! Token refresh over the auth endpoints.
//!
//! The refresh call deliberately bypasses the [`ApiClient`](super::ApiClient)
//! façade: it must never be cached, queued, or itself trigger a refresh.

use ajo_common::auth::{RefreshError, SessionTokens, TokenRefresher};
use ajo_domain::{RefreshRequest, RefreshResponse};
use async_trait::async_trait;
use reqwest::Method;
use tracing::debug;

use crate::http::HttpClient;

/// Raw auth endpoint client implementing [`TokenRefresher`].
pub struct AuthApi {
    http: HttpClient,
    base_url: String,
}

impl AuthApi {
    /// Create an auth client for the given backend.
    pub fn new(http: HttpClient, base_url: impl Into<String>) -> Self {
        Self { http, base_url: base_url.into() }
    }
}

#[async_trait]
impl TokenRefresher for AuthApi {
    async fn refresh(&self, refresh_token: &str) -> Result<SessionTokens, RefreshError> {
        let url = format!("{}/auth/refresh-token", self.base_url);
        debug!(url = %url, "refreshing access token");

        let request = self
            .http
            .request(Method::POST, &url)
            .header("Content-Type", "application/json")
            .json(&RefreshRequest { refresh_token: refresh_token.to_string() });

        let response =
            self.http.send(request).await.map_err(|e| RefreshError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(RefreshError::Rejected { status: status.as_u16(), message });
        }

        let parsed: RefreshResponse = response
            .json()
            .await
            .map_err(|e| RefreshError::Serialization(e.to_string()))?;

        Ok(SessionTokens::new(parsed.access_token, parsed.refresh_token))
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn test_refresh_success() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/refresh-token"))
            .and(body_json(serde_json::json!({"refresh_token": "old-refresh"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "new-access",
                "refresh_token": "new-refresh",
            })))
            .mount(&server)
            .await;

        let auth = AuthApi::new(HttpClient::new().unwrap(), server.uri());
        let tokens = auth.refresh("old-refresh").await.unwrap();

        assert_eq!(tokens.access_token, "new-access");
        assert_eq!(tokens.refresh_token, "new-refresh");
    }

    #[tokio::test]
    async fn test_refresh_rejected() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/refresh-token"))
            .respond_with(ResponseTemplate::new(401).set_body_string("revoked"))
            .mount(&server)
            .await;

        let auth = AuthApi::new(HttpClient::new().unwrap(), server.uri());
        let err = auth.refresh("revoked-token").await.unwrap_err();

        assert!(matches!(err, RefreshError::Rejected { status: 401, .. }));
    }

    #[tokio::test]
    async fn test_refresh_unreachable_backend() {
        let auth = AuthApi::new(HttpClient::new().unwrap(), "http://127.0.0.1:1");
        let err = auth.refresh("any").await.unwrap_err();

        assert!(matches!(err, RefreshError::Network(_)));
    }
}
