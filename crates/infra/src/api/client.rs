//! The resilient API client façade.
//!
//! Combines the cache store, offline queue, token manager, and
//! connectivity monitor behind four verb methods. This is the single
//! point where raw transport/status/parse failures are normalized into
//! `ApiError`; nothing above this layer ever sees a reqwest or serde
//! error.

use std::sync::Arc;

use ajo_common::auth::TokenManager;
use ajo_common::cache::{CacheLookup, CacheStore};
use ajo_common::net::ConnectivityMonitor;
use ajo_common::sync::{ActionKind, OfflineQueue, QueueError, QueuedAction};
use ajo_domain::{ApiError, ApiResult};
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use super::config::ClientConfig;
use crate::http::HttpClient;

/// Per-call options for GET requests.
#[derive(Debug, Clone, Copy)]
pub struct GetOptions {
    /// Serve a fresh cache hit without touching the network.
    pub use_cache: bool,
    /// Allow the one-shot refresh-and-retry on a 401.
    pub retry_on_401: bool,
}

impl Default for GetOptions {
    fn default() -> Self {
        Self { use_cache: true, retry_on_401: true }
    }
}

/// Resilient API client.
///
/// All state is injected; the client itself owns nothing persistent and
/// can be cloned freely behind an `Arc`.
pub struct ApiClient {
    config: ClientConfig,
    http: HttpClient,
    cache: Arc<CacheStore>,
    queue: Arc<OfflineQueue>,
    tokens: Arc<TokenManager>,
    connectivity: Arc<dyn ConnectivityMonitor>,
}

impl ApiClient {
    /// Create a client from its collaborators.
    pub fn new(
        config: ClientConfig,
        http: HttpClient,
        cache: Arc<CacheStore>,
        queue: Arc<OfflineQueue>,
        tokens: Arc<TokenManager>,
        connectivity: Arc<dyn ConnectivityMonitor>,
    ) -> Self {
        Self { config, http, cache, queue, tokens, connectivity }
    }

    /// Create a builder for fluent configuration.
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    /// Execute a GET request with default options (cache-first,
    /// refresh-on-401).
    pub async fn get<T: DeserializeOwned + Serialize>(&self, path: &str) -> ApiResult<T> {
        self.get_with(path, GetOptions::default()).await
    }

    /// Execute a GET request.
    ///
    /// Decision tree: fresh cache hit → return it without touching the
    /// network; offline → any cached value (TTL ignored) or a `Network`
    /// error; online failure → stale cache or the normalized error;
    /// online success → cache and return.
    #[instrument(skip(self), fields(path = %path))]
    pub async fn get_with<T: DeserializeOwned + Serialize>(
        &self,
        path: &str,
        options: GetOptions,
    ) -> ApiResult<T> {
        let key = cache_key(&Method::GET, path);

        // One non-evicting read answers both "can we skip the network"
        // and "what do we fall back to if it fails".
        let lookup = if options.use_cache {
            match self.cache.lookup::<T>(&key).await {
                Ok(lookup) => lookup,
                Err(e) => {
                    warn!(error = %e, "cache read failed, treating as miss");
                    CacheLookup::Miss
                }
            }
        } else {
            CacheLookup::Miss
        };

        let stale = match lookup {
            CacheLookup::Fresh(hit) => {
                debug!("cache hit");
                return Ok(hit);
            }
            CacheLookup::Stale(value) => Some(value),
            CacheLookup::Miss => None,
        };

        if !self.connectivity.is_online() {
            if let Some(stale) = stale {
                info!("offline, serving stale cache entry");
                return Ok(stale);
            }
            return Err(ApiError::network("device is offline"));
        }

        match self.request_json::<T>(Method::GET, path, None, options.retry_on_401).await {
            Ok(value) => {
                let tags = invalidation_tags(path);
                if let Err(e) =
                    self.cache.set_tagged(&key, &value, Some(self.config.cache_ttl), &tags).await
                {
                    warn!(error = %e, "failed to cache response");
                }
                Ok(value)
            }
            Err(err) => {
                if let Some(stale) = stale {
                    warn!(error = %err, "request failed, serving stale cache entry");
                    return Ok(stale);
                }
                Err(err)
            }
        }
    }

    /// Execute a POST request.
    pub async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        self.mutate(ActionKind::Post, path, Some(serde_json::to_value(body)?)).await
    }

    /// Execute a PUT request.
    pub async fn put<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        self.mutate(ActionKind::Put, path, Some(serde_json::to_value(body)?)).await
    }

    /// Execute a DELETE request.
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.mutate(ActionKind::Delete, path, None).await
    }

    /// Replay a queued action.
    ///
    /// Same request path as a live mutation, minus the queueing: a replay
    /// that fails is never re-queued here — the processor records the
    /// failure against the existing action.
    pub async fn execute_queued(&self, action: &QueuedAction) -> ApiResult<()> {
        let refresh_allowed = !is_auth_path(&action.endpoint);
        let _: serde_json::Value = self
            .request_json(
                verb_method(action.kind),
                &action.endpoint,
                action.body.clone(),
                refresh_allowed,
            )
            .await?;

        let tags = invalidation_tags(&action.endpoint);
        if let Err(e) = self.cache.invalidate_tags(&tags).await {
            warn!(error = %e, "failed to invalidate cache after replay");
        }
        Ok(())
    }

    /// Queue status passthrough for hosts.
    pub async fn queue_status(&self) -> ajo_common::sync::QueueStatus {
        self.queue.status().await
    }

    #[instrument(skip(self, body), fields(verb = %kind, path = %path))]
    async fn mutate<T: DeserializeOwned>(
        &self,
        kind: ActionKind,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> ApiResult<T> {
        if !self.connectivity.is_online() {
            return self.defer_or_fail(kind, path, body).await;
        }

        let refresh_allowed = !is_auth_path(path);
        match self.request_json::<T>(verb_method(kind), path, body.clone(), refresh_allowed).await {
            Ok(value) => {
                let tags = invalidation_tags(path);
                match self.cache.invalidate_tags(&tags).await {
                    Ok(count) if count > 0 => debug!(count, "cache entries invalidated"),
                    Ok(_) => {}
                    Err(e) => warn!(error = %e, "failed to invalidate cache after mutation"),
                }
                Ok(value)
            }
            Err(err) => {
                // Connectivity dropped mid-flight: hand retryable work to
                // the queue instead of losing it.
                if err.is_retryable() && !self.connectivity.is_online() {
                    return self.defer_or_fail(kind, path, body).await;
                }
                Err(err)
            }
        }
    }

    /// Queue the mutation, or fail fast for auth flows.
    async fn defer_or_fail<T>(
        &self,
        kind: ActionKind,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> ApiResult<T> {
        if is_auth_path(path) {
            return Err(ApiError::network("device is offline; auth requests are never queued"));
        }

        let action_id =
            self.queue.enqueue(kind, path, body).await.map_err(queue_error)?;
        Err(ApiError::Queued { action_id })
    }

    /// One request, with at most one refresh-and-retry on a 401.
    async fn request_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
        refresh_on_401: bool,
    ) -> ApiResult<T> {
        let response = self.send_once(method.clone(), path, body.as_ref()).await?;

        if response.status() == StatusCode::UNAUTHORIZED && refresh_on_401 && !is_auth_path(path) {
            debug!(path = %path, "401 received, refreshing token");
            match self.tokens.refresh().await {
                Ok(_) => {
                    let retried = self.send_once(method, path, body.as_ref()).await?;
                    return parse_response(retried).await;
                }
                Err(e) => {
                    // Refresh failure already forced the logout; the call
                    // reports the original authentication failure.
                    warn!(path = %path, error = %e, "token refresh failed");
                    return Err(ApiError::http(401, "authentication required"));
                }
            }
        }

        parse_response(response).await
    }

    async fn send_once(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> ApiResult<Response> {
        let url = format!("{}{}", self.config.base_url, path);
        let mut request =
            self.http.request(method, &url).header("Content-Type", "application/json");

        if let Some(token) = self.tokens.access_token().await {
            request = request.header("Authorization", format!("Bearer {token}"));
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        self.http.send(request).await
    }
}

async fn parse_response<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
    let status = response.status();

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(normalize_status(status, &body));
    }

    // 204/205 carry no body per the RFC
    if status == StatusCode::NO_CONTENT || status == StatusCode::RESET_CONTENT {
        return serde_json::from_value(serde_json::Value::Null).map_err(|_| {
            ApiError::serialization(format!(
                "no-content response ({}) cannot populate the expected type",
                status.as_u16()
            ))
        });
    }

    response
        .json()
        .await
        .map_err(|e| ApiError::serialization(format!("failed to parse response: {e}")))
}

/// Map a non-2xx response to `ApiError::Http`, lifting the server's error
/// document fields when the body is one.
fn normalize_status(status: StatusCode, body: &str) -> ApiError {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();

    let code = parsed
        .as_ref()
        .and_then(|v| v.get("code"))
        .and_then(|c| c.as_str())
        .map(String::from);
    let message = parsed
        .as_ref()
        .and_then(|v| v.get("message"))
        .and_then(|m| m.as_str())
        .map(String::from)
        .unwrap_or_else(|| {
            if body.is_empty() {
                format!("request failed with status {}", status.as_u16())
            } else {
                body.to_string()
            }
        });
    let details = parsed.as_ref().and_then(|v| v.get("details")).cloned();

    ApiError::Http { status: status.as_u16(), code, message, details }
}

fn verb_method(kind: ActionKind) -> Method {
    match kind {
        ActionKind::Post => Method::POST,
        ActionKind::Put => Method::PUT,
        ActionKind::Delete => Method::DELETE,
    }
}

fn cache_key(method: &Method, path: &str) -> String {
    format!("{method}:{path}")
}

fn first_path_segment(path: &str) -> Option<&str> {
    path.trim_start_matches('/').split(['/', '?']).next().filter(|s| !s.is_empty())
}

/// Tags a cached/mutated endpoint participates in. Default policy: the
/// first path segment, so `POST /groups/g1/join` invalidates every cached
/// GET under `groups`.
fn invalidation_tags(path: &str) -> Vec<String> {
    first_path_segment(path).map(|s| vec![s.to_string()]).unwrap_or_default()
}

fn is_auth_path(path: &str) -> bool {
    path.contains("/auth/")
}

fn queue_error(err: QueueError) -> ApiError {
    ApiError::storage(err.to_string())
}

/// Builder for [`ApiClient`].
#[derive(Default)]
pub struct ApiClientBuilder {
    config: Option<ClientConfig>,
    http: Option<HttpClient>,
    cache: Option<Arc<CacheStore>>,
    queue: Option<Arc<OfflineQueue>>,
    tokens: Option<Arc<TokenManager>>,
    connectivity: Option<Arc<dyn ConnectivityMonitor>>,
}

impl ApiClientBuilder {
    /// Set the client configuration.
    #[must_use]
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the HTTP transport (otherwise built from the config timeout).
    #[must_use]
    pub fn http(mut self, http: HttpClient) -> Self {
        self.http = Some(http);
        self
    }

    /// Set the cache store.
    #[must_use]
    pub fn cache(mut self, cache: Arc<CacheStore>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Set the offline queue.
    #[must_use]
    pub fn queue(mut self, queue: Arc<OfflineQueue>) -> Self {
        self.queue = Some(queue);
        self
    }

    /// Set the token manager.
    #[must_use]
    pub fn tokens(mut self, tokens: Arc<TokenManager>) -> Self {
        self.tokens = Some(tokens);
        self
    }

    /// Set the connectivity monitor.
    #[must_use]
    pub fn connectivity(mut self, connectivity: Arc<dyn ConnectivityMonitor>) -> Self {
        self.connectivity = Some(connectivity);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    /// Returns `ApiError::Config` if a required collaborator is missing
    /// or the config is invalid.
    pub fn build(self) -> Result<ApiClient, ApiError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let http = match self.http {
            Some(http) => http,
            None => HttpClient::builder().timeout(config.request_timeout).build()?,
        };

        let cache = self.cache.ok_or_else(|| ApiError::config("cache store not set"))?;
        let queue = self.queue.ok_or_else(|| ApiError::config("offline queue not set"))?;
        let tokens = self.tokens.ok_or_else(|| ApiError::config("token manager not set"))?;
        let connectivity =
            self.connectivity.ok_or_else(|| ApiError::config("connectivity monitor not set"))?;

        Ok(ApiClient::new(config, http, cache, queue, tokens, connectivity))
    }
}
