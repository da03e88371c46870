use std::time::Duration;

use ajo_domain::ApiError;
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response};
use tracing::debug;

/// Default per-request timeout.
///
/// The transport's own default is effectively unbounded; a mobile client
/// must never hang a screen on a dead connection.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client with a bounded timeout and normalized transport errors.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: ReqwestClient,
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Convenience constructor with default configuration.
    pub fn new() -> Result<Self, ApiError> {
        Self::builder().build()
    }

    /// Create a request builder using the underlying reqwest client.
    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Execute the request, mapping transport failures to
    /// [`ApiError::Network`].
    ///
    /// A response — any status — is returned as-is; only failures to get
    /// one at all are errors here.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        match builder.send().await {
            Ok(response) => {
                debug!(status = %response.status(), url = %response.url(), "received HTTP response");
                Ok(response)
            }
            Err(err) => Err(map_transport_error(&err)),
        }
    }
}

fn map_transport_error(err: &reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::network(format!("request timed out: {err}"))
    } else if err.is_connect() {
        ApiError::network(format!("connection failed: {err}"))
    } else {
        ApiError::network(err.to_string())
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug, Default)]
pub struct HttpClientBuilder {
    timeout: Option<Duration>,
}

impl HttpClientBuilder {
    /// Override the per-request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    /// Returns `ApiError::Config` if the underlying client cannot be
    /// constructed.
    pub fn build(self) -> Result<HttpClient, ApiError> {
        let client = ReqwestClient::builder()
            .timeout(self.timeout.unwrap_or(DEFAULT_TIMEOUT))
            .build()
            .map_err(|e| ApiError::config(format!("failed to build HTTP client: {e}")))?;

        Ok(HttpClient { client })
    }
}
