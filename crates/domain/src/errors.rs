//! The normalized error type for the Ajo client core.
//!
//! Every failure path in the client — transport failures, non-2xx
//! responses, offline queueing, local storage problems — is coerced into
//! `ApiError` before it reaches a caller. Hosts pattern-match on the
//! closed set of variants instead of probing optional fields, and the
//! serde tagging lets the enum cross an FFI/bridge boundary as JSON.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for client operations.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Server error code attached to network-class failures.
pub const CODE_NETWORK_ERROR: &str = "NETWORK_ERROR";

/// Error code attached to deferred (queued) mutations.
pub const CODE_QUEUED: &str = "QUEUED";

/// Normalized client error.
///
/// `Queued` is a deferred-success signal rather than a failure: the
/// mutation was persisted to the offline queue and will be replayed when
/// connectivity returns. Callers surface it as "pending", not as an error.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ApiError {
    /// The backend was unreachable (offline, DNS, timeout).
    #[error("Network error: {message}")]
    Network { message: String },

    /// The backend answered with a non-2xx status.
    #[error("HTTP {status}: {message}")]
    Http {
        status: u16,
        #[serde(skip_serializing_if = "Option::is_none")]
        code: Option<String>,
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        details: Option<serde_json::Value>,
    },

    /// The mutation was queued for replay; `action_id` correlates the
    /// eventual outcome.
    #[error("Action queued for offline replay ({action_id})")]
    Queued { action_id: String },

    /// A request or response body could not be (de)serialized.
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Client-side configuration is invalid.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// The local key-value store failed.
    #[error("Storage error: {message}")]
    Storage { message: String },
}

impl ApiError {
    /// Create a network error.
    pub fn network<S: Into<String>>(message: S) -> Self {
        Self::Network { message: message.into() }
    }

    /// Create an HTTP error without server-supplied code or details.
    pub fn http<S: Into<String>>(status: u16, message: S) -> Self {
        Self::Http { status, code: None, message: message.into(), details: None }
    }

    /// Create a serialization error.
    pub fn serialization<S: Into<String>>(message: S) -> Self {
        Self::Serialization { message: message.into() }
    }

    /// Create a configuration error.
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into() }
    }

    /// Create a storage error.
    pub fn storage<S: Into<String>>(message: S) -> Self {
        Self::Storage { message: message.into() }
    }

    /// HTTP status carried by this error; `0` for anything that never
    /// reached the backend.
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            Self::Http { status, .. } => *status,
            _ => 0,
        }
    }

    /// Machine-readable code, if any.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Network { .. } => Some(CODE_NETWORK_ERROR),
            Self::Queued { .. } => Some(CODE_QUEUED),
            Self::Http { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// Whether retrying the same call may succeed.
    ///
    /// Network failures, 5xx responses, and 429 are retryable. Other 4xx
    /// responses are not. `Queued` is not retryable: replay is owned by
    /// the offline queue, callers must not re-submit.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network { .. } => true,
            Self::Http { status, .. } => *status == 429 || *status >= 500,
            Self::Queued { .. }
            | Self::Serialization { .. }
            | Self::Config { .. }
            | Self::Storage { .. } => false,
        }
    }

    /// Whether this error is the deferred-success queue signal.
    #[must_use]
    pub fn is_queued(&self) -> bool {
        matches!(self, Self::Queued { .. })
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}
