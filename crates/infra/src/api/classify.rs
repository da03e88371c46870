//! Error classification for the UI layer.
//!
//! Pure functions over `ApiError`: consistent user-facing wording, the
//! retry backoff schedule, and a bounded diagnostic log. Screens call
//! [`user_message`] instead of formatting errors themselves, so wording
//! stays identical no matter which flow failed.

use std::sync::Mutex;
use std::time::Duration;

use ajo_common::collections::RingBuffer;
use ajo_domain::{ApiError, CODE_NETWORK_ERROR};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

/// Entries retained by the diagnostic log.
const ERROR_LOG_CAPACITY: usize = 100;

/// Backoff ceiling.
const MAX_RETRY_DELAY: Duration = Duration::from_millis(30_000);

/// Map an error to its user-facing message.
///
/// Statuses with dedicated wording get it regardless of what the server
/// said; everything else falls back to the server-supplied message, then
/// to a generic line.
pub fn user_message(error: &ApiError) -> String {
    if error.code() == Some(CODE_NETWORK_ERROR) {
        return "No internet connection. Please check your network and try again.".to_string();
    }

    match error {
        ApiError::Queued { .. } => {
            "You're offline. This action will be completed automatically when you reconnect."
                .to_string()
        }
        ApiError::Http { status, message, .. } => match status {
            401 => "Your session has expired. Please sign in again.".to_string(),
            403 => "You don't have permission to do that.".to_string(),
            404 => "We couldn't find what you were looking for.".to_string(),
            409 => "That conflicts with the current state. Please refresh and try again."
                .to_string(),
            422 => "Some of the details you entered are invalid.".to_string(),
            429 => "Too many requests. Please wait a moment and try again.".to_string(),
            500 => "Something went wrong on our side. Please try again.".to_string(),
            502 => "The service is temporarily unavailable. Please try again shortly.".to_string(),
            503 => "The service is down for maintenance. Please try again shortly.".to_string(),
            _ if !message.is_empty() => message.clone(),
            _ => "Something went wrong. Please try again.".to_string(),
        },
        ApiError::Network { .. } => {
            "No internet connection. Please check your network and try again.".to_string()
        }
        ApiError::Serialization { .. } | ApiError::Config { .. } | ApiError::Storage { .. } => {
            "Something went wrong. Please try again.".to_string()
        }
    }
}

/// Delay before retry number `attempt` (1-based).
///
/// Exponential backoff, `1000 · 2^(attempt-1)` ms capped at 30 s. A
/// server-supplied `retry_after` (seconds) on a 429 takes precedence.
pub fn retry_delay(error: &ApiError, attempt: u32) -> Duration {
    if error.status() == 429 {
        if let ApiError::Http { details: Some(details), .. } = error {
            if let Some(secs) = details.get("retry_after").and_then(|v| v.as_u64()) {
                return Duration::from_secs(secs);
            }
        }
    }

    let attempt = attempt.max(1);
    let exp = (attempt - 1).min(10);
    let millis = 1_000u64.saturating_mul(1 << exp);
    Duration::from_millis(millis).min(MAX_RETRY_DELAY)
}

/// One recorded failure.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorLogEntry {
    pub logged_at: DateTime<Utc>,
    pub status: u16,
    pub code: Option<String>,
    pub message: String,
    pub context: Option<String>,
}

/// Bounded in-memory log of recent failures, for support/diagnostics
/// screens. Oldest entries fall off once the capacity is reached.
#[derive(Debug)]
pub struct ErrorLog {
    entries: Mutex<RingBuffer<ErrorLogEntry>>,
}

impl ErrorLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self { entries: Mutex::new(RingBuffer::new(ERROR_LOG_CAPACITY)) }
    }

    /// Record a failure with optional call-site context.
    pub fn log(&self, error: &ApiError, context: Option<&str>) {
        let entry = ErrorLogEntry {
            logged_at: Utc::now(),
            status: error.status(),
            code: error.code().map(String::from),
            message: error.to_string(),
            context: context.map(String::from),
        };

        debug!(status = entry.status, context = ?entry.context, "error logged");

        if let Ok(mut entries) = self.entries.lock() {
            entries.push(entry);
        }
    }

    /// Snapshot of retained entries, oldest first.
    pub fn entries(&self) -> Vec<ErrorLogEntry> {
        self.entries.lock().map(|e| e.iter().cloned().collect()).unwrap_or_default()
    }

    /// Number of retained entries.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every retained entry.
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }
}

impl Default for ErrorLog {
    fn default() -> Self {
        Self::new()
    }
}
