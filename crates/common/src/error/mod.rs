//! Error-classification infrastructure.
//!
//! Internal error types implement [`ErrorClassification`] so retry logic
//! and logging can treat them uniformly. The public error callers see is
//! `ajo_domain::ApiError`; the trait here covers the module-level errors
//! that get folded into it at the client boundary.

use std::fmt;
use std::time::Duration;

/// Classification interface for internal error types.
pub trait ErrorClassification {
    /// Whether retrying the failed operation may succeed.
    fn is_retryable(&self) -> bool;

    /// Severity for monitoring and logging decisions.
    fn severity(&self) -> ErrorSeverity;

    /// Whether this error requires immediate attention.
    fn is_critical(&self) -> bool {
        self.severity() == ErrorSeverity::Critical
    }

    /// Suggested retry delay, when the error carries one (e.g. a
    /// server-supplied Retry-After).
    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

/// Error severity levels for monitoring and alerting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Informational, typically for debugging
    Info,
    /// Warning, should be monitored but not critical
    Warning,
    /// Error, requires attention and action
    Error,
    /// Critical, immediate action required
    Critical,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Validates `ErrorSeverity` ordering for the escalation scenario.
    ///
    /// Assertions:
    /// - Ensures severities order Info < Warning < Error < Critical.
    #[test]
    fn test_severity_ordering() {
        assert!(ErrorSeverity::Info < ErrorSeverity::Warning);
        assert!(ErrorSeverity::Warning < ErrorSeverity::Error);
        assert!(ErrorSeverity::Error < ErrorSeverity::Critical);
    }

    /// Validates `ErrorSeverity` display formatting.
    ///
    /// Assertions:
    /// - Confirms each level renders its log tag.
    #[test]
    fn test_severity_display() {
        assert_eq!(ErrorSeverity::Info.to_string(), "INFO");
        assert_eq!(ErrorSeverity::Warning.to_string(), "WARN");
        assert_eq!(ErrorSeverity::Error.to_string(), "ERROR");
        assert_eq!(ErrorSeverity::Critical.to_string(), "CRITICAL");
    }
}
