//! Structured error model for per-stream replication failures.
//!
//! [`AccessorError`] carries a category and a retry classification so the
//! orchestrator can log and report a failed stream precisely. Construct via
//! the category-specific factory methods.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Broad classification of an accessor failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Stream-level configuration problem (bad catalog entry, bad bookmark).
    Config,
    /// Session rejected by the upstream API.
    Auth,
    /// Upstream throttling.
    RateLimit,
    /// Connection reset, timeout, upstream 5xx.
    TransientNetwork,
    /// Upstream rejected the request.
    Api,
    /// Malformed upstream response.
    Data,
    /// Local failure (e.g. writing output).
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Config => "config",
            Self::Auth => "auth",
            Self::RateLimit => "rate_limit",
            Self::TransientNetwork => "transient_network",
            Self::Api => "api",
            Self::Data => "data",
            Self::Internal => "internal",
        };
        f.write_str(s)
    }
}

/// Failure of a single stream accessor.
///
/// `retryable` records whether a later run is likely to succeed without
/// operator action. It is reported, never acted on within a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("[{category}] {code}: {message}")]
pub struct AccessorError {
    pub category: ErrorCategory,
    pub code: String,
    pub message: String,
    pub retryable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_after_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl AccessorError {
    fn new(
        category: ErrorCategory,
        retryable: bool,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            code: code.into(),
            message: message.into(),
            retryable,
            retry_after_ms: None,
            details: None,
        }
    }

    /// Stream configuration error (not retryable).
    #[must_use]
    pub fn config(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Config, false, code, message)
    }

    /// Authentication error (not retryable).
    #[must_use]
    pub fn auth(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Auth, false, code, message)
    }

    /// Rate limit error (retryable).
    #[must_use]
    pub fn rate_limit(
        code: impl Into<String>,
        message: impl Into<String>,
        retry_after_ms: Option<u64>,
    ) -> Self {
        let mut err = Self::new(ErrorCategory::RateLimit, true, code, message);
        err.retry_after_ms = retry_after_ms;
        err
    }

    /// Transient network error (retryable).
    #[must_use]
    pub fn transient_network(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::TransientNetwork, true, code, message)
    }

    /// Upstream API rejected the request (not retryable).
    #[must_use]
    pub fn api(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Api, false, code, message)
    }

    /// Malformed upstream data (not retryable).
    #[must_use]
    pub fn data(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Data, false, code, message)
    }

    /// Local failure (not retryable).
    #[must_use]
    pub fn internal(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Internal, false, code, message)
    }

    /// Attach structured diagnostic details.
    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_defaults() {
        let err = AccessorError::config("BAD_BOOKMARK", "bookmark is not a timestamp");
        assert_eq!(err.category, ErrorCategory::Config);
        assert!(!err.retryable);
        assert!(err.retry_after_ms.is_none());
    }

    #[test]
    fn transient_and_rate_limit_are_retryable() {
        assert!(AccessorError::transient_network("TIMEOUT", "timed out").retryable);
        let throttled = AccessorError::rate_limit("THROTTLED", "slow down", Some(5000));
        assert!(throttled.retryable);
        assert_eq!(throttled.retry_after_ms, Some(5000));
    }

    #[test]
    fn data_and_api_are_not_retryable() {
        assert!(!AccessorError::data("BAD_ROW", "row is not an object").retryable);
        assert!(!AccessorError::api("HTTP_400", "bad request").retryable);
    }

    #[test]
    fn serde_roundtrip() {
        let err = AccessorError::api("HTTP_404", "not found")
            .with_details(serde_json::json!({"object_type": "Email"}));
        let json = serde_json::to_string(&err).unwrap();
        let back: AccessorError = serde_json::from_str(&json).unwrap();
        assert_eq!(err, back);
    }

    #[test]
    fn display_format() {
        let err = AccessorError::transient_network("CONN_RESET", "connection reset by peer");
        assert_eq!(
            err.to_string(),
            "[transient_network] CONN_RESET: connection reset by peer"
        );
    }
}
