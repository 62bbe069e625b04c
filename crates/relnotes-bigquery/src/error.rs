//! Error hierarchy for relnotes-bigquery.
//!
//! Follows the "canonical error struct" pattern: the kind enum stays private
//! and callers classify failures through `is_xxx()` predicates.

use thiserror::Error;

/// Root error type for BigQuery client operations.
///
/// # Example
///
/// ```rust,ignore
/// use relnotes_bigquery::BigQueryError;
///
/// fn handle_error(err: BigQueryError) {
///     if err.is_cancelled() {
///         eprintln!("caller went away");
///     } else if let Some(status) = err.status() {
///         eprintln!("API returned HTTP {status}");
///     }
/// }
/// ```
#[derive(Error, Debug)]
#[error("{kind}")]
pub struct BigQueryError {
    kind: ErrorKind,
}

/// Internal error classification.
///
/// `pub(crate)` so variants can be added without breaking callers.
#[derive(Error, Debug)]
#[non_exhaustive]
pub(crate) enum ErrorKind {
    /// Credentials could not be resolved.
    #[error("credentials unavailable: {0}")]
    Auth(String),

    /// Client options are unusable (empty project, non-base endpoint, ...).
    #[error("invalid client configuration: {0}")]
    InvalidConfig(String),

    /// Request never produced an HTTP response.
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// API answered with a non-success status.
    #[error("BigQuery API returned {status}{}: {message}", reason_suffix(.reason))]
    Api {
        status: u16,
        reason: Option<String>,
        message: String,
    },

    /// Response body did not match the expected shape.
    #[error("malformed response: {0}")]
    Decode(String),

    /// Cancellation token fired before the call completed.
    #[error("operation cancelled")]
    Cancelled,
}

fn reason_suffix(reason: &Option<String>) -> String {
    reason
        .as_deref()
        .map(|r| format!(" ({r})"))
        .unwrap_or_default()
}

impl BigQueryError {
    // ═══════════════════════════════════════════════════════════════════════
    // Constructors
    // ═══════════════════════════════════════════════════════════════════════

    /// Create error for unresolvable credentials.
    #[must_use]
    pub fn auth(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Auth(message.into()),
        }
    }

    /// Create error for invalid client options.
    #[must_use]
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::InvalidConfig(message.into()),
        }
    }

    /// Create error for a non-success API response.
    #[must_use]
    pub fn api(status: u16, reason: Option<String>, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Api {
                status,
                reason,
                message: message.into(),
            },
        }
    }

    /// Create error for a malformed response or cell.
    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Decode(message.into()),
        }
    }

    /// Create error for a cancelled operation.
    #[must_use]
    pub const fn cancelled() -> Self {
        Self {
            kind: ErrorKind::Cancelled,
        }
    }

    /// Build an API error from a failed response body.
    ///
    /// BigQuery wraps failures as `{"error": {"code", "message", "errors": [{"reason"}]}}`;
    /// anything else is kept verbatim as the message.
    pub(crate) fn from_response(status: u16, body: &str) -> Self {
        match serde_json::from_str::<crate::wire::ApiErrorBody>(body) {
            Ok(parsed) => {
                let reason = parsed
                    .error
                    .errors
                    .into_iter()
                    .find_map(|e| e.reason)
                    .or(parsed.error.status);
                Self::api(status, reason, parsed.error.message)
            }
            Err(_) => Self::api(status, None, body.trim()),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Predicate Methods (is_xxx)
    // ═══════════════════════════════════════════════════════════════════════

    /// Returns true if credentials could not be resolved.
    #[must_use]
    pub const fn is_auth(&self) -> bool {
        matches!(self.kind, ErrorKind::Auth(_))
    }

    /// Returns true if the client options were rejected.
    #[must_use]
    pub const fn is_invalid_config(&self) -> bool {
        matches!(self.kind, ErrorKind::InvalidConfig(_))
    }

    /// Returns true if the request failed below the HTTP layer.
    #[must_use]
    pub const fn is_http(&self) -> bool {
        matches!(self.kind, ErrorKind::Http(_))
    }

    /// Returns true if the API answered with an error status.
    #[must_use]
    pub const fn is_api(&self) -> bool {
        matches!(self.kind, ErrorKind::Api { .. })
    }

    /// Returns true if a response could not be decoded.
    #[must_use]
    pub const fn is_decode(&self) -> bool {
        matches!(self.kind, ErrorKind::Decode(_))
    }

    /// Returns true if the operation was cancelled by the caller.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self.kind, ErrorKind::Cancelled)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Accessors
    // ═══════════════════════════════════════════════════════════════════════

    /// HTTP status of an API error.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self.kind {
            ErrorKind::Api { status, .. } => Some(status),
            _ => None,
        }
    }

    /// BigQuery error reason (`notFound`, `invalidQuery`, ...) of an API error.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match &self.kind {
            ErrorKind::Api { reason, .. } => reason.as_deref(),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for BigQueryError {
    fn from(err: reqwest::Error) -> Self {
        Self {
            kind: ErrorKind::Http(err),
        }
    }
}

/// Result type alias for BigQuery client operations.
pub type Result<T> = std::result::Result<T, BigQueryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error() {
        let err = BigQueryError::auth("metadata server unreachable");
        assert!(err.is_auth());
        assert!(!err.is_api());
        assert!(err.to_string().contains("metadata server unreachable"));
    }

    #[test]
    fn test_api_error_with_reason() {
        let err = BigQueryError::api(404, Some("notFound".into()), "Not found: Project nope");
        assert!(err.is_api());
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.reason(), Some("notFound"));
        assert_eq!(
            err.to_string(),
            "BigQuery API returned 404 (notFound): Not found: Project nope"
        );
    }

    #[test]
    fn test_api_error_without_reason() {
        let err = BigQueryError::api(500, None, "boom");
        assert_eq!(err.to_string(), "BigQuery API returned 500: boom");
        assert!(err.reason().is_none());
    }

    #[test]
    fn test_from_response_parses_error_body() {
        let body = r#"{"error":{"code":400,"message":"Syntax error","status":"INVALID_ARGUMENT","errors":[{"reason":"invalidQuery","message":"Syntax error"}]}}"#;
        let err = BigQueryError::from_response(400, body);
        assert_eq!(err.status(), Some(400));
        assert_eq!(err.reason(), Some("invalidQuery"));
        assert!(err.to_string().contains("Syntax error"));
    }

    #[test]
    fn test_from_response_falls_back_to_status() {
        let body = r#"{"error":{"code":403,"message":"denied","status":"PERMISSION_DENIED"}}"#;
        let err = BigQueryError::from_response(403, body);
        assert_eq!(err.reason(), Some("PERMISSION_DENIED"));
    }

    #[test]
    fn test_from_response_plain_text() {
        let err = BigQueryError::from_response(502, "  Bad Gateway\n");
        assert_eq!(err.status(), Some(502));
        assert!(err.reason().is_none());
        assert!(err.to_string().ends_with("Bad Gateway"));
    }

    #[test]
    fn test_cancelled_predicate() {
        let err = BigQueryError::cancelled();
        assert!(err.is_cancelled());
        assert!(err.status().is_none());
    }

    #[test]
    fn test_error_debug() {
        let err = BigQueryError::decode("bad cell");
        let debug_str = format!("{err:?}");
        assert!(debug_str.contains("BigQueryError"));
        assert!(err.is_decode());
    }
}
