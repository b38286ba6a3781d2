//! Error types for the widget panel

use thiserror::Error;

/// Failure talking to the catalog or theme status endpoints.
///
/// Malformed bodies are reported the same way as transport failures: the
/// caller treats both as "this request produced nothing usable".
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// Transport-level failure (connect, TLS, timeout, body read)
    #[error("Network error: {0}")]
    Network(String),

    /// Endpoint answered with a non-success status
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Body could not be decoded into the expected schema
    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl FetchError {
    /// HTTP status code, when the endpoint answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        // Status queries carry the access token in the query string; keep it
        // out of anything that reaches a log line.
        FetchError::Network(err.without_url().to_string())
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Malformed(err.to_string())
    }
}

/// Configuration error
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required value was not supplied
    #[error("{0} is required")]
    Missing(&'static str),

    /// A value was supplied but cannot be used
    #[error("Invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Result type for fetch operations
pub type Result<T> = std::result::Result<T, FetchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_accessor() {
        let err = FetchError::Status {
            status: 503,
            body: "unavailable".to_string(),
        };
        assert_eq!(err.status(), Some(503));
        assert_eq!(err.to_string(), "HTTP 503: unavailable");
        assert_eq!(FetchError::Malformed("x".into()).status(), None);
    }

    #[test]
    fn test_json_error_is_malformed() {
        let err: FetchError = serde_json::from_str::<Vec<u8>>("{").unwrap_err().into();
        assert!(matches!(err, FetchError::Malformed(_)));
    }
}
