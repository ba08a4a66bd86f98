//! Error types for the Gemini API client.

use thiserror::Error;

/// Result type alias for Gemini operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for Gemini API operations.
#[derive(Error, Debug)]
pub enum Error {
    /// API error returned by Gemini.
    #[error("gemini: {message} (http={http_status}, status={status})")]
    Api {
        http_status: u16,
        status: String,
        message: String,
    },

    /// HTTP request error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Creates a new API error.
    pub fn api(http_status: u16, status: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Api {
            http_status,
            status: status.into(),
            message: message.into(),
        }
    }

    /// Returns true if the API key was rejected.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Error::Api { http_status: 401 | 403, .. })
    }

    /// Returns true if this is a rate limit error.
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Error::Api { http_status: 429, .. })
    }

    /// Returns true if this is a server-side error.
    pub fn is_server_error(&self) -> bool {
        matches!(self, Error::Api { http_status, .. } if *http_status >= 500)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = Error::api(400, "INVALID_ARGUMENT", "voice not found");
        let text = err.to_string();
        assert!(text.contains("voice not found"));
        assert!(text.contains("400"));
        assert!(text.contains("INVALID_ARGUMENT"));
    }

    #[test]
    fn test_error_classification() {
        assert!(Error::api(403, "PERMISSION_DENIED", "bad key").is_unauthorized());
        assert!(Error::api(429, "RESOURCE_EXHAUSTED", "slow down").is_rate_limit());
        assert!(Error::api(503, "UNAVAILABLE", "overloaded").is_server_error());
        assert!(!Error::api(400, "INVALID_ARGUMENT", "oops").is_server_error());
        assert!(!Error::Config("missing key".to_string()).is_rate_limit());
    }
}
