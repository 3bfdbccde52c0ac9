//! Error types for the Ray relay core
//!
//! Errors are grouped the way the HTTP layer reports them: configuration,
//! validation, upstream failures and degradable failures of optional steps.

use thiserror::Error;

/// Main error type for relay operations
#[derive(Error, Debug)]
pub enum RayError {
    /// A credential or endpoint needed by an upstream client is not configured
    #[error("Missing configuration: {name} is not set")]
    MissingCredential {
        /// Name of the missing setting (environment variable name)
        name: &'static str,
    },

    /// An upstream service answered with a non-2xx status
    #[error("{service} returned HTTP {status}")]
    Upstream {
        /// Upstream service name (openai, google-search, supabase, resend)
        service: &'static str,
        /// HTTP status code returned upstream
        status: u16,
        /// Raw response body, parsed as JSON when possible
        body: serde_json::Value,
    },

    /// Transport-level HTTP failure (connect, timeout, TLS)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The completion service answered but no text could be extracted
    #[error("Completion returned no text content")]
    EmptyCompletion,

    /// Caller input that cannot be processed
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Persistence failure that is not an HTTP status (e.g. malformed row)
    #[error("Store error: {0}")]
    Store(String),
}

/// Result type alias for relay operations
pub type Result<T> = std::result::Result<T, RayError>;

impl RayError {
    /// Create a new MissingCredential error
    pub fn missing(name: &'static str) -> Self {
        Self::MissingCredential { name }
    }

    /// Create an Upstream error from a status and raw body text
    pub fn upstream(service: &'static str, status: u16, body: &str) -> Self {
        let body = serde_json::from_str(body)
            .unwrap_or_else(|_| serde_json::Value::String(body.to_string()));
        Self::Upstream {
            service,
            status,
            body,
        }
    }

    /// Create a new InvalidInput error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Errors an optional enhancement step may swallow and replace with a default
    pub fn is_degradable(&self) -> bool {
        matches!(
            self,
            Self::Json(_) | Self::EmptyCompletion | Self::Upstream { .. } | Self::Http(_)
        )
    }

    /// Check if the error is a configuration issue
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::MissingCredential { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_credential_display() {
        let err = RayError::missing("OPENAI_API_KEY");
        assert_eq!(
            err.to_string(),
            "Missing configuration: OPENAI_API_KEY is not set"
        );
        assert!(err.is_config_error());
        assert!(!err.is_degradable());
    }

    #[test]
    fn test_upstream_body_is_parsed_when_json() {
        let err = RayError::upstream("openai", 429, r#"{"error":{"message":"slow down"}}"#);
        match err {
            RayError::Upstream { status, body, .. } => {
                assert_eq!(status, 429);
                assert_eq!(body["error"]["message"], "slow down");
            },
            _ => panic!("Expected upstream error"),
        }
    }

    #[test]
    fn test_upstream_body_falls_back_to_text() {
        let err = RayError::upstream("resend", 502, "Bad Gateway");
        match &err {
            RayError::Upstream { body, .. } => assert_eq!(body, "Bad Gateway"),
            _ => panic!("Expected upstream error"),
        }
        assert!(err.is_degradable());
        assert_eq!(err.to_string(), "resend returned HTTP 502");
    }

    #[test]
    fn test_invalid_input_is_not_degradable() {
        assert!(!RayError::invalid("title is required").is_degradable());
    }
}
