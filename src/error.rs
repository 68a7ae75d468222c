//! Error types for Fortell.

use thiserror::Error;

/// Library-level error type for Fortell operations.
#[derive(Error, Debug)]
pub enum FortellError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing or invalid caller identity: {0}")]
    Auth(String),

    #[error("AI processing not permitted for this caller: {0}")]
    Consent(String),

    #[error("Rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("{provider} request failed{}: {message}", .status.map(|s| format!(" ({s})")).unwrap_or_default())]
    Provider {
        provider: String,
        status: Option<u16>,
        message: String,
    },

    #[error("Operation timed out: {0}")]
    Timeout(String),

    #[error("Audio staging failed: {0}")]
    Staging(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl FortellError {
    /// Construct a provider error for a named upstream service.
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        FortellError::Provider {
            provider: provider.into(),
            status: None,
            message: message.into(),
        }
    }

    /// Construct a provider error carrying an HTTP status.
    pub fn provider_status(
        provider: impl Into<String>,
        status: u16,
        message: impl Into<String>,
    ) -> Self {
        FortellError::Provider {
            provider: provider.into(),
            status: Some(status),
            message: message.into(),
        }
    }
}

/// Result type alias for Fortell operations.
pub type Result<T> = std::result::Result<T, FortellError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_display() {
        let err = FortellError::provider_status("whisper", 503, "unavailable");
        assert_eq!(err.to_string(), "whisper request failed (503): unavailable");

        let err = FortellError::provider("whisper", "connection reset");
        assert_eq!(err.to_string(), "whisper request failed: connection reset");
    }

    #[test]
    fn test_timeout_distinct_from_provider() {
        let timeout = FortellError::Timeout("poll budget exhausted".into());
        assert!(matches!(timeout, FortellError::Timeout(_)));
        assert!(!matches!(timeout, FortellError::Provider { .. }));
    }
}
