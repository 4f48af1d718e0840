//! Errors of the grading service client

use thiserror::Error;

use super::auth::API_KEY_ENV;

#[derive(Debug, Error)]
pub enum ClaudeError {
    #[error("No API key. Set {API_KEY_ENV} or run `discursiva key set <key>`")]
    ApiKeyNotFound,

    #[error("Failed to access keyring: {0}")]
    KeyringError(String),

    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    /// Non-success status other than 429
    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Rate limited. Retry after {retry_after_seconds} seconds")]
    RateLimited { retry_after_seconds: u64 },

    /// The reply carried no text block
    #[error("Empty response from API")]
    EmptyResponse,

    #[error("Invalid API key format. Key should start with 'sk-ant-'")]
    InvalidApiKey,

    #[error("Unexpected response body: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl ClaudeError {
    /// Whether the same request may succeed later
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ClaudeError::RateLimited { .. } | ClaudeError::RequestError(_) | ClaudeError::EmptyResponse
        )
    }

    /// Whether the key itself is missing or rejected
    pub fn requires_reauth(&self) -> bool {
        matches!(
            self,
            ClaudeError::ApiKeyNotFound
                | ClaudeError::InvalidApiKey
                | ClaudeError::ApiError { status: 401, .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn unauthorized_requires_reauth() {
        let err = ClaudeError::ApiError { status: 401, message: "Invalid API key".into() };
        assert!(err.requires_reauth());
        assert!(!err.is_recoverable());
    }

    #[test]
    fn rate_limit_is_recoverable() {
        let err = ClaudeError::RateLimited { retry_after_seconds: 30 };
        assert!(err.is_recoverable());
        assert!(!err.requires_reauth());
        assert_eq!(err.to_string(), "Rate limited. Retry after 30 seconds");
    }

    #[test]
    fn missing_key_names_the_variable() {
        assert!(ClaudeError::ApiKeyNotFound.to_string().contains("ANTHROPIC_API_KEY"));
    }
}
