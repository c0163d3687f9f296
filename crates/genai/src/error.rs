use serde::Deserialize;
use thiserror::Error;

/// Errors returned by the generateContent client
#[derive(Debug, Error)]
pub enum GenAiError {
    #[error("Request error: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Response contained no text")]
    EmptyResponse,

    #[error("Prompt was blocked: {0}")]
    Blocked(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl GenAiError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError(message.into())
    }

    /// Builds an `ApiError` from a non-success response body.
    ///
    /// The API wraps failures as `{"error": {"code", "message", "status"}}`;
    /// anything else is kept verbatim.
    pub fn from_response_body(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<ErrorEnvelope>(body)
            .map(|envelope| envelope.error.message)
            .unwrap_or_else(|_| body.to_string());
        Self::ApiError { status, message }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetails,
}

#[derive(Debug, Deserialize)]
struct ErrorDetails {
    message: String,
}

pub type Result<T> = std::result::Result<T, GenAiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_uses_envelope_message() {
        let body = r#"{"error":{"code":400,"message":"API key not valid","status":"INVALID_ARGUMENT"}}"#;
        match GenAiError::from_response_body(400, body) {
            GenAiError::ApiError { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "API key not valid");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_api_error_keeps_plain_body() {
        match GenAiError::from_response_body(503, "Service Unavailable") {
            GenAiError::ApiError { message, .. } => assert_eq!(message, "Service Unavailable"),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
