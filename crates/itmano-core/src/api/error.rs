use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP {status}: {message}")]
    Http { status: StatusCode, message: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Error payload shapes the backend sends: our views use `message`,
/// DRF's built-in exceptions use `detail`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    detail: Option<String>,
}

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    /// Pull the human-readable message out of a JSON error body, if any.
    pub fn extract_message(body: &str) -> Option<String> {
        let parsed: ErrorBody = serde_json::from_str(body).ok()?;
        parsed
            .message
            .or(parsed.detail)
            .filter(|m| !m.trim().is_empty())
    }

    /// Build an HTTP error from a non-2xx response body.
    /// Uses the body's `message` when present, then `fallback`, then the raw body.
    pub fn from_status(status: StatusCode, body: &str, fallback: Option<&str>) -> Self {
        let message = Self::extract_message(body)
            .or_else(|| fallback.map(str::to_string))
            .unwrap_or_else(|| {
                if body.trim().is_empty() {
                    status
                        .canonical_reason()
                        .unwrap_or("Unknown error")
                        .to_string()
                } else {
                    Self::truncate_body(body)
                }
            });
        ApiError::Http { status, message }
    }

    /// True when the server rejected the credential (401/403).
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            ApiError::Http { status, .. }
                if *status == StatusCode::UNAUTHORIZED || *status == StatusCode::FORBIDDEN
        )
    }

    /// Message suitable for showing to the person at the keyboard.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Network(e) if e.is_timeout() => {
                "Connection timed out. Please try again.".to_string()
            }
            ApiError::Network(_) => {
                "Unable to connect to server. Check your internet connection.".to_string()
            }
            ApiError::Http { message, .. } => message.clone(),
            ApiError::MalformedResponse(message) => message.clone(),
            ApiError::Validation(message) => message.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_field_wins() {
        let err = ApiError::from_status(
            StatusCode::UNAUTHORIZED,
            r#"{"message": "Invalid credentials", "errors": {}}"#,
            Some("An error occurred during login"),
        );
        match err {
            ApiError::Http { status, message } => {
                assert_eq!(status, StatusCode::UNAUTHORIZED);
                assert_eq!(message, "Invalid credentials");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_detail_field_used() {
        let body = r#"{"detail": "Invalid token."}"#;
        assert_eq!(ApiError::extract_message(body).as_deref(), Some("Invalid token."));
    }

    #[test]
    fn test_fallback_when_no_message() {
        let err = ApiError::from_status(
            StatusCode::BAD_REQUEST,
            r#"{"username": ["This field is required."]}"#,
            Some("Registration error occurred."),
        );
        assert_eq!(err.user_message(), "Registration error occurred.");
    }

    #[test]
    fn test_raw_body_truncated_without_fallback() {
        let body = "x".repeat(MAX_ERROR_BODY_LENGTH + 20);
        let err = ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, &body, None);
        let message = err.user_message();
        assert!(message.starts_with(&"x".repeat(MAX_ERROR_BODY_LENGTH)));
        assert!(message.contains("truncated, 520 total bytes"));
    }

    #[test]
    fn test_empty_body_uses_reason() {
        let err = ApiError::from_status(StatusCode::NOT_FOUND, "", None);
        assert_eq!(err.user_message(), "Not Found");
    }

    #[test]
    fn test_is_unauthorized() {
        assert!(ApiError::from_status(StatusCode::UNAUTHORIZED, "", None).is_unauthorized());
        assert!(ApiError::from_status(StatusCode::FORBIDDEN, "", None).is_unauthorized());
        assert!(!ApiError::from_status(StatusCode::BAD_GATEWAY, "", None).is_unauthorized());
        assert!(!ApiError::Validation("Passwords do not match".into()).is_unauthorized());
    }
}
