use thiserror::Error;

use crate::utils::truncate;

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Request rejected ({status}): {body}")]
    Validation { status: u16, body: String },

    #[error("Server error ({status}): {body}")]
    Server { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Network(err.to_string())
    }
}

impl ApiError {
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let body = truncate(body, MAX_ERROR_BODY_LENGTH);
        match status.as_u16() {
            404 => ApiError::NotFound(body),
            400..=499 => ApiError::Validation { status: status.as_u16(), body },
            _ => ApiError::Server { status: status.as_u16(), body },
        }
    }

    /// Whether a retry could plausibly succeed. 4xx outcomes are
    /// deterministic and are never retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, ApiError::Network(_) | ApiError::Server { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_from_status_mapping() {
        assert!(matches!(
            ApiError::from_status(StatusCode::NOT_FOUND, "no such event"),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::UNPROCESSABLE_ENTITY, "phone required"),
            ApiError::Validation { status: 422, .. }
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, "boom"),
            ApiError::Server { status: 500, .. }
        ));
        // Anything else non-2xx is treated as a server-side problem
        assert!(matches!(
            ApiError::from_status(StatusCode::MOVED_PERMANENTLY, ""),
            ApiError::Server { status: 301, .. }
        ));
    }

    #[test]
    fn test_transient_classification() {
        assert!(ApiError::Network("connection refused".into()).is_transient());
        assert!(ApiError::Server { status: 502, body: String::new() }.is_transient());
        assert!(!ApiError::NotFound("gone".into()).is_transient());
        assert!(!ApiError::Validation { status: 400, body: String::new() }.is_transient());
        assert!(!ApiError::InvalidResponse("truncated json".into()).is_transient());
    }

    #[test]
    fn test_body_truncated() {
        let long_body = "x".repeat(2000);
        match ApiError::from_status(StatusCode::BAD_GATEWAY, &long_body) {
            ApiError::Server { body, .. } => assert!(body.len() <= MAX_ERROR_BODY_LENGTH),
            other => panic!("unexpected variant: {:?}", other),
        }
    }
}
