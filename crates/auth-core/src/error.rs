//! Error taxonomy for the authorization service.
//!
//! `AuthError` is the single enum every service layer returns; the API
//! layer maps it to an HTTP response (see `auth-api`'s `ApiError`). 500s
//! never surface the wrapped message to the caller, only to the log line.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid client")]
    InvalidClient,

    #[error("not authenticated")]
    NotAuthenticated { reason: Option<InvalidReason> },

    #[error("forbidden: {reason}")]
    Forbidden { reason: String },

    #[error("resource not found: {resource}")]
    NotFound { resource: String },

    #[error("bad request: {reason}")]
    BadRequest { reason: String },

    #[error("validation failed: {message}")]
    ValidationError { message: String },

    #[error("internal error: {0}")]
    Internal(String),
}

/// The reasons a basic-authorizer verification can come back invalid as.
/// Never an HTTP error by itself — verification always answers 200.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvalidReason {
    NotFound,
    RateLimitExceeded,
    VersionMismatch,
    SecretExpired,
    BadJwt,
    Expired,
    InvalidSignature,
}

impl std::fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = serde_json::to_value(self)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_else(|| "UNKNOWN".to_string());
        write!(f, "{s}")
    }
}
