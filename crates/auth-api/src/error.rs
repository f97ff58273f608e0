//! Maps `AuthError` onto HTTP, generalized from the teacher's
//! `error.rs`/`error/problem_details.rs` shape: one wrapper type
//! implementing `IntoResponse`, one JSON body shape, 500s never leaking the
//! wrapped message.

use auth_core::error::AuthError;
use axum::{http::StatusCode, response::IntoResponse, response::Response, Json};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

pub struct ApiError {
    inner: AuthError,
    request_id: Option<String>,
}

impl ApiError {
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }
}

/// Tags a fallible result with the request id the middleware assigned to
/// this request, so the error body carries it regardless of which layer
/// (validation, authorizer, store) produced the failure.
pub trait TagRequestId<T> {
    fn tag(self, request_id: &str) -> Result<T, ApiError>;
}

impl<T, E: Into<ApiError>> TagRequestId<T> for Result<T, E> {
    fn tag(self, request_id: &str) -> Result<T, ApiError> {
        self.map_err(|e| e.into().with_request_id(request_id.to_string()))
    }
}

impl From<AuthError> for ApiError {
    fn from(inner: AuthError) -> Self {
        Self {
            inner,
            request_id: None,
        }
    }
}

/// Body schema failures surface as 422, per spec.md §7's resource-errors
/// entry, not 400 — distinct from a semantically invalid but well-typed body.
impl From<validator::ValidationErrors> for ApiError {
    fn from(e: validator::ValidationErrors) -> Self {
        AuthError::ValidationError {
            message: e.to_string(),
        }
        .into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self.inner {
            AuthError::InvalidClient => (StatusCode::BAD_REQUEST, "Invalid client".to_string()),
            AuthError::NotAuthenticated { reason } => (
                StatusCode::UNAUTHORIZED,
                reason
                    .map(|r| r.to_string())
                    .unwrap_or_else(|| "Not authenticated".to_string()),
            ),
            AuthError::Forbidden { reason } => (StatusCode::FORBIDDEN, reason.clone()),
            AuthError::NotFound { resource } => {
                (StatusCode::NOT_FOUND, format!("{resource} not found"))
            }
            AuthError::BadRequest { reason } => (StatusCode::BAD_REQUEST, reason.clone()),
            AuthError::ValidationError { message } => {
                (StatusCode::UNPROCESSABLE_ENTITY, message.clone())
            }
            AuthError::Internal(message) => {
                tracing::error!(error = %message, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ErrorBody {
            detail,
            request_id: self.request_id,
        };
        (status, Json(body)).into_response()
    }
}
