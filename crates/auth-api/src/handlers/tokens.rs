//! `/v1/tokens.verifyToken` — the basic authorizer's HTTP face. Always 200;
//! a missing or unparsable bearer header is reported the same way a
//! malformed token is (`BAD_JWT`), never as a 401, per spec.md §4.I.

use axum::extract::{Extension, State};
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::Json;

use auth_core::error::InvalidReason;
use auth_core::services::BasicVerification;

use crate::error::{ApiError, TagRequestId};
use crate::AppState;

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

pub async fn verify_token(
    State(state): State<AppState>,
    Extension(request_id): Extension<String>,
    headers: HeaderMap,
) -> Result<Json<BasicVerification>, ApiError> {
    let verification = match bearer_token(&headers) {
        Some(token) => state.authorizer.authorize_basic(token).await.tag(&request_id)?,
        None => BasicVerification {
            valid: false,
            reason: Some(InvalidReason::BadJwt),
        },
    };

    Ok(Json(verification))
}
