//! Typed extractors for the authorizer trio: `FromRequestParts` impls that
//! hand handlers already-verified principals instead of re-running the
//! bearer-token dance in every handler.

use async_trait::async_trait;
use auth_core::error::AuthError;
use auth_core::models::Client;
use auth_crypto::jwt::JwtClaims;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::header::AUTHORIZATION;

use crate::error::ApiError;
use crate::AppState;

pub struct InternalPrincipal(pub JwtClaims);

pub struct RootPrincipal {
    pub claims: JwtClaims,
    pub client: Client,
}

fn bearer_token(parts: &Parts) -> Result<&str, AuthError> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(AuthError::NotAuthenticated { reason: None })
}

/// The request-id middleware always runs before extractors, so this is
/// `None` only in handlers that bypass the router (e.g. unit tests).
fn request_id(parts: &Parts) -> Option<String> {
    parts.extensions.get::<String>().cloned()
}

fn reject(err: impl Into<ApiError>, parts: &Parts) -> ApiError {
    let err: ApiError = err.into();
    match request_id(parts) {
        Some(id) => err.with_request_id(id),
        None => err,
    }
}

#[async_trait]
impl FromRequestParts<AppState> for InternalPrincipal {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).map_err(|e| reject(e, parts))?;
        let claims = state
            .authorizer
            .authorize_internal(token)
            .await
            .map_err(|e| reject(e, parts))?;
        Ok(InternalPrincipal(claims))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for RootPrincipal {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).map_err(|e| reject(e, parts))?;
        let (claims, client) = state
            .authorizer
            .authorize_root(token)
            .await
            .map_err(|e| reject(e, parts))?;
        Ok(RootPrincipal { claims, client })
    }
}
