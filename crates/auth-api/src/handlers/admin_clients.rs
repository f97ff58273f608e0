//! `/v1/clients.createClient`, `/v1/clients.getClient`,
//! `/v1/clients.rotateSecret` — all gated by `RootPrincipal`. Cross-workspace
//! lookups and rotations are rejected as 404 by `AdminService`, never 403,
//! so a caller cannot distinguish "not yours" from "doesn't exist".

use axum::extract::{Extension, Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use auth_core::error::AuthError;
use auth_core::models::{Client, ClientSecret};
use auth_core::services::store::RateLimitConfig;

use crate::error::{ApiError, TagRequestId};
use crate::extractors::RootPrincipal;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateClientRequest {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    #[validate(length(min = 1, message = "api_id must not be empty"))]
    pub api_id: String,
    pub rate_limit_bucket_size: Option<i64>,
    pub rate_limit_refill_amount: Option<i64>,
    pub rate_limit_refill_interval_ms: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ClientCreateResponse {
    #[serde(flatten)]
    pub client: Client,
    pub client_secret: String,
}

/// The rate-limit triplet is all-or-none (spec.md §3); a request that sets
/// some but not all three is a 400, not a 422 — the body is well-typed, just
/// semantically invalid.
fn rate_limit_from_request(
    req: &CreateClientRequest,
    request_id: &str,
) -> Result<Option<RateLimitConfig>, ApiError> {
    match (
        req.rate_limit_bucket_size,
        req.rate_limit_refill_amount,
        req.rate_limit_refill_interval_ms,
    ) {
        (None, None, None) => Ok(None),
        (Some(bucket_size), Some(refill_amount), Some(refill_interval_ms)) => {
            Ok(Some(RateLimitConfig {
                bucket_size,
                refill_amount,
                refill_interval_ms,
            }))
        }
        _ => {
            let err: ApiError = AuthError::BadRequest {
                reason: "rate_limit_bucket_size, rate_limit_refill_amount, and \
                         rate_limit_refill_interval_ms must be all set or all absent"
                    .to_string(),
            }
            .into();
            Err(err.with_request_id(request_id.to_string()))
        }
    }
}

pub async fn create_client(
    State(state): State<AppState>,
    Extension(request_id): Extension<String>,
    principal: RootPrincipal,
    Json(body): Json<CreateClientRequest>,
) -> Result<Json<ClientCreateResponse>, ApiError> {
    body.validate().tag(&request_id)?;
    let rate_limit = rate_limit_from_request(&body, &request_id)?;

    let (client, secret) = state
        .admin
        .create_client(&principal.client, &body.name, &body.api_id, rate_limit)
        .await
        .tag(&request_id)?;

    Ok(Json(ClientCreateResponse {
        client,
        client_secret: secret,
    }))
}

#[derive(Debug, Deserialize)]
pub struct GetClientQuery {
    pub client_id: String,
}

pub async fn get_client(
    State(state): State<AppState>,
    Extension(request_id): Extension<String>,
    principal: RootPrincipal,
    Query(query): Query<GetClientQuery>,
) -> Result<Json<Client>, ApiError> {
    let client = state
        .admin
        .get_client(&principal.client, &query.client_id)
        .await
        .tag(&request_id)?;
    Ok(Json(client))
}

#[derive(Debug, Deserialize)]
pub struct RotateSecretRequest {
    pub client_id: String,
    pub expires_at: Option<DateTime<Utc>>,
}

/// `ClientSecretCreateResult`: the new secret row plus its plaintext,
/// returned exactly once.
#[derive(Debug, Serialize)]
pub struct ClientSecretCreateResponse {
    #[serde(flatten)]
    pub secret: ClientSecret,
    pub client_secret: String,
}

pub async fn rotate_secret(
    State(state): State<AppState>,
    Extension(request_id): Extension<String>,
    principal: RootPrincipal,
    Json(body): Json<RotateSecretRequest>,
) -> Result<Json<ClientSecretCreateResponse>, ApiError> {
    let (secret, plaintext) = state
        .admin
        .rotate_secret(&principal.client, &body.client_id, body.expires_at)
        .await
        .tag(&request_id)?;

    Ok(Json(ClientSecretCreateResponse {
        secret,
        client_secret: plaintext,
    }))
}
