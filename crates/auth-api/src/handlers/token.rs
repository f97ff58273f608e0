//! `POST /oauth/token` — client-credentials issuance. Grounded in the
//! teacher's `handlers::auth::login` for the attempt/success/failure logging
//! shape; the credential coalescing itself has no teacher analogue and
//! follows spec.md §4.H's "first non-null wins" rule directly.

use axum::body::Bytes;
use axum::extract::{Extension, State};
use axum::http::{header, HeaderMap};
use axum::Json;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
struct TokenFields {
    grant_type: Option<String>,
    client_id: Option<String>,
    client_secret: Option<String>,
}

#[derive(Debug, Default)]
struct Credentials {
    grant_type: Option<String>,
    client_id: Option<String>,
    client_secret: Option<String>,
}

impl From<TokenFields> for Credentials {
    fn from(f: TokenFields) -> Self {
        Self {
            grant_type: f.grant_type,
            client_id: f.client_id,
            client_secret: f.client_secret,
        }
    }
}

#[derive(Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub scope: Option<String>,
}

/// Parses exactly one of {form, json} based on `Content-Type`; the other
/// body modality is never consulted, per spec.md §4.H rule 1.
fn parse_body(headers: &HeaderMap, body: &[u8]) -> Credentials {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if content_type.starts_with("application/json") {
        serde_json::from_slice::<TokenFields>(body).unwrap_or_default().into()
    } else if content_type.starts_with("application/x-www-form-urlencoded") {
        serde_urlencoded::from_bytes::<TokenFields>(body).unwrap_or_default().into()
    } else {
        Credentials::default()
    }
}

/// `Authorization: Basic base64(client_id:client_secret)`. Never carries a
/// `grant_type`.
fn parse_basic_auth(headers: &HeaderMap) -> Credentials {
    let Some(raw) = headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) else {
        return Credentials::default();
    };
    let Some(encoded) = raw.strip_prefix("Basic ").or_else(|| raw.strip_prefix("basic ")) else {
        return Credentials::default();
    };
    let Ok(decoded) = STANDARD.decode(encoded) else {
        return Credentials::default();
    };
    let Ok(text) = String::from_utf8(decoded) else {
        return Credentials::default();
    };

    match text.split_once(':') {
        Some((id, secret)) => Credentials {
            grant_type: None,
            client_id: Some(id.to_string()),
            client_secret: Some(secret.to_string()),
        },
        None => Credentials::default(),
    }
}

/// First non-null across `[body, header]` wins, independently per field.
fn coalesce(body: Credentials, header: Credentials) -> Credentials {
    Credentials {
        grant_type: body.grant_type.or(header.grant_type),
        client_id: body.client_id.or(header.client_id),
        client_secret: body.client_secret.or(header.client_secret),
    }
}

pub async fn issue_token(
    State(state): State<AppState>,
    Extension(request_id): Extension<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<TokenResponse>, ApiError> {
    let credentials = coalesce(parse_body(&headers, &body), parse_basic_auth(&headers));

    let (client_id, client_secret, grant_type) = match (
        credentials.client_id,
        credentials.client_secret,
        credentials.grant_type,
    ) {
        (Some(id), Some(secret), Some(grant_type)) => (id, secret, grant_type),
        _ => {
            warn!(request_id = %request_id, "token request missing a required field");
            let err: ApiError = auth_core::error::AuthError::BadRequest {
                reason: "missing grant_type, client_id, or client_secret".to_string(),
            }
            .into();
            return Err(err.with_request_id(request_id));
        }
    };

    info!(request_id = %request_id, client_id = %client_id, "token issuance attempt");

    match state.issuer.issue(&client_id, &client_secret, &grant_type).await {
        Ok(issued) => {
            info!(request_id = %request_id, client_id = %client_id, "token issued");
            Ok(Json(TokenResponse {
                access_token: issued.access_token,
                token_type: issued.token_type,
                expires_in: issued.expires_in,
                scope: issued.scope,
            }))
        }
        Err(e) => {
            warn!(request_id = %request_id, client_id = %client_id, error = %e, "token issuance failed");
            Err(ApiError::from(e).with_request_id(request_id))
        }
    }
}
