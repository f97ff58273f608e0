//! `/oauth/token` client-credentials grant: verify the presented secret
//! and mint an HS256 access token. Credential extraction (form body, JSON
//! body, HTTP Basic header) and the field-coalescing rule live in
//! `auth-api`; this service only ever sees already-resolved strings.

use crate::error::AuthError;
use crate::services::store::Store;
use auth_crypto::{verify_secret, JwtCodec};
use std::sync::Arc;

pub struct IssuedToken {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub scope: Option<String>,
}

pub struct TokenIssuer {
    jwt: Arc<JwtCodec>,
    store: Arc<dyn Store>,
}

impl TokenIssuer {
    pub fn new(jwt: Arc<JwtCodec>, store: Arc<dyn Store>) -> Self {
        Self { jwt, store }
    }

    /// `grant_type` other than `client_credentials`, an unknown client, or a
    /// secret mismatch are all reported identically as "Invalid client" —
    /// never distinguished, so a caller can't probe for which client ids
    /// exist.
    pub async fn issue(
        &self,
        client_id: &str,
        client_secret: &str,
        grant_type: &str,
    ) -> Result<IssuedToken, AuthError> {
        if grant_type != "client_credentials" {
            return Err(AuthError::BadRequest {
                reason: "unsupported grant_type".to_string(),
            });
        }

        let client = self
            .store
            .get_client(client_id)
            .await?
            .ok_or(AuthError::InvalidClient)?;

        let candidates = self.store.list_verifying_client_secrets(client_id).await?;
        let secret = candidates
            .iter()
            .find(|s| verify_secret(client_secret, &s.secret_hash))
            .ok_or(AuthError::InvalidClient)?;

        let secret_expires_at = secret.expires_at.map(|t| t.timestamp());
        let access_token = self
            .jwt
            .issue(&client.id, client.version, secret_expires_at)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        Ok(IssuedToken {
            access_token,
            token_type: "bearer",
            expires_in: self.jwt.ttl_seconds(),
            scope: None,
        })
    }
}
