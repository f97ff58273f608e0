//! HS256 JWT issuance and verification for client-credentials access tokens.

use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum JwtError {
    #[error("malformed or undecodable token")]
    BadJwt,
    #[error("token expired")]
    Expired,
    #[error("invalid token signature")]
    InvalidSignature,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JwtClaims {
    /// Client id the token was issued for.
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    /// Client secret version active when the token was issued.
    pub version: i64,
    /// Expiry of the secret used to sign this token, if it has one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_expires_at: Option<i64>,
}

pub struct JwtCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_seconds: i64,
}

impl JwtCodec {
    pub fn new(secret: &str, ttl_seconds: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl_seconds,
        }
    }

    /// Mints an access token `{sub, iat, exp, version, secret_expires_at}`
    /// with `exp - iat` equal to the configured TTL (24h by default).
    pub fn issue(
        &self,
        client_id: &str,
        version: i64,
        secret_expires_at: Option<i64>,
    ) -> Result<String, JwtError> {
        let now = Utc::now().timestamp();
        let claims = JwtClaims {
            sub: client_id.to_string(),
            iat: now,
            exp: now + self.ttl_seconds,
            version,
            secret_expires_at,
        };

        encode(&Header::new(jsonwebtoken::Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|_| JwtError::BadJwt)
    }

    /// Verifies signature and expiry, classifying failures into the three
    /// outcomes the authorizers switch on. Anything the library reports that
    /// isn't an expired-signature or bad-signature error collapses to
    /// `BadJwt` — there is no silent default beyond that documented rule.
    pub fn verify(&self, token: &str) -> Result<JwtClaims, JwtError> {
        let mut validation = Validation::new(jsonwebtoken::Algorithm::HS256);
        validation.validate_exp = true;
        validation.required_spec_claims.clear();

        decode::<JwtClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
                jsonwebtoken::errors::ErrorKind::InvalidSignature => JwtError::InvalidSignature,
                _ => JwtError::BadJwt,
            })
    }

    pub fn ttl_seconds(&self) -> i64 {
        self.ttl_seconds
    }
}
