//! The authorizer trio: internal, root, and basic. Generalized from the
//! teacher's `middleware::auth::jwt_auth` redirect-based middleware into
//! plain async methods that `auth-api`'s extractors call directly.

use crate::error::{AuthError, InvalidReason};
use crate::models::Client;
use crate::services::token_bucket::BucketRegistry;
use auth_cache::ClientCache;
use auth_crypto::jwt::{JwtClaims, JwtError};
use auth_crypto::JwtCodec;
use std::sync::Arc;

use super::store::Store;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct BasicVerification {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<InvalidReason>,
}

impl BasicVerification {
    fn valid() -> Self {
        Self {
            valid: true,
            reason: None,
        }
    }

    fn invalid(reason: InvalidReason) -> Self {
        Self {
            valid: false,
            reason: Some(reason),
        }
    }
}

fn jwt_error_reason(err: JwtError) -> InvalidReason {
    match err {
        JwtError::Expired => InvalidReason::Expired,
        JwtError::InvalidSignature => InvalidReason::InvalidSignature,
        JwtError::BadJwt => InvalidReason::BadJwt,
    }
}

/// Shared by all three authorizers: `None` means the claims still match the
/// client's current state.
fn version_and_expiry_reason(claims: &JwtClaims, client: &Client) -> Option<InvalidReason> {
    if claims.version != client.version {
        return Some(InvalidReason::VersionMismatch);
    }
    if let Some(expires_at) = claims.secret_expires_at {
        if expires_at <= chrono::Utc::now().timestamp() {
            return Some(InvalidReason::SecretExpired);
        }
    }
    None
}

pub struct Authorizer {
    jwt: Arc<JwtCodec>,
    store: Arc<dyn Store>,
    cache: ClientCache<Client>,
    buckets: BucketRegistry,
    internal_client_id: String,
}

impl Authorizer {
    pub fn new(
        jwt: Arc<JwtCodec>,
        store: Arc<dyn Store>,
        cache: ClientCache<Client>,
        buckets: BucketRegistry,
        internal_client_id: String,
    ) -> Self {
        Self {
            jwt,
            store,
            cache,
            buckets,
            internal_client_id,
        }
    }

    fn decode(&self, token: &str) -> Result<JwtClaims, AuthError> {
        self.jwt.verify(token).map_err(|e| AuthError::NotAuthenticated {
            reason: Some(jwt_error_reason(e)),
        })
    }

    /// `payload.sub` must equal the configured internal client id; the
    /// client is always fetched fresh (never cached) so a just-rotated
    /// secret is honored immediately.
    pub async fn authorize_internal(&self, token: &str) -> Result<JwtClaims, AuthError> {
        let claims = self.decode(token)?;

        if claims.sub != self.internal_client_id {
            return Err(AuthError::Forbidden {
                reason: "not the internal client".to_string(),
            });
        }

        let client = self
            .store
            .get_client(&claims.sub)
            .await?
            .ok_or(AuthError::NotAuthenticated {
                reason: Some(InvalidReason::NotFound),
            })?;

        self.check_version_and_expiry(&claims, &client)?;
        Ok(claims)
    }

    /// Structural gate: `sub` must resolve to an existing client with
    /// `for_workspace_id` set.
    pub async fn authorize_root(&self, token: &str) -> Result<(JwtClaims, Client), AuthError> {
        let claims = self.decode(token)?;

        let client = self
            .store
            .get_client(&claims.sub)
            .await?
            .ok_or(AuthError::Forbidden {
                reason: "unknown client".to_string(),
            })?;

        if !client.is_root() {
            return Err(AuthError::Forbidden {
                reason: "not a root client".to_string(),
            });
        }

        self.check_version_and_expiry(&claims, &client)?;
        Ok((claims, client))
    }

    fn check_version_and_expiry(&self, claims: &JwtClaims, client: &Client) -> Result<(), AuthError> {
        match version_and_expiry_reason(claims, client) {
            Some(reason) => Err(AuthError::NotAuthenticated {
                reason: Some(reason),
            }),
            None => Ok(()),
        }
    }

    /// Never fails: bad tokens, unknown clients, and rate limiting all
    /// answer with `{valid: false, reason}` rather than an HTTP error.
    pub async fn authorize_basic(&self, token: &str) -> Result<BasicVerification, AuthError> {
        let claims = match self.jwt.verify(token) {
            Ok(claims) => claims,
            Err(JwtError::Expired) => return Ok(BasicVerification::invalid(InvalidReason::Expired)),
            Err(JwtError::InvalidSignature) => {
                return Ok(BasicVerification::invalid(InvalidReason::InvalidSignature))
            }
            Err(JwtError::BadJwt) => return Ok(BasicVerification::invalid(InvalidReason::BadJwt)),
        };

        let client = match self.cache.get(&claims.sub) {
            Some(client) => client,
            None => match self.store.get_client(&claims.sub).await? {
                Some(client) => {
                    self.cache.insert(claims.sub.clone(), client.clone());
                    client
                }
                None => return Ok(BasicVerification::invalid(InvalidReason::NotFound)),
            },
        };

        if let Some(reason) = version_and_expiry_reason(&claims, &client) {
            return Ok(BasicVerification::invalid(reason));
        }

        let (size, refill_amount, refill_interval_ms) = match (
            client.rate_limit_bucket_size,
            client.rate_limit_refill_amount,
            client.rate_limit_refill_interval_ms,
        ) {
            (Some(size), Some(amount), Some(interval)) => (size, amount, interval),
            _ => return Ok(BasicVerification::valid()),
        };

        let bucket = self
            .buckets
            .get_or_create(&client.id, size, refill_amount, refill_interval_ms);

        if !bucket.try_consume(1) {
            tracing::info!(client_id = %client.id, "rate limit exceeded");
            return Ok(BasicVerification::invalid(InvalidReason::RateLimitExceeded));
        }

        Ok(BasicVerification::valid())
    }

    pub fn invalidate_cache(&self, client_id: &str) {
        self.cache.invalidate(client_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Api, ApiScope, ClientSecret, SecretStatus, Workspace};
    use crate::services::store::{NewApiScope, RateLimitConfig};
    use async_trait::async_trait;
    use chrono::Utc;

    struct FakeStore {
        client: Option<Client>,
    }

    #[async_trait]
    impl Store for FakeStore {
        async fn get_client(&self, client_id: &str) -> Result<Option<Client>, AuthError> {
            Ok(self
                .client
                .clone()
                .filter(|c| c.id == client_id))
        }
        async fn get_workspace(&self, _workspace_id: &str) -> Result<Option<Workspace>, AuthError> {
            unimplemented!()
        }
        async fn get_api(&self, _api_id: &str) -> Result<Option<Api>, AuthError> {
            unimplemented!()
        }
        async fn create_workspace(&self, _name: &str) -> Result<Workspace, AuthError> {
            unimplemented!()
        }
        async fn create_api(
            &self,
            _workspace_id: &str,
            _name: &str,
            _scopes: Vec<NewApiScope>,
        ) -> Result<(Api, Vec<ApiScope>), AuthError> {
            unimplemented!()
        }
        async fn create_root_client(
            &self,
            _workspace_id: &str,
            _for_workspace_id: &str,
            _name: &str,
            _api_id: &str,
        ) -> Result<(Client, String), AuthError> {
            unimplemented!()
        }
        async fn create_basic_client(
            &self,
            _workspace_id: &str,
            _name: &str,
            _api_id: &str,
            _rate_limit: Option<RateLimitConfig>,
        ) -> Result<(Client, String), AuthError> {
            unimplemented!()
        }
        async fn list_client_secrets(&self, _client_id: &str) -> Result<Vec<ClientSecret>, AuthError> {
            unimplemented!()
        }
        async fn list_verifying_client_secrets(
            &self,
            _client_id: &str,
        ) -> Result<Vec<ClientSecret>, AuthError> {
            unimplemented!()
        }
        async fn get_client_secret_value(&self, _secret_id: &str) -> Result<Option<String>, AuthError> {
            unimplemented!()
        }
        async fn rotate_client_secret(
            &self,
            _client_id: &str,
            _expires_at: Option<chrono::DateTime<Utc>>,
        ) -> Result<(ClientSecret, String), AuthError> {
            unimplemented!()
        }
    }

    fn internal_client() -> Client {
        Client {
            id: "cli_internal".to_string(),
            name: "internal".to_string(),
            version: 1,
            workspace_id: "ws_root".to_string(),
            for_workspace_id: None,
            api_id: "api_root".to_string(),
            rate_limit_bucket_size: None,
            rate_limit_refill_amount: None,
            rate_limit_refill_interval_ms: None,
            created_at: Utc::now(),
        }
    }

    fn fixture(client: Option<Client>) -> (Arc<JwtCodec>, Authorizer) {
        let jwt = Arc::new(JwtCodec::new("test-signing-secret-value", 86_400));
        let store: Arc<dyn Store> = Arc::new(FakeStore { client });
        let authorizer = Authorizer::new(
            Arc::clone(&jwt),
            store,
            ClientCache::new(),
            BucketRegistry::new(),
            "cli_internal".to_string(),
        );
        (jwt, authorizer)
    }

    #[tokio::test]
    async fn internal_authorizer_accepts_the_configured_internal_client() {
        let client = internal_client();
        let (jwt, authorizer) = fixture(Some(client.clone()));
        let token = jwt.issue(&client.id, client.version, None).unwrap();

        let claims = authorizer.authorize_internal(&token).await.expect("should authorize");
        assert_eq!(claims.sub, client.id);
    }

    #[tokio::test]
    async fn internal_authorizer_rejects_a_non_internal_subject() {
        let mut other = internal_client();
        other.id = "cli_other".to_string();
        let (jwt, authorizer) = fixture(Some(other.clone()));
        let token = jwt.issue(&other.id, other.version, None).unwrap();

        let err = authorizer.authorize_internal(&token).await.unwrap_err();
        assert!(matches!(err, AuthError::Forbidden { .. }));
    }

    #[tokio::test]
    async fn internal_authorizer_reports_version_mismatch() {
        let client = internal_client();
        let (jwt, authorizer) = fixture(Some(client.clone()));
        let stale_token = jwt.issue(&client.id, 0, None).unwrap();

        let err = authorizer.authorize_internal(&stale_token).await.unwrap_err();
        assert!(matches!(
            err,
            AuthError::NotAuthenticated {
                reason: Some(InvalidReason::VersionMismatch)
            }
        ));
    }

    #[tokio::test]
    async fn internal_authorizer_reports_secret_expired() {
        let client = internal_client();
        let (jwt, authorizer) = fixture(Some(client.clone()));
        let past = Utc::now().timestamp() - 60;
        let token = jwt.issue(&client.id, client.version, Some(past)).unwrap();

        let err = authorizer.authorize_internal(&token).await.unwrap_err();
        assert!(matches!(
            err,
            AuthError::NotAuthenticated {
                reason: Some(InvalidReason::SecretExpired)
            }
        ));
    }

    #[tokio::test]
    async fn root_authorizer_rejects_a_basic_client() {
        let mut client = internal_client();
        client.id = "cli_basic".to_string();
        client.for_workspace_id = None;
        let (jwt, authorizer) = fixture(Some(client.clone()));
        let token = jwt.issue(&client.id, client.version, None).unwrap();

        let err = authorizer.authorize_root(&token).await.unwrap_err();
        assert!(matches!(err, AuthError::Forbidden { .. }));
    }

    #[tokio::test]
    async fn root_authorizer_accepts_a_client_with_for_workspace_id_set() {
        let mut client = internal_client();
        client.id = "cli_root".to_string();
        client.for_workspace_id = Some("ws_target".to_string());
        let (jwt, authorizer) = fixture(Some(client.clone()));
        let token = jwt.issue(&client.id, client.version, None).unwrap();

        let (claims, resolved) = authorizer.authorize_root(&token).await.expect("should authorize");
        assert_eq!(claims.sub, client.id);
        assert_eq!(resolved.id, client.id);
    }

    #[tokio::test]
    async fn basic_authorizer_never_returns_an_http_error_for_an_unknown_client() {
        let (jwt, authorizer) = fixture(None);
        let token = jwt.issue("cli_ghost", 1, None).unwrap();

        let verification = authorizer.authorize_basic(&token).await.expect("never throws");
        assert!(!verification.valid);
        assert_eq!(verification.reason, Some(InvalidReason::NotFound));
    }

    #[tokio::test]
    async fn basic_authorizer_reports_expired_tokens() {
        let (jwt, authorizer) = fixture(None);
        let expired_jwt = JwtCodec::new("test-signing-secret-value", -1);
        let token = expired_jwt.issue("cli_ghost", 1, None).unwrap();

        let verification = authorizer.authorize_basic(&token).await.expect("never throws");
        assert!(!verification.valid);
        assert_eq!(verification.reason, Some(InvalidReason::Expired));
    }

    #[tokio::test]
    async fn basic_authorizer_reports_version_mismatch_for_a_known_client() {
        let client = internal_client();
        let (jwt, authorizer) = fixture(Some(client.clone()));
        let stale_token = jwt.issue(&client.id, 0, None).unwrap();

        let verification = authorizer.authorize_basic(&stale_token).await.expect("never throws");
        assert!(!verification.valid);
        assert_eq!(verification.reason, Some(InvalidReason::VersionMismatch));
    }

    #[tokio::test]
    async fn basic_authorizer_is_valid_with_no_rate_limit_configured() {
        let client = internal_client();
        let (jwt, authorizer) = fixture(Some(client.clone()));
        let token = jwt.issue(&client.id, client.version, None).unwrap();

        let verification = authorizer.authorize_basic(&token).await.expect("never throws");
        assert!(verification.valid);
        assert!(verification.reason.is_none());
    }

    #[tokio::test]
    async fn basic_authorizer_enforces_the_rate_limit() {
        let mut client = internal_client();
        client.id = "cli_limited".to_string();
        client.rate_limit_bucket_size = Some(1);
        client.rate_limit_refill_amount = Some(1);
        client.rate_limit_refill_interval_ms = Some(60_000);
        let (jwt, authorizer) = fixture(Some(client.clone()));
        let token = jwt.issue(&client.id, client.version, None).unwrap();

        let first = authorizer.authorize_basic(&token).await.unwrap();
        assert!(first.valid);

        let second = authorizer.authorize_basic(&token).await.unwrap();
        assert!(!second.valid);
        assert_eq!(second.reason, Some(InvalidReason::RateLimitExceeded));
    }
}
