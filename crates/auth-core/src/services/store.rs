//! The storage gateway contract. One implementation (`auth-db::MySqlStore`)
//! talks to MySQL; an in-memory fake backs the test harness. Generalized
//! from the teacher's `UserStore`/`RefreshTokenStore` trait-object pattern.

use crate::error::AuthError;
use crate::models::{Api, ApiScope, Client, ClientSecret, Workspace};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct NewApiScope {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub bucket_size: i64,
    pub refill_amount: i64,
    pub refill_interval_ms: i64,
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn get_client(&self, client_id: &str) -> Result<Option<Client>, AuthError>;
    async fn get_workspace(&self, workspace_id: &str) -> Result<Option<Workspace>, AuthError>;
    async fn get_api(&self, api_id: &str) -> Result<Option<Api>, AuthError>;

    async fn create_workspace(&self, name: &str) -> Result<Workspace, AuthError>;

    /// Atomic with its scope rows.
    async fn create_api(
        &self,
        workspace_id: &str,
        name: &str,
        scopes: Vec<NewApiScope>,
    ) -> Result<(Api, Vec<ApiScope>), AuthError>;

    /// Atomic with the initial active secret. Returns the secret's plaintext
    /// once — it is never retrievable again after this call returns.
    async fn create_root_client(
        &self,
        workspace_id: &str,
        for_workspace_id: &str,
        name: &str,
        api_id: &str,
    ) -> Result<(Client, String), AuthError>;

    /// Atomic with the initial active secret. `rate_limit` must be either
    /// fully present or fully absent — callers enforce the all-or-none rule
    /// before reaching the store.
    async fn create_basic_client(
        &self,
        workspace_id: &str,
        name: &str,
        api_id: &str,
        rate_limit: Option<RateLimitConfig>,
    ) -> Result<(Client, String), AuthError>;

    async fn list_client_secrets(&self, client_id: &str) -> Result<Vec<ClientSecret>, AuthError>;

    /// Every secret that still verifies at issuance time: the current
    /// secret (`expires_at` unset) plus, during a rotation's overlap
    /// window, the outgoing secret (`expires_at` set and still in the
    /// future) — independent of `status`, which only tracks which row is
    /// administratively "current". Once `expires_at` passes, a row simply
    /// stops being returned here.
    async fn list_verifying_client_secrets(
        &self,
        client_id: &str,
    ) -> Result<Vec<ClientSecret>, AuthError>;

    async fn get_client_secret_value(
        &self,
        secret_id: &str,
    ) -> Result<Option<String>, AuthError>;

    /// Inserts the new active secret, expires the previous active secret
    /// (selecting the row where `expires_at IS NULL`, not by insertion
    /// order), and bumps `client.version` — atomically, in one transaction.
    /// Returns the new secret's plaintext once.
    async fn rotate_client_secret(
        &self,
        client_id: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<(ClientSecret, String), AuthError>;
}
