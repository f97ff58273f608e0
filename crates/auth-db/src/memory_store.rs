//! In-memory `Store` fake used by the test harness: a
//! `tokio::sync::Mutex`-guarded set of `HashMap`s behind the same trait the
//! MySQL implementation satisfies.

use auth_core::error::AuthError;
use auth_core::models::{Api, ApiScope, Client, ClientSecret, SecretStatus, Workspace};
use auth_core::services::store::{NewApiScope, RateLimitConfig, Store};
use auth_crypto::{generate_id, generate_secret_plaintext, hash_secret};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::Mutex;

#[derive(Default)]
struct Tables {
    workspaces: HashMap<String, Workspace>,
    apis: HashMap<String, Api>,
    scopes: HashMap<String, Vec<ApiScope>>,
    clients: HashMap<String, Client>,
    secrets: HashMap<String, Vec<ClientSecret>>,
}

pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
        }
    }

    /// Test helper: seeds a client with a known secret, bypassing the
    /// normal creation path so tests can pin the plaintext they verify
    /// against.
    pub async fn seed_client(&self, client: Client, secret: ClientSecret) {
        let mut tables = self.tables.lock().await;
        tables.clients.insert(client.id.clone(), client.clone());
        tables.secrets.entry(client.id).or_default().push(secret);
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn get_client(&self, client_id: &str) -> Result<Option<Client>, AuthError> {
        Ok(self.tables.lock().await.clients.get(client_id).cloned())
    }

    async fn get_workspace(&self, workspace_id: &str) -> Result<Option<Workspace>, AuthError> {
        Ok(self
            .tables
            .lock()
            .await
            .workspaces
            .get(workspace_id)
            .cloned())
    }

    async fn get_api(&self, api_id: &str) -> Result<Option<Api>, AuthError> {
        Ok(self.tables.lock().await.apis.get(api_id).cloned())
    }

    async fn create_workspace(&self, name: &str) -> Result<Workspace, AuthError> {
        let id = generate_id("ws", 16).map_err(|e| AuthError::Internal(e.to_string()))?;
        let now = Utc::now();
        let workspace = Workspace {
            id: id.clone(),
            name: name.to_string(),
            created_at: now,
            updated_at: now,
        };

        self.tables
            .lock()
            .await
            .workspaces
            .insert(id, workspace.clone());
        Ok(workspace)
    }

    async fn create_api(
        &self,
        workspace_id: &str,
        name: &str,
        scopes: Vec<NewApiScope>,
    ) -> Result<(Api, Vec<ApiScope>), AuthError> {
        let id = generate_id("api", 16).map_err(|e| AuthError::Internal(e.to_string()))?;
        let now = Utc::now();
        let api = Api {
            id: id.clone(),
            name: name.to_string(),
            workspace_id: workspace_id.to_string(),
            created_at: now,
            updated_at: now,
        };

        let mut created = Vec::with_capacity(scopes.len());
        for scope in scopes {
            let scope_id =
                generate_id("scope", 16).map_err(|e| AuthError::Internal(e.to_string()))?;
            created.push(ApiScope {
                id: scope_id,
                name: scope.name,
                description: scope.description,
                api_id: id.clone(),
                created_at: now,
            });
        }

        let mut tables = self.tables.lock().await;
        tables.apis.insert(id.clone(), api.clone());
        tables.scopes.insert(id, created.clone());
        Ok((api, created))
    }

    async fn create_root_client(
        &self,
        workspace_id: &str,
        for_workspace_id: &str,
        name: &str,
        api_id: &str,
    ) -> Result<(Client, String), AuthError> {
        let id = generate_id("cli", 16).map_err(|e| AuthError::Internal(e.to_string()))?;
        let now = Utc::now();
        let client = Client {
            id: id.clone(),
            name: name.to_string(),
            version: 1,
            workspace_id: workspace_id.to_string(),
            for_workspace_id: Some(for_workspace_id.to_string()),
            api_id: api_id.to_string(),
            rate_limit_bucket_size: None,
            rate_limit_refill_amount: None,
            rate_limit_refill_interval_ms: None,
            created_at: now,
        };

        let plaintext = self.insert_initial_secret(&id, now).await?;
        self.tables.lock().await.clients.insert(id, client.clone());
        Ok((client, plaintext))
    }

    async fn create_basic_client(
        &self,
        workspace_id: &str,
        name: &str,
        api_id: &str,
        rate_limit: Option<RateLimitConfig>,
    ) -> Result<(Client, String), AuthError> {
        let id = generate_id("cli", 16).map_err(|e| AuthError::Internal(e.to_string()))?;
        let now = Utc::now();
        let (size, amount, interval) = match rate_limit {
            Some(cfg) => (
                Some(cfg.bucket_size),
                Some(cfg.refill_amount),
                Some(cfg.refill_interval_ms),
            ),
            None => (None, None, None),
        };
        let client = Client {
            id: id.clone(),
            name: name.to_string(),
            version: 1,
            workspace_id: workspace_id.to_string(),
            for_workspace_id: None,
            api_id: api_id.to_string(),
            rate_limit_bucket_size: size,
            rate_limit_refill_amount: amount,
            rate_limit_refill_interval_ms: interval,
            created_at: now,
        };

        let plaintext = self.insert_initial_secret(&id, now).await?;
        self.tables.lock().await.clients.insert(id, client.clone());
        Ok((client, plaintext))
    }

    async fn list_client_secrets(&self, client_id: &str) -> Result<Vec<ClientSecret>, AuthError> {
        Ok(self
            .tables
            .lock()
            .await
            .secrets
            .get(client_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_verifying_client_secrets(
        &self,
        client_id: &str,
    ) -> Result<Vec<ClientSecret>, AuthError> {
        let now = Utc::now();
        Ok(self
            .tables
            .lock()
            .await
            .secrets
            .get(client_id)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter(|s| s.expires_at.map(|exp| exp > now).unwrap_or(true))
            .collect())
    }

    async fn get_client_secret_value(
        &self,
        secret_id: &str,
    ) -> Result<Option<String>, AuthError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .secrets
            .values()
            .flatten()
            .find(|s| s.id == secret_id)
            .map(|s| s.secret_hash.clone()))
    }

    async fn rotate_client_secret(
        &self,
        client_id: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<(ClientSecret, String), AuthError> {
        let mut tables = self.tables.lock().await;

        let secrets = tables
            .secrets
            .get_mut(client_id)
            .ok_or_else(|| AuthError::BadRequest {
                reason: "client has no current secret to rotate".to_string(),
            })?;

        let current = secrets
            .iter_mut()
            .find(|s| s.status == SecretStatus::Active && s.expires_at.is_none())
            .ok_or_else(|| AuthError::BadRequest {
                reason: "client has no current secret to rotate".to_string(),
            })?;
        current.status = SecretStatus::Inactive;
        // `None` means "expire immediately at next verify", realized as
        // "already in the past" rather than storing a literal NULL — a
        // second NULL row would violate the at-most-one-current-secret
        // invariant.
        current.expires_at = Some(expires_at.unwrap_or_else(Utc::now));

        let plaintext = generate_secret_plaintext();
        let new_secret = ClientSecret {
            id: generate_id("sec", 16).map_err(|e| AuthError::Internal(e.to_string()))?,
            client_id: client_id.to_string(),
            secret_hash: hash_secret(&plaintext),
            status: SecretStatus::Active,
            expires_at: None,
            created_at: Utc::now(),
        };
        secrets.push(new_secret.clone());

        if let Some(client) = tables.clients.get_mut(client_id) {
            client.version += 1;
        }

        Ok((new_secret, plaintext))
    }
}

impl InMemoryStore {
    async fn insert_initial_secret(
        &self,
        client_id: &str,
        now: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let plaintext = generate_secret_plaintext();
        let secret = ClientSecret {
            id: generate_id("sec", 16).map_err(|e| AuthError::Internal(e.to_string()))?,
            client_id: client_id.to_string(),
            secret_hash: hash_secret(&plaintext),
            status: SecretStatus::Active,
            expires_at: None,
            created_at: now,
        };
        self.tables
            .lock()
            .await
            .secrets
            .insert(client_id.to_string(), vec![secret]);
        Ok(plaintext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn creates_basic_client_with_a_single_active_secret() {
        let store = InMemoryStore::new();
        let ws = store.create_workspace("acme").await.unwrap();
        let (api, _scopes) = store.create_api(&ws.id, "billing", vec![]).await.unwrap();

        let (client, plaintext) = store
            .create_basic_client(&ws.id, "worker-1", &api.id, None)
            .await
            .unwrap();

        assert_eq!(client.version, 1);
        assert!(!plaintext.is_empty());

        let secrets = store.list_client_secrets(&client.id).await.unwrap();
        assert_eq!(secrets.len(), 1);
        assert_eq!(secrets[0].status, SecretStatus::Active);
    }

    #[tokio::test]
    async fn rotation_bumps_version_and_keeps_two_rows_during_overlap() {
        let store = InMemoryStore::new();
        let ws = store.create_workspace("acme").await.unwrap();
        let (api, _) = store.create_api(&ws.id, "billing", vec![]).await.unwrap();
        let (client, _) = store
            .create_basic_client(&ws.id, "worker-1", &api.id, None)
            .await
            .unwrap();

        let grace = Utc::now() + chrono::Duration::hours(1);
        let (new_secret, new_plaintext) = store
            .rotate_client_secret(&client.id, Some(grace))
            .await
            .unwrap();

        assert!(!new_plaintext.is_empty());
        assert!(new_secret.expires_at.is_none());

        let verifying = store
            .list_verifying_client_secrets(&client.id)
            .await
            .unwrap();
        assert_eq!(verifying.len(), 2);

        let refreshed = store.get_client(&client.id).await.unwrap().unwrap();
        assert_eq!(refreshed.version, 2);
    }

    /// The store itself has no "already rotated" concept — each call just
    /// rotates whichever row is currently `expires_at.is_none()`, so a
    /// second direct call succeeds again. The one-rotation-at-a-time rule is
    /// `AdminService`'s guard, not the store's; see
    /// `auth_core::services::admin::tests::rotating_during_an_open_overlap_window_is_rejected`.
    #[tokio::test]
    async fn rotating_twice_in_a_row_rotates_the_newest_current_secret_each_time() {
        let store = InMemoryStore::new();
        let ws = store.create_workspace("acme").await.unwrap();
        let (api, _) = store.create_api(&ws.id, "billing", vec![]).await.unwrap();
        let (client, _) = store
            .create_basic_client(&ws.id, "worker-1", &api.id, None)
            .await
            .unwrap();

        store.rotate_client_secret(&client.id, None).await.unwrap();
        let (second_secret, second_plaintext) =
            store.rotate_client_secret(&client.id, None).await.unwrap();

        assert!(!second_plaintext.is_empty());
        assert!(second_secret.expires_at.is_none());

        let refreshed = store.get_client(&client.id).await.unwrap().unwrap();
        assert_eq!(refreshed.version, 3);
    }
}
