//! Administrative surface: workspace/API/client provisioning and secret
//! rotation. Every mutation here is logged at `info` with the actor and
//! target so operators can reconstruct who rotated what from the log
//! stream — this crate keeps no separate audit table.

use crate::error::AuthError;
use crate::models::{Api, ApiScope, Client, ClientSecret, Workspace};
use crate::services::store::{NewApiScope, RateLimitConfig, Store};
use auth_cache::{Envelope, Publisher};
use chrono::{DateTime, Utc};
use std::sync::Arc;

pub struct AdminService {
    store: Arc<dyn Store>,
    publisher: Arc<dyn Publisher>,
    channel: String,
}

impl AdminService {
    pub fn new(store: Arc<dyn Store>, publisher: Arc<dyn Publisher>, channel: String) -> Self {
        Self {
            store,
            publisher,
            channel,
        }
    }

    pub async fn create_workspace(&self, name: &str) -> Result<Workspace, AuthError> {
        let workspace = self.store.create_workspace(name).await?;
        tracing::info!(
            operation = "create_workspace",
            target_id = %workspace.id,
            "admin mutation"
        );
        Ok(workspace)
    }

    pub async fn create_root_client(
        &self,
        actor_client_id: &str,
        workspace_id: &str,
        for_workspace_id: &str,
        name: &str,
        api_id: &str,
    ) -> Result<(Client, String), AuthError> {
        let result = self
            .store
            .create_root_client(workspace_id, for_workspace_id, name, api_id)
            .await?;

        tracing::info!(
            actor_client_id,
            operation = "create_root_client",
            target_id = %result.0.id,
            "admin mutation"
        );
        Ok(result)
    }

    pub async fn create_api(
        &self,
        actor_client_id: &str,
        workspace_id: &str,
        name: &str,
        scopes: Vec<NewApiScope>,
    ) -> Result<(Api, Vec<ApiScope>), AuthError> {
        let result = self.store.create_api(workspace_id, name, scopes).await?;

        tracing::info!(
            actor_client_id,
            operation = "create_api",
            target_id = %result.0.id,
            "admin mutation"
        );
        Ok(result)
    }

    /// `caller` must be the root client for `workspace_id`; checked by the
    /// `RootPrincipal` extractor before this is ever called, but re-asserted
    /// here so the invariant holds regardless of call site.
    pub async fn create_client(
        &self,
        caller: &Client,
        name: &str,
        api_id: &str,
        rate_limit: Option<RateLimitConfig>,
    ) -> Result<(Client, String), AuthError> {
        let workspace_id = caller
            .for_workspace_id
            .clone()
            .ok_or_else(|| AuthError::Forbidden {
                reason: "caller is not a root client".to_string(),
            })?;

        let result = self
            .store
            .create_basic_client(&workspace_id, name, api_id, rate_limit)
            .await?;

        tracing::info!(
            actor_client_id = %caller.id,
            operation = "create_client",
            target_id = %result.0.id,
            "admin mutation"
        );
        Ok(result)
    }

    pub async fn get_client(
        &self,
        caller: &Client,
        client_id: &str,
    ) -> Result<Client, AuthError> {
        let target = self
            .store
            .get_client(client_id)
            .await?
            .ok_or_else(|| AuthError::NotFound {
                resource: "client".to_string(),
            })?;

        self.assert_owns(caller, &target)?;
        Ok(target)
    }

    /// Caller must be the root client whose `for_workspace_id` equals the
    /// target's `workspace_id`. The target must currently have exactly one
    /// still-verifying secret — `expires_at` unset, or set but still in the
    /// future. A client already inside a rotation's overlap window has two
    /// such rows (the current secret plus the not-yet-expired outgoing
    /// one) and must not be rotated again until that window closes, or the
    /// at-most-two-non-expired invariant would be violated. `status` alone
    /// can't detect this: the outgoing secret is marked `Inactive` the
    /// moment it's superseded, independent of whether it has expired yet.
    pub async fn rotate_secret(
        &self,
        caller: &Client,
        target_client_id: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<(ClientSecret, String), AuthError> {
        let target = self
            .store
            .get_client(target_client_id)
            .await?
            .ok_or_else(|| AuthError::NotFound {
                resource: "client".to_string(),
            })?;

        self.assert_owns(caller, &target)?;

        let verifying = self
            .store
            .list_verifying_client_secrets(target_client_id)
            .await?;
        if verifying.len() != 1 {
            return Err(AuthError::BadRequest {
                reason: "already rotated".to_string(),
            });
        }

        let (new_secret, plaintext) = self
            .store
            .rotate_client_secret(target_client_id, expires_at)
            .await?;

        tracing::info!(
            actor_client_id = %caller.id,
            operation = "rotate_secret",
            target_id = target_client_id,
            "admin mutation"
        );

        // Re-fetch: the published envelope must carry the post-rotation
        // `version`, not the stale pre-rotation record fetched above.
        if let Some(rotated) = self.store.get_client(target_client_id).await? {
            self.publish_rotation(&rotated);
        }
        Ok((new_secret, plaintext))
    }

    /// Cross-workspace resources are indistinguishable from missing ones —
    /// both answer 404, never 403, so a caller cannot probe for another
    /// workspace's client ids by status code alone.
    fn assert_owns(&self, caller: &Client, target: &Client) -> Result<(), AuthError> {
        if caller.for_workspace_id.as_deref() != Some(target.workspace_id.as_str()) {
            return Err(AuthError::NotFound {
                resource: "client".to_string(),
            });
        }
        Ok(())
    }

    /// Fire-and-forget, after commit: event delivery is advisory, a missed
    /// publish only delays cache invalidation until the next cache miss.
    fn publish_rotation(&self, client: &Client) {
        let publisher = Arc::clone(&self.publisher);
        let channel = self.channel.clone();
        let event_id = auth_crypto::generate_id("evt", 16).unwrap_or_else(|_| "evt_unknown".to_string());
        let envelope = Envelope::client_secret_rotated(client, &event_id);

        tokio::spawn(async move {
            if let Err(e) = publisher.publish(&channel, &envelope).await {
                tracing::warn!("failed to publish rotation event: {}", e);
            }
        });
    }
}
