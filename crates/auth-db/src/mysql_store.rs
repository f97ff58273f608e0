//! MySQL-backed implementation of `auth_core::services::store::Store`:
//! plain `sqlx::query`/`Row` extraction (no compile-time-checked macros,
//! since there is no `DATABASE_URL` available at workspace-build time),
//! structs built by hand from rows rather than derived `FromRow` so the
//! domain types in `auth-core` stay free of a `sqlx` dependency.

use auth_core::error::AuthError;
use auth_core::models::{Api, ApiScope, Client, ClientSecret, SecretStatus, Workspace};
use auth_core::services::store::{NewApiScope, RateLimitConfig, Store};
use auth_crypto::{generate_id, generate_secret_plaintext, hash_secret};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row};

pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    fn workspace_from_row(row: &sqlx::mysql::MySqlRow) -> Result<Workspace, AuthError> {
        Ok(Workspace {
            id: row.try_get("id").map_err(db_err)?,
            name: row.try_get("name").map_err(db_err)?,
            created_at: row.try_get("created_at").map_err(db_err)?,
            updated_at: row.try_get("updated_at").map_err(db_err)?,
        })
    }

    fn api_from_row(row: &sqlx::mysql::MySqlRow) -> Result<Api, AuthError> {
        Ok(Api {
            id: row.try_get("id").map_err(db_err)?,
            name: row.try_get("name").map_err(db_err)?,
            workspace_id: row.try_get("workspace_id").map_err(db_err)?,
            created_at: row.try_get("created_at").map_err(db_err)?,
            updated_at: row.try_get("updated_at").map_err(db_err)?,
        })
    }

    fn scope_from_row(row: &sqlx::mysql::MySqlRow) -> Result<ApiScope, AuthError> {
        Ok(ApiScope {
            id: row.try_get("id").map_err(db_err)?,
            name: row.try_get("name").map_err(db_err)?,
            description: row.try_get("description").map_err(db_err)?,
            api_id: row.try_get("api_id").map_err(db_err)?,
            created_at: row.try_get("created_at").map_err(db_err)?,
        })
    }

    fn client_from_row(row: &sqlx::mysql::MySqlRow) -> Result<Client, AuthError> {
        Ok(Client {
            id: row.try_get("id").map_err(db_err)?,
            name: row.try_get("name").map_err(db_err)?,
            version: row.try_get("version").map_err(db_err)?,
            workspace_id: row.try_get("workspace_id").map_err(db_err)?,
            for_workspace_id: row.try_get("for_workspace_id").map_err(db_err)?,
            api_id: row.try_get("api_id").map_err(db_err)?,
            rate_limit_bucket_size: row.try_get("rate_limit_bucket_size").map_err(db_err)?,
            rate_limit_refill_amount: row.try_get("rate_limit_refill_amount").map_err(db_err)?,
            rate_limit_refill_interval_ms: row
                .try_get("rate_limit_refill_interval_ms")
                .map_err(db_err)?,
            created_at: row.try_get("created_at").map_err(db_err)?,
        })
    }

    fn secret_from_row(row: &sqlx::mysql::MySqlRow) -> Result<ClientSecret, AuthError> {
        let status: String = row.try_get("status").map_err(db_err)?;
        Ok(ClientSecret {
            id: row.try_get("id").map_err(db_err)?,
            client_id: row.try_get("client_id").map_err(db_err)?,
            secret_hash: row.try_get("secret_hash").map_err(db_err)?,
            status: match status.as_str() {
                "active" => SecretStatus::Active,
                _ => SecretStatus::Inactive,
            },
            expires_at: row.try_get("expires_at").map_err(db_err)?,
            created_at: row.try_get("created_at").map_err(db_err)?,
        })
    }
}

fn db_err(e: sqlx::Error) -> AuthError {
    AuthError::Internal(e.to_string())
}

#[async_trait]
impl Store for MySqlStore {
    async fn get_client(&self, client_id: &str) -> Result<Option<Client>, AuthError> {
        let row = sqlx::query("SELECT * FROM clients WHERE id = ?")
            .bind(client_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        row.as_ref().map(Self::client_from_row).transpose()
    }

    async fn get_workspace(&self, workspace_id: &str) -> Result<Option<Workspace>, AuthError> {
        let row = sqlx::query("SELECT * FROM workspaces WHERE id = ?")
            .bind(workspace_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        row.as_ref().map(Self::workspace_from_row).transpose()
    }

    async fn get_api(&self, api_id: &str) -> Result<Option<Api>, AuthError> {
        let row = sqlx::query("SELECT * FROM apis WHERE id = ?")
            .bind(api_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        row.as_ref().map(Self::api_from_row).transpose()
    }

    async fn create_workspace(&self, name: &str) -> Result<Workspace, AuthError> {
        let id = generate_id("ws", 16).map_err(|e| AuthError::Internal(e.to_string()))?;
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO workspaces (id, name, created_at, updated_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(name)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(Workspace {
            id,
            name: name.to_string(),
            created_at: now,
            updated_at: now,
        })
    }

    async fn create_api(
        &self,
        workspace_id: &str,
        name: &str,
        scopes: Vec<NewApiScope>,
    ) -> Result<(Api, Vec<ApiScope>), AuthError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let api_id = generate_id("api", 16).map_err(|e| AuthError::Internal(e.to_string()))?;
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO apis (id, name, workspace_id, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&api_id)
        .bind(name)
        .bind(workspace_id)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        let mut created_scopes = Vec::with_capacity(scopes.len());
        for scope in scopes {
            let scope_id =
                generate_id("scope", 16).map_err(|e| AuthError::Internal(e.to_string()))?;

            sqlx::query(
                "INSERT INTO api_scopes (id, name, description, api_id, created_at) VALUES (?, ?, ?, ?, ?)",
            )
            .bind(&scope_id)
            .bind(&scope.name)
            .bind(&scope.description)
            .bind(&api_id)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

            created_scopes.push(ApiScope {
                id: scope_id,
                name: scope.name,
                description: scope.description,
                api_id: api_id.clone(),
                created_at: now,
            });
        }

        tx.commit().await.map_err(db_err)?;

        Ok((
            Api {
                id: api_id,
                name: name.to_string(),
                workspace_id: workspace_id.to_string(),
                created_at: now,
                updated_at: now,
            },
            created_scopes,
        ))
    }

    async fn create_root_client(
        &self,
        workspace_id: &str,
        for_workspace_id: &str,
        name: &str,
        api_id: &str,
    ) -> Result<(Client, String), AuthError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let client_id = generate_id("cli", 16).map_err(|e| AuthError::Internal(e.to_string()))?;
        let now = Utc::now();

        sqlx::query(
            r#"INSERT INTO clients
                (id, name, version, workspace_id, for_workspace_id, api_id,
                 rate_limit_bucket_size, rate_limit_refill_amount,
                 rate_limit_refill_interval_ms, created_at)
               VALUES (?, ?, 1, ?, ?, ?, NULL, NULL, NULL, ?)"#,
        )
        .bind(&client_id)
        .bind(name)
        .bind(workspace_id)
        .bind(for_workspace_id)
        .bind(api_id)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        let plaintext = generate_secret_plaintext();
        let secret_id = generate_id("sec", 16).map_err(|e| AuthError::Internal(e.to_string()))?;

        sqlx::query(
            r#"INSERT INTO client_secrets
                (id, client_id, secret_hash, status, expires_at, created_at)
               VALUES (?, ?, ?, 'active', NULL, ?)"#,
        )
        .bind(&secret_id)
        .bind(&client_id)
        .bind(hash_secret(&plaintext))
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;

        Ok((
            Client {
                id: client_id,
                name: name.to_string(),
                version: 1,
                workspace_id: workspace_id.to_string(),
                for_workspace_id: Some(for_workspace_id.to_string()),
                api_id: api_id.to_string(),
                rate_limit_bucket_size: None,
                rate_limit_refill_amount: None,
                rate_limit_refill_interval_ms: None,
                created_at: now,
            },
            plaintext,
        ))
    }

    async fn create_basic_client(
        &self,
        workspace_id: &str,
        name: &str,
        api_id: &str,
        rate_limit: Option<RateLimitConfig>,
    ) -> Result<(Client, String), AuthError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let client_id = generate_id("cli", 16).map_err(|e| AuthError::Internal(e.to_string()))?;
        let now = Utc::now();

        let (size, amount, interval) = match rate_limit {
            Some(cfg) => (
                Some(cfg.bucket_size),
                Some(cfg.refill_amount),
                Some(cfg.refill_interval_ms),
            ),
            None => (None, None, None),
        };

        sqlx::query(
            r#"INSERT INTO clients
                (id, name, version, workspace_id, for_workspace_id, api_id,
                 rate_limit_bucket_size, rate_limit_refill_amount,
                 rate_limit_refill_interval_ms, created_at)
               VALUES (?, ?, 1, ?, NULL, ?, ?, ?, ?, ?)"#,
        )
        .bind(&client_id)
        .bind(name)
        .bind(workspace_id)
        .bind(api_id)
        .bind(size)
        .bind(amount)
        .bind(interval)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        let plaintext = generate_secret_plaintext();
        let secret_id = generate_id("sec", 16).map_err(|e| AuthError::Internal(e.to_string()))?;

        sqlx::query(
            r#"INSERT INTO client_secrets
                (id, client_id, secret_hash, status, expires_at, created_at)
               VALUES (?, ?, ?, 'active', NULL, ?)"#,
        )
        .bind(&secret_id)
        .bind(&client_id)
        .bind(hash_secret(&plaintext))
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;

        Ok((
            Client {
                id: client_id,
                name: name.to_string(),
                version: 1,
                workspace_id: workspace_id.to_string(),
                for_workspace_id: None,
                api_id: api_id.to_string(),
                rate_limit_bucket_size: size,
                rate_limit_refill_amount: amount,
                rate_limit_refill_interval_ms: interval,
                created_at: now,
            },
            plaintext,
        ))
    }

    async fn list_client_secrets(&self, client_id: &str) -> Result<Vec<ClientSecret>, AuthError> {
        let rows = sqlx::query("SELECT * FROM client_secrets WHERE client_id = ?")
            .bind(client_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        rows.iter().map(Self::secret_from_row).collect()
    }

    async fn list_verifying_client_secrets(
        &self,
        client_id: &str,
    ) -> Result<Vec<ClientSecret>, AuthError> {
        let rows = sqlx::query(
            "SELECT * FROM client_secrets WHERE client_id = ? \
             AND (expires_at IS NULL OR expires_at > ?)",
        )
        .bind(client_id)
        .bind(Utc::now())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(Self::secret_from_row).collect()
    }

    async fn get_client_secret_value(
        &self,
        secret_id: &str,
    ) -> Result<Option<String>, AuthError> {
        let row = sqlx::query("SELECT secret_hash FROM client_secrets WHERE id = ?")
            .bind(secret_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        row.map(|r| r.try_get::<String, _>("secret_hash").map_err(db_err))
            .transpose()
    }

    async fn rotate_client_secret(
        &self,
        client_id: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<(ClientSecret, String), AuthError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        // Select the outgoing secret by `expires_at IS NULL`, not by
        // insertion order, to stay safe against stale inactive rows.
        let old_row = sqlx::query(
            "SELECT id FROM client_secrets WHERE client_id = ? AND status = 'active' \
             AND expires_at IS NULL LIMIT 1",
        )
        .bind(client_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err)?
        .ok_or_else(|| AuthError::BadRequest {
            reason: "client has no current secret to rotate".to_string(),
        })?;
        let old_secret_id: String = old_row.try_get("id").map_err(db_err)?;

        let plaintext = generate_secret_plaintext();
        let new_secret_id = generate_id("sec", 16).map_err(|e| AuthError::Internal(e.to_string()))?;
        let now = Utc::now();

        sqlx::query(
            r#"INSERT INTO client_secrets
                (id, client_id, secret_hash, status, expires_at, created_at)
               VALUES (?, ?, ?, 'active', NULL, ?)"#,
        )
        .bind(&new_secret_id)
        .bind(client_id)
        .bind(hash_secret(&plaintext))
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        // `None` means "expire immediately at next verify", realized as
        // "already in the past" so a second NULL row is never written,
        // which would otherwise violate the at-most-one-current-secret
        // invariant.
        let old_expires_at = expires_at.unwrap_or(now);
        sqlx::query("UPDATE client_secrets SET expires_at = ?, status = 'inactive' WHERE id = ?")
            .bind(old_expires_at)
            .bind(&old_secret_id)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        sqlx::query("UPDATE clients SET version = version + 1 WHERE id = ?")
            .bind(client_id)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;

        Ok((
            ClientSecret {
                id: new_secret_id,
                client_id: client_id.to_string(),
                secret_hash: hash_secret(&plaintext),
                status: SecretStatus::Active,
                expires_at: None,
                created_at: now,
            },
            plaintext,
        ))
    }
}
