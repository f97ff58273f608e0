//! Seeds the singleton internal workspace/API/client triple this service's
//! internal surface gates on (`INTERNAL_WORKSPACE_ID`, `INTERNAL_API_ID`,
//! `INTERNAL_CLIENT_ID`, `INTERNAL_CLIENT_SECRET`). Idempotent: running it
//! twice against an already-seeded database is a no-op, not an error.

use auth_config::ConfigLoader;
use auth_crypto::hash_secret;
use auth_db::create_mysql_pool;
use chrono::Utc;
use secrecy::ExposeSecret;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("seeding internal workspace...");

    let loader = ConfigLoader::new(
        std::env::var("CONFIG_DIR").unwrap_or_else(|_| "config".to_string()),
        std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
    );
    let config = loader.load()?;

    if config.internal.internal_client_id.is_empty() {
        return Err("INTERNAL_CLIENT_ID is not configured".into());
    }

    let pool = create_mysql_pool(&config.database).await?;
    let now = Utc::now();

    sqlx::query(
        "INSERT IGNORE INTO workspaces (id, name, created_at, updated_at) VALUES (?, 'internal', ?, ?)",
    )
    .bind(&config.internal.internal_workspace_id)
    .bind(now)
    .bind(now)
    .execute(&pool)
    .await?;

    sqlx::query(
        "INSERT IGNORE INTO apis (id, name, workspace_id, created_at, updated_at) VALUES (?, 'internal', ?, ?, ?)",
    )
    .bind(&config.internal.internal_api_id)
    .bind(&config.internal.internal_workspace_id)
    .bind(now)
    .bind(now)
    .execute(&pool)
    .await?;

    let inserted = sqlx::query(
        r#"INSERT IGNORE INTO clients
            (id, name, version, workspace_id, for_workspace_id, api_id,
             rate_limit_bucket_size, rate_limit_refill_amount,
             rate_limit_refill_interval_ms, created_at)
           VALUES (?, 'internal', 1, ?, NULL, ?, NULL, NULL, NULL, ?)"#,
    )
    .bind(&config.internal.internal_client_id)
    .bind(&config.internal.internal_workspace_id)
    .bind(&config.internal.internal_api_id)
    .bind(now)
    .execute(&pool)
    .await?;

    if inserted.rows_affected() == 0 {
        println!("internal client already seeded, nothing to do");
        return Ok(());
    }

    let secret_id = auth_crypto::generate_id("sec", 16)?;
    let secret_hash = hash_secret(config.internal.internal_client_secret.expose_secret());

    sqlx::query(
        r#"INSERT INTO client_secrets
            (id, client_id, secret_hash, status, expires_at, created_at)
           VALUES (?, ?, ?, 'active', NULL, ?)"#,
    )
    .bind(&secret_id)
    .bind(&config.internal.internal_client_id)
    .bind(&secret_hash)
    .bind(now)
    .execute(&pool)
    .await?;

    println!("internal workspace seeded");
    Ok(())
}
