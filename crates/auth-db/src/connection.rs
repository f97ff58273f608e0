//! MySQL pool construction, driven entirely by `DatabaseConfig` rather
//! than a hardcoded pool size.

use anyhow::Result;
use auth_config::DatabaseConfig;
use secrecy::ExposeSecret;
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};
use sqlx::{MySql, Pool};
use std::time::Duration;

pub async fn create_mysql_pool(config: &DatabaseConfig) -> Result<Pool<MySql>> {
    let options = config
        .mysql_url
        .expose_secret()
        .parse::<MySqlConnectOptions>()?;

    let pool = MySqlPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connection_timeout))
        .idle_timeout(Some(Duration::from_secs(config.idle_timeout)))
        .max_lifetime(Some(Duration::from_secs(config.max_lifetime)))
        .test_before_acquire(true)
        .connect_with(options)
        .await?;

    Ok(pool)
}
