//! Entry point: load configuration, build the MySQL pool and run pending
//! migrations, wire the domain services, spawn the pub/sub eviction
//! subscriber, and serve the HTTP router until SIGTERM/SIGINT.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use secrecy::ExposeSecret;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use auth_api::AppState;
use auth_cache::{ClientCache, InMemoryPubSub, Publisher, RedisPubSub, Subscription};
use auth_config::{AppConfig, ConfigLoader};
use auth_core::services::{run_eviction_subscriber, AdminService, Authorizer, BucketRegistry, TokenIssuer};
use auth_crypto::JwtCodec;
use auth_db::{create_mysql_pool, MySqlStore};
use auth_platform::{cancel_subscriber, shutdown_signal};

fn init_logging(config: &AppConfig) {
    let filter = tracing_subscriber::EnvFilter::try_new(&config.logging.level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);

    if config.logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Builds a live `Publisher` plus the background `Subscription` the eviction
/// loop drains. Falls back to the in-process broadcast implementation when
/// `redis_url` is empty, trading cross-process cache invalidation for a
/// dependency-free single-node deployment.
async fn build_pubsub(config: &AppConfig) -> Result<(Arc<dyn Publisher>, Box<dyn Subscription>)> {
    if config.pubsub.redis_url.is_empty() {
        info!("no redis_url configured, using in-process pub/sub");
        let pubsub = InMemoryPubSub::new();
        let subscription = Box::new(pubsub.subscribe());
        return Ok((Arc::new(pubsub), subscription));
    }

    let redis = RedisPubSub::new(&config.pubsub.redis_url).context("failed to open redis client")?;
    let subscription = redis
        .subscribe(&config.pubsub.channel)
        .await
        .context("failed to subscribe to the rotation channel")?;
    Ok((Arc::new(redis), Box::new(subscription)))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let loader = ConfigLoader::new(
        std::env::var("CONFIG_DIR").unwrap_or_else(|_| "config".to_string()),
        std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
    );
    let config = loader.load().context("failed to load configuration")?;

    init_logging(&config);
    info!(port = config.server.port, "starting optra-platform");

    let pool = create_mysql_pool(&config.database)
        .await
        .context("failed to connect to MySQL")?;
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("failed to run pending migrations")?;

    let store: Arc<dyn auth_core::services::Store> = Arc::new(MySqlStore::new(pool));
    let jwt = Arc::new(JwtCodec::new(
        config.security.jwt_secret.expose_secret(),
        config.security.access_token_ttl_seconds,
    ));
    let cache: ClientCache<auth_core::models::Client> = ClientCache::new();
    let buckets = BucketRegistry::new();

    let (publisher, subscription) = build_pubsub(&config).await?;

    let authorizer = Arc::new(Authorizer::new(
        Arc::clone(&jwt),
        Arc::clone(&store),
        cache,
        buckets,
        config.internal.internal_client_id.clone(),
    ));
    let issuer = Arc::new(TokenIssuer::new(Arc::clone(&jwt), Arc::clone(&store)));
    let admin = Arc::new(AdminService::new(
        Arc::clone(&store),
        publisher,
        config.pubsub.channel.clone(),
    ));

    let subscriber_handle = tokio::spawn(run_eviction_subscriber(Arc::clone(&authorizer), subscription));

    let state = AppState {
        authorizer,
        issuer,
        admin,
        internal_workspace_id: config.internal.internal_workspace_id.clone(),
        internal_api_id: config.internal.internal_api_id.clone(),
    };
    let app = auth_api::app(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    cancel_subscriber(&subscriber_handle);
    let _ = tokio::time::timeout(
        Duration::from_secs(config.server.shutdown_drain_seconds),
        subscriber_handle,
    )
    .await;

    info!("shutdown complete");
    Ok(())
}
