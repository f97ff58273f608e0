//! Configuration loading from various sources

use crate::config::AppConfig;
use config::{Config, ConfigError, Environment, File};
use std::path::Path;

pub struct ConfigLoader {
    config_dir: String,
    environment: String,
}

impl ConfigLoader {
    pub fn new(config_dir: impl Into<String>, environment: impl Into<String>) -> Self {
        Self {
            config_dir: config_dir.into(),
            environment: environment.into(),
        }
    }

    /// Layered load: `default` file -> `<environment>` file -> `local` file ->
    /// `AUTH__`-prefixed env vars -> the handful of bare env var names this
    /// service's original implementation used directly (`JWT_SECRET`,
    /// `INTERNAL_CLIENT_ID`, ...). The bare names win last so an operator can
    /// set them without learning the `AUTH__section__field` layout.
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        let mut builder = Config::builder();

        builder = builder.add_source(
            File::with_name(&format!("{}/default", self.config_dir)).required(false),
        );
        builder = builder.add_source(
            File::with_name(&format!("{}/{}", self.config_dir, self.environment))
                .required(false),
        );
        builder = builder
            .add_source(File::with_name(&format!("{}/local", self.config_dir)).required(false));
        builder = builder.add_source(
            Environment::with_prefix("AUTH")
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = builder.build()?.try_deserialize()?;
        Ok(Self::apply_bare_env_overrides(config))
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<AppConfig, ConfigError> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()?;
        config.try_deserialize()
    }

    fn apply_bare_env_overrides(mut config: AppConfig) -> AppConfig {
        if let Ok(v) = std::env::var("JWT_SECRET") {
            config.security.jwt_secret = secrecy::Secret::new(v);
        }
        if let Ok(v) = std::env::var("DATABASE_URL") {
            config.database.mysql_url = secrecy::Secret::new(v);
        }
        if let Ok(v) = std::env::var("REDIS_URL") {
            config.pubsub.redis_url = v;
        }
        if let Ok(v) = std::env::var("INTERNAL_CLIENT_ID") {
            config.internal.internal_client_id = v;
        }
        if let Ok(v) = std::env::var("INTERNAL_CLIENT_SECRET") {
            config.internal.internal_client_secret = secrecy::Secret::new(v);
        }
        if let Ok(v) = std::env::var("INTERNAL_API_ID") {
            config.internal.internal_api_id = v;
        }
        if let Ok(v) = std::env::var("INTERNAL_WORKSPACE_ID") {
            config.internal.internal_workspace_id = v;
        }
        if let Ok(v) = std::env::var("DEBUG") {
            config.logging.debug = v.eq_ignore_ascii_case("true") || v == "1";
        }
        config
    }
}
