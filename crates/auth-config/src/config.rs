//! Core configuration structures

use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub pubsub: PubSubConfig,
    pub internal: InternalPrincipalConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ServerConfig {
    #[validate(range(min = 1, max = 65535))]
    pub port: u16,
    pub host: String,
    pub shutdown_drain_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DatabaseConfig {
    #[serde(skip_serializing)]
    pub mysql_url: secrecy::Secret<String>,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connection_timeout: u64,
    pub idle_timeout: u64,
    pub max_lifetime: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: secrecy::Secret<String>,
    pub access_token_ttl_seconds: i64,
}

/// Identity of the singleton internal client, provisioned out of band
/// (see `seed_internal_workspace`) and checked by the internal authorizer.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct InternalPrincipalConfig {
    pub internal_client_id: String,
    #[serde(skip_serializing)]
    pub internal_client_secret: secrecy::Secret<String>,
    pub internal_api_id: String,
    pub internal_workspace_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PubSubConfig {
    pub redis_url: String,
    pub channel: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub debug: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                port: 8080,
                host: "0.0.0.0".to_string(),
                shutdown_drain_seconds: 30,
            },
            database: DatabaseConfig {
                mysql_url: secrecy::Secret::new("mysql://localhost/optra".to_string()),
                max_connections: 10,
                min_connections: 1,
                connection_timeout: 30,
                idle_timeout: 600,
                max_lifetime: 3600,
            },
            security: SecurityConfig {
                jwt_secret: secrecy::Secret::new("change-me-in-production".to_string()),
                access_token_ttl_seconds: 86_400,
            },
            internal: InternalPrincipalConfig {
                internal_client_id: String::new(),
                internal_client_secret: secrecy::Secret::new(String::new()),
                internal_api_id: String::new(),
                internal_workspace_id: String::new(),
            },
            pubsub: PubSubConfig {
                redis_url: "redis://127.0.0.1:6379".to_string(),
                channel: "clients".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "json".to_string(),
                debug: false,
            },
        }
    }
}
