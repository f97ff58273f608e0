//! Configuration validation utilities

use crate::config::AppConfig;
use secrecy::ExposeSecret;
use thiserror::Error;
use validator::{Validate, ValidationErrors};

#[derive(Debug, Error)]
pub enum ConfigValidationError {
    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationErrors),

    #[error("Security validation failed: {message}")]
    SecurityValidationFailed { message: String },

    #[error("Database validation failed: {message}")]
    DatabaseValidationFailed { message: String },
}

pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate_config(config: &AppConfig) -> Result<(), ConfigValidationError> {
        config.validate()?;
        Self::validate_security_config(config)?;
        Self::validate_database_config(config)?;
        Ok(())
    }

    fn validate_security_config(config: &AppConfig) -> Result<(), ConfigValidationError> {
        let security = &config.security;

        if security.jwt_secret.expose_secret().len() < 32 {
            return Err(ConfigValidationError::SecurityValidationFailed {
                message: "JWT secret must be at least 32 characters long".to_string(),
            });
        }

        if security.access_token_ttl_seconds <= 0 {
            return Err(ConfigValidationError::SecurityValidationFailed {
                message: "Access token TTL must be positive".to_string(),
            });
        }

        Ok(())
    }

    fn validate_database_config(config: &AppConfig) -> Result<(), ConfigValidationError> {
        let db = &config.database;

        if db.max_connections < db.min_connections {
            return Err(ConfigValidationError::DatabaseValidationFailed {
                message: "Max connections must be greater than or equal to min connections"
                    .to_string(),
            });
        }

        if db.max_connections > 1000 {
            return Err(ConfigValidationError::DatabaseValidationFailed {
                message: "Max connections should not exceed 1000 for performance reasons"
                    .to_string(),
            });
        }

        Ok(())
    }
}
