//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Pool min_connections exceeds max_connections")]
    InvalidPoolSize,

    #[error("Pool size exceeds maximum allowed (100)")]
    PoolSizeTooLarge,

    #[error("Invalid timeout for {0}")]
    InvalidTimeout(&'static str),

    #[error("Telegram API base URL must be http(s)")]
    InvalidApiBaseUrl,

    #[error("Supervisor chat id must be non-zero")]
    InvalidSupervisorChatId,

    #[error("Unknown time zone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid cron expression for {field} '{expression}': {reason}")]
    InvalidCron {
        field: &'static str,
        expression: String,
        reason: String,
    },
}
