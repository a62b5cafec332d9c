//! Process configuration, loaded from `REPORT_REMINDER__*` environment
//! variables through `config` and `dotenvy`.
//!
//! # Example
//!
//! ```no_run
//! use report_reminder::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Cycles run in {}", config.scheduler.timezone);
//! ```

mod database;
mod error;
mod logging;
mod scheduler;
mod telegram;

pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use logging::{Environment, LoggingConfig};
pub use scheduler::{parse_cron, SchedulerConfig};
pub use telegram::TelegramConfig;

use serde::Deserialize;

/// Everything the bot process needs, read once at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,

    pub telegram: TelegramConfig,

    #[serde(default)]
    pub scheduler: SchedulerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Reads `REPORT_REMINDER__<SECTION>__<KEY>` variables, after loading a
    /// `.env` file when one exists.
    ///
    /// `REPORT_REMINDER__SCHEDULER__TIMEZONE=Europe/Moscow` sets
    /// `scheduler.timezone`.
    ///
    /// # Errors
    ///
    /// `ConfigError::LoadError` when a required section is absent or a value
    /// has the wrong type. Semantic checks are left to [`AppConfig::validate`].
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let source = config::Environment::default()
            .prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__");
        let config = config::Config::builder()
            .add_source(source)
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    /// Validates every section; the first failure wins.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.database.validate()?;
        self.telegram.validate()?;
        self.scheduler.validate()
    }

    pub fn is_production(&self) -> bool {
        self.logging.environment == Environment::Production
    }
}

const ENV_PREFIX: &str = "REPORT_REMINDER";
