//! Logging configuration

use serde::Deserialize;

/// Deployment environment; selects the log output format
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub environment: Environment,

    /// `EnvFilter` directive, overridden by `RUST_LOG` when set
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl LoggingConfig {
    /// JSON lines in production, human-readable output otherwise
    pub fn json_output(&self) -> bool {
        self.environment == Environment::Production
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info,report_reminder=debug,sqlx=warn".to_string()
}
