//! Telegram Bot API configuration

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::domain::foundation::ChatId;

/// Chat transport configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    /// Bot token issued by BotFather
    pub bot_token: Secret<String>,

    /// Chat that receives completion notices; notices are skipped when unset
    #[serde(default)]
    pub supervisor_chat_id: Option<i64>,

    /// Bot API endpoint
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Long-poll timeout passed to `getUpdates`, in seconds
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,

    /// Timeout for ordinary API requests, in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl TelegramConfig {
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            bot_token: Secret::new(token.into()),
            supervisor_chat_id: None,
            api_base_url: default_api_base_url(),
            poll_timeout_secs: default_poll_timeout(),
            request_timeout_secs: default_request_timeout(),
        }
    }

    /// Supervisor chat as a domain id, if configured
    pub fn supervisor_chat(&self) -> Option<ChatId> {
        self.supervisor_chat_id.and_then(|id| ChatId::new(id).ok())
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Validate Telegram configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.bot_token.expose_secret().trim().is_empty() {
            return Err(ValidationError::MissingRequired("TELEGRAM_BOT_TOKEN"));
        }
        if !self.api_base_url.starts_with("https://") && !self.api_base_url.starts_with("http://") {
            return Err(ValidationError::InvalidApiBaseUrl);
        }
        if self.supervisor_chat_id == Some(0) {
            return Err(ValidationError::InvalidSupervisorChatId);
        }
        if self.poll_timeout_secs == 0 || self.poll_timeout_secs > 50 {
            return Err(ValidationError::InvalidTimeout(
                "telegram.poll_timeout_secs",
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout(
                "telegram.request_timeout_secs",
            ));
        }
        Ok(())
    }
}

fn default_api_base_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_poll_timeout() -> u64 {
    30
}

fn default_request_timeout() -> u64 {
    10
}
