//! NotifierGateway port - delivering messages over the chat transport.

use async_trait::async_trait;

use crate::domain::foundation::{ChatId, DomainError, ReportStatusId};
use crate::domain::notification::{messages, ResponseToken};

/// The Yes/No button pair attached to a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseButtons {
    pub yes_label: String,
    pub yes_token: String,
    pub no_label: String,
    pub no_token: String,
}

impl ResponseButtons {
    /// Buttons answering the question tracked by `status_id`.
    pub fn for_status(status_id: ReportStatusId) -> Self {
        Self {
            yes_label: messages::YES_BUTTON.to_string(),
            yes_token: ResponseToken::yes(status_id).encode(),
            no_label: messages::NO_BUTTON.to_string(),
            no_token: ResponseToken::no(status_id).encode(),
        }
    }
}

/// Outbound chat delivery.
#[async_trait]
pub trait NotifierGateway: Send + Sync {
    /// Send `text` to `chat_id`, optionally with answer buttons.
    ///
    /// # Errors
    ///
    /// - `DeliveryFailed` if the transport rejected or never received the message
    async fn send(
        &self,
        chat_id: ChatId,
        text: &str,
        buttons: Option<&ResponseButtons>,
    ) -> Result<(), DomainError>;
}
