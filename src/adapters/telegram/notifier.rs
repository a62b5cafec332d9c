//! TelegramNotifier - NotifierGateway over the Bot API.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::TelegramClient;
use crate::domain::foundation::{ChatId, DomainError};
use crate::ports::{NotifierGateway, ResponseButtons};

/// Sends questions and notices as Telegram messages.
pub struct TelegramNotifier {
    client: Arc<TelegramClient>,
}

impl TelegramNotifier {
    pub fn new(client: Arc<TelegramClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl NotifierGateway for TelegramNotifier {
    async fn send(
        &self,
        chat_id: ChatId,
        text: &str,
        buttons: Option<&ResponseButtons>,
    ) -> Result<(), DomainError> {
        let message = self
            .client
            .send_message(chat_id.as_i64(), text, buttons)
            .await?;
        debug!(
            chat_id = %chat_id,
            message_id = message.message_id,
            with_buttons = buttons.is_some(),
            "Telegram message delivered"
        );
        Ok(())
    }
}
