//! Minimal Telegram Bot API client: `sendMessage`, `getUpdates` and
//! `answerCallbackQuery`.

use std::time::Duration;

use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::TelegramConfig;
use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::ResponseButtons;

/// HTTP client bound to one bot token.
pub struct TelegramClient {
    client: Client,
    token: Secret<String>,
    base_url: String,
    poll_timeout: Duration,
}

impl TelegramClient {
    /// Creates a client from configuration.
    ///
    /// # Errors
    ///
    /// - `InternalError` if the HTTP client cannot be built
    pub fn new(config: &TelegramConfig) -> Result<Self, DomainError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| {
                DomainError::new(
                    ErrorCode::InternalError,
                    format!("Failed to create HTTP client: {}", e),
                )
            })?;

        Ok(Self {
            client,
            token: config.bot_token.clone(),
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            poll_timeout: config.poll_timeout(),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.base_url,
            self.token.expose_secret(),
            method
        )
    }

    /// Delivers `text`, with an inline keyboard when `buttons` is given.
    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        buttons: Option<&ResponseButtons>,
    ) -> Result<Message, DomainError> {
        let request = SendMessageRequest {
            chat_id,
            text,
            reply_markup: buttons.map(InlineKeyboardMarkup::from),
        };
        self.call("sendMessage", &request, None).await
    }

    /// Long-polls for updates after `offset`.
    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>, DomainError> {
        let request = GetUpdatesRequest {
            offset,
            timeout: self.poll_timeout.as_secs(),
            allowed_updates: &["callback_query"],
        };
        // The HTTP deadline must outlive the long-poll window.
        let deadline = self.poll_timeout + Duration::from_secs(10);
        self.call("getUpdates", &request, Some(deadline)).await
    }

    /// Acknowledges a button press so the client stops its spinner.
    pub async fn answer_callback_query(
        &self,
        callback_query_id: &str,
        text: &str,
    ) -> Result<(), DomainError> {
        let request = AnswerCallbackQueryRequest {
            callback_query_id,
            text,
        };
        let _: bool = self.call("answerCallbackQuery", &request, None).await?;
        Ok(())
    }

    async fn call<B, T>(
        &self,
        method: &str,
        body: &B,
        timeout: Option<Duration>,
    ) -> Result<T, DomainError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut request = self.client.post(self.method_url(method)).json(body);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        // reqwest errors may embed the URL, and with it the token.
        let response = request.send().await.map_err(|e| {
            let reason = if e.is_timeout() {
                "timed out"
            } else if e.is_connect() {
                "connection failed"
            } else {
                "request failed"
            };
            DomainError::new(
                ErrorCode::DeliveryFailed,
                format!("Telegram {} {}", method, reason),
            )
        })?;

        let status = response.status();
        let envelope: ApiResponse<T> = response.json().await.map_err(|_| {
            DomainError::new(
                ErrorCode::DeliveryFailed,
                format!("Telegram {} returned unreadable body (HTTP {})", method, status),
            )
        })?;
        envelope.into_result(method)
    }
}

/// Envelope every Bot API method returns.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
    pub error_code: Option<i32>,
}

impl<T> ApiResponse<T> {
    fn into_result(self, method: &str) -> Result<T, DomainError> {
        match (self.ok, self.result) {
            (true, Some(result)) => Ok(result),
            _ => Err(DomainError::new(
                ErrorCode::DeliveryFailed,
                format!(
                    "Telegram {} failed ({}): {}",
                    method,
                    self.error_code.unwrap_or_default(),
                    self.description.unwrap_or_else(|| "no description".to_string())
                ),
            )
            .with_detail("method", method)),
        }
    }
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<InlineKeyboardMarkup>,
}

#[derive(Debug, Serialize)]
struct GetUpdatesRequest<'a> {
    offset: i64,
    timeout: u64,
    allowed_updates: &'a [&'a str],
}

#[derive(Debug, Serialize)]
struct AnswerCallbackQueryRequest<'a> {
    callback_query_id: &'a str,
    text: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InlineKeyboardMarkup {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InlineKeyboardButton {
    pub text: String,
    pub callback_data: String,
}

impl From<&ResponseButtons> for InlineKeyboardMarkup {
    fn from(buttons: &ResponseButtons) -> Self {
        Self {
            inline_keyboard: vec![vec![
                InlineKeyboardButton {
                    text: buttons.yes_label.clone(),
                    callback_data: buttons.yes_token.clone(),
                },
                InlineKeyboardButton {
                    text: buttons.no_label.clone(),
                    callback_data: buttons.no_token.clone(),
                },
            ]],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    pub data: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
}
