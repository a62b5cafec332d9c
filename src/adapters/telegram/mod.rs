//! Telegram transport: outbound messages and inbound button presses.

mod api;
mod notifier;
mod poller;

pub use api::{
    ApiResponse, CallbackQuery, InlineKeyboardButton, InlineKeyboardMarkup, Message,
    TelegramClient, Update, User,
};
pub use notifier::TelegramNotifier;
pub use poller::{CallbackAnswer, TelegramUpdatePoller};
