//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the workflow to external systems:
//! - `postgres` - persistence ports over `sqlx`
//! - `telegram` - chat delivery and button callbacks over the Bot API
//! - `scheduler` - cron timers driving initiation and the sweeps
//! - `memory` - in-process doubles for tests and local runs

pub mod memory;
pub mod postgres;
pub mod scheduler;
pub mod telegram;

pub use scheduler::ReminderScheduler;
pub use telegram::{TelegramClient, TelegramNotifier, TelegramUpdatePoller};
