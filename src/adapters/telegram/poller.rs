//! TelegramUpdatePoller - long-polls `getUpdates` and feeds button presses
//! to the [`ResponseIngress`].
//!
//! Every callback query is answered, even when processing failed, so the
//! participant's client never hangs on a spinner.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time;
use tracing::{debug, info, warn};

use super::api::{CallbackQuery, TelegramClient, Update};
use crate::application::response_ingress::{ResponseIngress, ACK_UNKNOWN};
use crate::domain::foundation::DomainError;

/// Pause after a failed `getUpdates` call.
const RETRY_BACKOFF: Duration = Duration::from_secs(5);

/// Button press decoded from an update, with the text to answer it with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackAnswer {
    pub callback_query_id: String,
    pub text: &'static str,
}

/// Pulls updates and dispatches callback data.
pub struct TelegramUpdatePoller {
    client: Arc<TelegramClient>,
    ingress: Arc<ResponseIngress>,
}

impl TelegramUpdatePoller {
    pub fn new(client: Arc<TelegramClient>, ingress: Arc<ResponseIngress>) -> Self {
        Self { client, ingress }
    }

    /// Run the polling loop until shutdown signal is received or the
    /// sender is dropped.
    ///
    /// A long poll in flight is abandoned on shutdown; Telegram redelivers
    /// anything not yet confirmed through the offset.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<(), DomainError> {
        info!("Telegram update poller started");
        let mut offset = 0_i64;

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Telegram update poller stopped");
                        return Ok(());
                    }
                }

                polled = self.client.get_updates(offset) => {
                    match polled {
                        Ok(updates) => offset = self.process_updates(offset, updates).await,
                        Err(err) => {
                            warn!(error = %err, "getUpdates failed, backing off");
                            tokio::select! {
                                changed = shutdown.changed() => {
                                    if changed.is_err() || *shutdown.borrow() {
                                        info!("Telegram update poller stopped");
                                        return Ok(());
                                    }
                                }
                                _ = time::sleep(RETRY_BACKOFF) => {}
                            }
                        }
                    }
                }
            }
        }
    }

    /// Handles a batch and returns the offset confirming it.
    async fn process_updates(&self, mut offset: i64, updates: Vec<Update>) -> i64 {
        for update in updates {
            offset = offset.max(update.update_id + 1);
            let Some(answer) = self.dispatch(update).await else {
                continue;
            };
            if let Err(err) = self
                .client
                .answer_callback_query(&answer.callback_query_id, answer.text)
                .await
            {
                warn!(
                    callback_query_id = %answer.callback_query_id,
                    error = %err,
                    "Failed to answer callback query"
                );
            }
        }
        offset
    }

    /// Routes one update; `None` for updates that carry no button press.
    pub async fn dispatch(&self, update: Update) -> Option<CallbackAnswer> {
        let CallbackQuery { id, from, data } = update.callback_query?;
        let text = match data {
            Some(data) => {
                debug!(update_id = update.update_id, user_id = from.id, "Callback received");
                self.ingress.handle(&data).await
            }
            None => ACK_UNKNOWN,
        };
        Some(CallbackAnswer {
            callback_query_id: id,
            text,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{
        InMemoryCycleRepository, InMemoryRosterDirectory, InMemoryStatusStore, ManualClock,
        RecordingNotifier,
    };
    use crate::adapters::telegram::api::User;
    use crate::application::response_ingress::ACK_YES;
    use crate::application::workflow::{WorkflowEngine, WorkflowSettings};
    use crate::config::TelegramConfig;
    use crate::domain::foundation::{ReportStatusId, Timestamp};
    use crate::domain::notification::ResponseToken;

    fn poller() -> TelegramUpdatePoller {
        let engine = Arc::new(WorkflowEngine::new(
            Arc::new(InMemoryCycleRepository::new()),
            Arc::new(InMemoryStatusStore::new()),
            Arc::new(InMemoryRosterDirectory::new()),
            Arc::new(RecordingNotifier::new()),
            Arc::new(ManualClock::new(Timestamp::now())),
            WorkflowSettings::default(),
        ));
        let client = TelegramClient::new(&TelegramConfig::with_token("1:test")).unwrap();
        TelegramUpdatePoller::new(Arc::new(client), Arc::new(ResponseIngress::new(engine)))
    }

    fn callback(update_id: i64, data: Option<String>) -> Update {
        Update {
            update_id,
            callback_query: Some(CallbackQuery {
                id: format!("cb-{}", update_id),
                from: User { id: 42 },
                data,
            }),
        }
    }

    #[tokio::test]
    async fn update_without_callback_is_ignored() {
        let update = Update {
            update_id: 1,
            callback_query: None,
        };
        assert!(poller().dispatch(update).await.is_none());
    }

    #[tokio::test]
    async fn callback_without_data_is_answered_as_unknown() {
        let answer = poller().dispatch(callback(2, None)).await.unwrap();
        assert_eq!(answer.callback_query_id, "cb-2");
        assert_eq!(answer.text, ACK_UNKNOWN);
    }

    #[tokio::test]
    async fn callback_data_goes_through_ingress() {
        let token = ResponseToken::yes(ReportStatusId::new()).encode();
        let answer = poller().dispatch(callback(3, Some(token))).await.unwrap();
        assert_eq!(answer.text, ACK_YES);
    }

    #[tokio::test]
    async fn run_stops_on_shutdown_signal() {
        let config = TelegramConfig {
            // Unroutable, so getUpdates keeps failing while we wait.
            api_base_url: "http://127.0.0.1:9".to_string(),
            ..TelegramConfig::with_token("1:test")
        };
        let poller = TelegramUpdatePoller {
            client: Arc::new(TelegramClient::new(&config).unwrap()),
            ..poller()
        };
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(async move { poller.run(shutdown_rx).await });

        time::sleep(Duration::from_millis(50)).await;
        shutdown_tx.send(true).unwrap();

        let result = time::timeout(Duration::from_secs(5), handle).await;
        assert!(result.is_ok(), "poller did not stop");
        assert!(result.unwrap().unwrap().is_ok());
    }

    #[tokio::test]
    async fn run_stops_when_shutdown_sender_is_dropped() {
        let config = TelegramConfig {
            api_base_url: "http://127.0.0.1:9".to_string(),
            ..TelegramConfig::with_token("1:test")
        };
        let poller = TelegramUpdatePoller {
            client: Arc::new(TelegramClient::new(&config).unwrap()),
            ..poller()
        };
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(async move { poller.run(shutdown_rx).await });

        time::sleep(Duration::from_millis(50)).await;
        drop(shutdown_tx);

        let result = time::timeout(Duration::from_secs(5), handle).await;
        assert!(result.is_ok(), "poller kept running without a sender");
        assert!(result.unwrap().unwrap().is_ok());
    }
}
