//! Recording notifier that captures outgoing messages.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::RwLock;

use crate::domain::foundation::{ChatId, DomainError, ErrorCode};
use crate::ports::{NotifierGateway, ResponseButtons};

/// One captured message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub chat_id: ChatId,
    pub text: String,
    pub buttons: Option<ResponseButtons>,
}

/// Notifier double: records successful sends and fails for chosen chats.
///
/// # Panics
///
/// Methods panic if the internal locks are poisoned.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: RwLock<Vec<SentMessage>>,
    failing: RwLock<HashSet<ChatId>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every subsequent send to `chat_id` fails with `DeliveryFailed`.
    pub fn fail_for(&self, chat_id: ChatId) {
        self.failing
            .write()
            .expect("RecordingNotifier: failing lock poisoned")
            .insert(chat_id);
    }

    /// Deliveries to `chat_id` succeed again.
    pub fn recover(&self, chat_id: ChatId) {
        self.failing
            .write()
            .expect("RecordingNotifier: failing lock poisoned")
            .remove(&chat_id);
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent
            .read()
            .expect("RecordingNotifier: sent lock poisoned")
            .clone()
    }

    pub fn sent_to(&self, chat_id: ChatId) -> Vec<SentMessage> {
        self.sent()
            .into_iter()
            .filter(|m| m.chat_id == chat_id)
            .collect()
    }

    pub fn count(&self) -> usize {
        self.sent
            .read()
            .expect("RecordingNotifier: sent lock poisoned")
            .len()
    }

    pub fn clear(&self) {
        self.sent
            .write()
            .expect("RecordingNotifier: sent lock poisoned")
            .clear();
    }
}

#[async_trait]
impl NotifierGateway for RecordingNotifier {
    async fn send(
        &self,
        chat_id: ChatId,
        text: &str,
        buttons: Option<&ResponseButtons>,
    ) -> Result<(), DomainError> {
        let failing = self
            .failing
            .read()
            .expect("RecordingNotifier: failing lock poisoned")
            .contains(&chat_id);
        if failing {
            return Err(DomainError::new(
                ErrorCode::DeliveryFailed,
                format!("Simulated delivery failure to chat {}", chat_id),
            ));
        }
        self.sent
            .write()
            .expect("RecordingNotifier: sent lock poisoned")
            .push(SentMessage {
                chat_id,
                text: text.to_string(),
                buttons: buttons.cloned(),
            });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_and_fails_per_chat() {
        let notifier = RecordingNotifier::new();
        let ok = ChatId::new(1).unwrap();
        let bad = ChatId::new(2).unwrap();
        notifier.fail_for(bad);

        notifier.send(ok, "hello", None).await.unwrap();
        let err = notifier.send(bad, "hello", None).await.unwrap_err();
        assert!(err.is_transient());
        assert_eq!(notifier.count(), 1);

        notifier.recover(bad);
        notifier.send(bad, "again", None).await.unwrap();
        assert_eq!(notifier.sent_to(bad).len(), 1);
    }
}
