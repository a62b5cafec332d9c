//! In-memory roster.

use async_trait::async_trait;
use std::sync::RwLock;

use crate::domain::foundation::{DomainError, ParticipantId};
use crate::domain::roster::Participant;
use crate::ports::RosterDirectory;

/// Roster held in a `Vec`; `list_active` keeps insertion order.
///
/// # Panics
///
/// Methods panic if the internal lock is poisoned.
#[derive(Default)]
pub struct InMemoryRosterDirectory {
    participants: RwLock<Vec<Participant>>,
}

impl InMemoryRosterDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_participants(participants: Vec<Participant>) -> Self {
        Self {
            participants: RwLock::new(participants),
        }
    }

    pub fn add(&self, participant: Participant) {
        self.participants
            .write()
            .expect("InMemoryRosterDirectory: write lock poisoned")
            .push(participant);
    }

    /// Marks a participant inactive without removing them.
    pub fn deactivate(&self, id: &ParticipantId) {
        let mut participants = self
            .participants
            .write()
            .expect("InMemoryRosterDirectory: write lock poisoned");
        if let Some(p) = participants.iter_mut().find(|p| &p.id == id) {
            p.is_active = false;
        }
    }
}

#[async_trait]
impl RosterDirectory for InMemoryRosterDirectory {
    async fn list_active(&self) -> Result<Vec<Participant>, DomainError> {
        Ok(self
            .participants
            .read()
            .expect("InMemoryRosterDirectory: lock poisoned")
            .iter()
            .filter(|p| p.is_active)
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: &ParticipantId) -> Result<Option<Participant>, DomainError> {
        Ok(self
            .participants
            .read()
            .expect("InMemoryRosterDirectory: lock poisoned")
            .iter()
            .find(|p| &p.id == id)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::ChatId;

    fn participant(name: &str, chat: i64) -> Participant {
        Participant::new(ParticipantId::new(), ChatId::new(chat).unwrap(), name, None).unwrap()
    }

    #[tokio::test]
    async fn inactive_participants_are_not_listed_but_still_found() {
        let anna = participant("Anna", 1);
        let boris = participant("Boris", 2);
        let roster = InMemoryRosterDirectory::with_participants(vec![anna.clone(), boris.clone()]);
        roster.deactivate(&boris.id);

        let active = roster.list_active().await.unwrap();
        assert_eq!(active, vec![anna]);
        assert!(roster.find_by_id(&boris.id).await.unwrap().is_some());
    }
}
