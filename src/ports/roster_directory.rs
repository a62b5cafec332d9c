//! Read access to the participant roster.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, ParticipantId};
use crate::domain::roster::Participant;

/// Source of participants to ask.
#[async_trait]
pub trait RosterDirectory: Send + Sync {
    /// Active participants, in a stable order.
    async fn list_active(&self) -> Result<Vec<Participant>, DomainError>;

    /// Any participant, active or not. Returns `None` if not found.
    async fn find_by_id(&self, id: &ParticipantId) -> Result<Option<Participant>, DomainError>;
}
