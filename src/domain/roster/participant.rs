//! Participant - a person on the roster who is asked to confirm reports.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ChatId, ParticipantId, ValidationError};

/// A roster member reachable over the chat channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub chat_id: ChatId,
    pub first_name: String,
    pub last_name: Option<String>,
    pub is_active: bool,
}

impl Participant {
    /// Creates an active participant.
    ///
    /// # Errors
    ///
    /// Returns `EmptyField` if `first_name` is blank.
    pub fn new(
        id: ParticipantId,
        chat_id: ChatId,
        first_name: impl Into<String>,
        last_name: Option<String>,
    ) -> Result<Self, ValidationError> {
        let first_name = first_name.into().trim().to_string();
        if first_name.is_empty() {
            return Err(ValidationError::empty_field("first_name"));
        }
        let last_name = last_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());

        Ok(Self {
            id,
            chat_id,
            first_name,
            last_name,
            is_active: true,
        })
    }

    /// Name used in greetings.
    pub fn display_name(&self) -> &str {
        &self.first_name
    }

    /// First and last name, as shown to the supervisor.
    pub fn full_name(&self) -> String {
        match &self.last_name {
            Some(last) => format!("{} {}", self.first_name, last),
            None => self.first_name.clone(),
        }
    }
}
