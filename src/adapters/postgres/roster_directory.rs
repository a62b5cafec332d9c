//! PostgreSQL implementation of RosterDirectory.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{ChatId, DomainError, ErrorCode, ParticipantId};
use crate::domain::roster::Participant;
use crate::ports::RosterDirectory;

/// Reads participants from the `participants` table.
pub struct PostgresRosterDirectory {
    pool: PgPool,
}

impl PostgresRosterDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ParticipantRow {
    id: Uuid,
    chat_id: i64,
    first_name: String,
    last_name: Option<String>,
    is_active: bool,
}

impl TryFrom<ParticipantRow> for Participant {
    type Error = DomainError;

    fn try_from(row: ParticipantRow) -> Result<Self, Self::Error> {
        let chat_id = ChatId::new(row.chat_id).map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Invalid chat_id: {}", e))
        })?;

        Ok(Participant {
            id: ParticipantId::from_uuid(row.id),
            chat_id,
            first_name: row.first_name,
            last_name: row.last_name,
            is_active: row.is_active,
        })
    }
}

#[async_trait]
impl RosterDirectory for PostgresRosterDirectory {
    async fn list_active(&self) -> Result<Vec<Participant>, DomainError> {
        let rows: Vec<ParticipantRow> = sqlx::query_as(
            r#"
            SELECT id, chat_id, first_name, last_name, is_active
            FROM participants
            WHERE is_active = TRUE
            ORDER BY first_name, last_name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to list participants", e))?;

        rows.into_iter().map(Participant::try_from).collect()
    }

    async fn find_by_id(&self, id: &ParticipantId) -> Result<Option<Participant>, DomainError> {
        let row: Option<ParticipantRow> = sqlx::query_as(
            r#"
            SELECT id, chat_id, first_name, last_name, is_active
            FROM participants
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to find participant", e))?;

        row.map(Participant::try_from).transpose()
    }
}
