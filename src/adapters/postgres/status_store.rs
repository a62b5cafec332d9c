//! PostgreSQL implementation of StatusStore.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{
    CycleId, DomainError, ErrorCode, ParticipantId, ReportStatusId, Timestamp,
};
use crate::domain::notification::{QuestionStatus, ReportKey, ReportStatus};
use crate::ports::StatusStore;

const SELECT_COLUMNS: &str = "SELECT id, participant_id, cycle_id, report_key, status, \
     last_notified_at, remind_at, response_attempts, created_at, updated_at \
     FROM report_statuses";

/// PostgreSQL implementation of the StatusStore port.
pub struct PostgresStatusStore {
    pool: PgPool,
}

impl PostgresStatusStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_all(
        &self,
        query: sqlx::query::QueryAs<
            '_,
            sqlx::Postgres,
            ReportStatusRow,
            sqlx::postgres::PgArguments,
        >,
        context: &str,
    ) -> Result<Vec<ReportStatus>, DomainError> {
        let rows: Vec<ReportStatusRow> = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::database(context, e))?;

        rows.into_iter().map(ReportStatus::try_from).collect()
    }
}

/// Database row representation of a report status.
#[derive(Debug, sqlx::FromRow)]
struct ReportStatusRow {
    id: Uuid,
    participant_id: Uuid,
    cycle_id: Uuid,
    report_key: String,
    status: String,
    last_notified_at: Option<DateTime<Utc>>,
    remind_at: Option<DateTime<Utc>>,
    response_attempts: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ReportStatusRow> for ReportStatus {
    type Error = DomainError;

    fn try_from(row: ReportStatusRow) -> Result<Self, Self::Error> {
        let response_attempts = u32::try_from(row.response_attempts).map_err(|_| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Negative response_attempts: {}", row.response_attempts),
            )
        })?;

        Ok(ReportStatus {
            id: ReportStatusId::from_uuid(row.id),
            participant_id: ParticipantId::from_uuid(row.participant_id),
            cycle_id: CycleId::from_uuid(row.cycle_id),
            report_key: row.report_key.parse::<ReportKey>()?,
            status: row.status.parse::<QuestionStatus>()?,
            last_notified_at: row.last_notified_at.map(Timestamp::from_datetime),
            remind_at: row.remind_at.map(Timestamp::from_datetime),
            response_attempts,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

fn attempts_to_i32(attempts: u32) -> i32 {
    i32::try_from(attempts).unwrap_or(i32::MAX)
}

fn not_found(id: &ReportStatusId) -> DomainError {
    DomainError::new(
        ErrorCode::ReportStatusNotFound,
        format!("Report status not found: {}", id),
    )
}

#[async_trait]
impl StatusStore for PostgresStatusStore {
    async fn create(&self, row: &ReportStatus) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO report_statuses (
                id, participant_id, cycle_id, report_key, status, last_notified_at,
                remind_at, response_attempts, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(row.id.as_uuid())
        .bind(row.participant_id.as_uuid())
        .bind(row.cycle_id.as_uuid())
        .bind(row.report_key.as_str())
        .bind(row.status.as_str())
        .bind(row.last_notified_at.map(|t| *t.as_datetime()))
        .bind(row.remind_at.map(|t| *t.as_datetime()))
        .bind(attempts_to_i32(row.response_attempts))
        .bind(row.created_at.as_datetime())
        .bind(row.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return DomainError::new(
                        ErrorCode::ReportStatusExists,
                        format!(
                            "Report status already exists for {} in cycle {}",
                            row.report_key, row.cycle_id
                        ),
                    );
                }
            }
            DomainError::database("Failed to create report status", e)
        })?;

        Ok(())
    }

    async fn bulk_create(&self, rows: &[ReportStatus]) -> Result<u64, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::database("Failed to begin transaction", e))?;

        let mut inserted = 0;
        for row in rows {
            let result = sqlx::query(
                r#"
                INSERT INTO report_statuses (
                    id, participant_id, cycle_id, report_key, status, last_notified_at,
                    remind_at, response_attempts, created_at, updated_at
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                ON CONFLICT (participant_id, cycle_id, report_key) DO NOTHING
                "#,
            )
            .bind(row.id.as_uuid())
            .bind(row.participant_id.as_uuid())
            .bind(row.cycle_id.as_uuid())
            .bind(row.report_key.as_str())
            .bind(row.status.as_str())
            .bind(row.last_notified_at.map(|t| *t.as_datetime()))
            .bind(row.remind_at.map(|t| *t.as_datetime()))
            .bind(attempts_to_i32(row.response_attempts))
            .bind(row.created_at.as_datetime())
            .bind(row.updated_at.as_datetime())
            .execute(&mut *tx)
            .await
            .map_err(|e| DomainError::database("Failed to insert report status", e))?;
            inserted += result.rows_affected();
        }

        tx.commit()
            .await
            .map_err(|e| DomainError::database("Failed to commit report statuses", e))?;

        Ok(inserted)
    }

    async fn get_by_composite_key(
        &self,
        participant_id: &ParticipantId,
        cycle_id: &CycleId,
        report_key: ReportKey,
    ) -> Result<Option<ReportStatus>, DomainError> {
        let sql = format!(
            "{} WHERE participant_id = $1 AND cycle_id = $2 AND report_key = $3",
            SELECT_COLUMNS
        );
        let row: Option<ReportStatusRow> = sqlx::query_as(&sql)
            .bind(participant_id.as_uuid())
            .bind(cycle_id.as_uuid())
            .bind(report_key.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::database("Failed to find report status", e))?;

        row.map(ReportStatus::try_from).transpose()
    }

    async fn get_by_id(&self, id: &ReportStatusId) -> Result<Option<ReportStatus>, DomainError> {
        let sql = format!("{} WHERE id = $1", SELECT_COLUMNS);
        let row: Option<ReportStatusRow> = sqlx::query_as(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::database("Failed to find report status", e))?;

        row.map(ReportStatus::try_from).transpose()
    }

    async fn update(&self, row: &ReportStatus) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE report_statuses SET
                status = $2,
                last_notified_at = $3,
                remind_at = $4,
                response_attempts = $5,
                updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(row.id.as_uuid())
        .bind(row.status.as_str())
        .bind(row.last_notified_at.map(|t| *t.as_datetime()))
        .bind(row.remind_at.map(|t| *t.as_datetime()))
        .bind(attempts_to_i32(row.response_attempts))
        .bind(row.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to update report status", e))?;

        if result.rows_affected() == 0 {
            return Err(not_found(&row.id));
        }

        Ok(())
    }

    async fn update_if_status(
        &self,
        row: &ReportStatus,
        expected: QuestionStatus,
    ) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE report_statuses SET
                status = $2,
                last_notified_at = $3,
                remind_at = $4,
                response_attempts = $5,
                updated_at = $6
            WHERE id = $1 AND status = $7
            "#,
        )
        .bind(row.id.as_uuid())
        .bind(row.status.as_str())
        .bind(row.last_notified_at.map(|t| *t.as_datetime()))
        .bind(row.remind_at.map(|t| *t.as_datetime()))
        .bind(attempts_to_i32(row.response_attempts))
        .bind(row.updated_at.as_datetime())
        .bind(expected.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to update report status", e))?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }

        // Distinguish a lost race from a deleted row.
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM report_statuses WHERE id = $1)",
        )
        .bind(row.id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to check report status", e))?;

        if exists {
            Ok(false)
        } else {
            Err(not_found(&row.id))
        }
    }

    async fn list_by_cycle(&self, cycle_id: &CycleId) -> Result<Vec<ReportStatus>, DomainError> {
        let sql = format!(
            "{} WHERE cycle_id = $1 ORDER BY participant_id, report_key",
            SELECT_COLUMNS
        );
        self.fetch_all(
            sqlx::query_as(&sql).bind(*cycle_id.as_uuid()),
            "Failed to list report statuses",
        )
        .await
    }

    async fn list_by_status(
        &self,
        cycle_id: &CycleId,
        status: QuestionStatus,
    ) -> Result<Vec<ReportStatus>, DomainError> {
        let sql = format!(
            "{} WHERE cycle_id = $1 AND status = $2 ORDER BY participant_id, report_key",
            SELECT_COLUMNS
        );
        self.fetch_all(
            sqlx::query_as(&sql)
                .bind(*cycle_id.as_uuid())
                .bind(status.as_str()),
            "Failed to list report statuses",
        )
        .await
    }

    async fn list_due_first_reminders(
        &self,
        now: Timestamp,
    ) -> Result<Vec<ReportStatus>, DomainError> {
        let statuses: Vec<String> = QuestionStatus::FIRST_REMINDER_TARGETS
            .iter()
            .map(|s| s.as_str().to_string())
            .collect();
        let sql = format!(
            "{} WHERE status = ANY($1) AND remind_at IS NOT NULL AND remind_at <= $2 \
             ORDER BY remind_at",
            SELECT_COLUMNS
        );
        self.fetch_all(
            sqlx::query_as(&sql)
                .bind(statuses)
                .bind(*now.as_datetime()),
            "Failed to list due reminders",
        )
        .await
    }

    async fn list_stalled_from_previous_day(
        &self,
        statuses: &[QuestionStatus],
        start: Timestamp,
        end: Timestamp,
    ) -> Result<Vec<ReportStatus>, DomainError> {
        let statuses: Vec<String> = statuses.iter().map(|s| s.as_str().to_string()).collect();
        let sql = format!(
            "{} WHERE status = ANY($1) AND last_notified_at >= $2 AND last_notified_at < $3 \
             ORDER BY last_notified_at",
            SELECT_COLUMNS
        );
        self.fetch_all(
            sqlx::query_as(&sql)
                .bind(statuses)
                .bind(*start.as_datetime())
                .bind(*end.as_datetime()),
            "Failed to list stalled report statuses",
        )
        .await
    }

    async fn all_confirmed(
        &self,
        participant_id: &ParticipantId,
        cycle_id: &CycleId,
        keys: &[ReportKey],
    ) -> Result<bool, DomainError> {
        let keys: Vec<String> = keys.iter().map(|k| k.as_str().to_string()).collect();
        let unconfirmed: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM report_statuses
            WHERE participant_id = $1
              AND cycle_id = $2
              AND report_key = ANY($3)
              AND status <> $4
            "#,
        )
        .bind(participant_id.as_uuid())
        .bind(cycle_id.as_uuid())
        .bind(keys)
        .bind(QuestionStatus::AnsweredYes.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to check confirmations", e))?;

        Ok(unconfirmed == 0)
    }
}
