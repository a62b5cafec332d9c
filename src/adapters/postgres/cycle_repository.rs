//! PostgreSQL implementation of CycleRepository.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{CycleId, DomainError, ErrorCode, Timestamp};
use crate::domain::notification::{Cycle, CycleType};
use crate::ports::CycleRepository;

/// PostgreSQL implementation of the CycleRepository port.
pub struct PostgresCycleRepository {
    pool: PgPool,
}

impl PostgresCycleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a cycle.
#[derive(Debug, sqlx::FromRow)]
struct CycleRow {
    id: Uuid,
    cycle_date: NaiveDate,
    cycle_type: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<CycleRow> for Cycle {
    type Error = DomainError;

    fn try_from(row: CycleRow) -> Result<Self, Self::Error> {
        Ok(Cycle {
            id: CycleId::from_uuid(row.id),
            cycle_date: row.cycle_date,
            cycle_type: row.cycle_type.parse::<CycleType>()?,
            created_at: Timestamp::from_datetime(row.created_at),
        })
    }
}

#[async_trait]
impl CycleRepository for PostgresCycleRepository {
    async fn find_by_id(&self, id: &CycleId) -> Result<Option<Cycle>, DomainError> {
        let row: Option<CycleRow> = sqlx::query_as(
            r#"
            SELECT id, cycle_date, cycle_type, created_at
            FROM notification_cycles
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to find cycle", e))?;

        row.map(Cycle::try_from).transpose()
    }

    async fn find_by_date_and_type(
        &self,
        cycle_date: NaiveDate,
        cycle_type: CycleType,
    ) -> Result<Option<Cycle>, DomainError> {
        let row: Option<CycleRow> = sqlx::query_as(
            r#"
            SELECT id, cycle_date, cycle_type, created_at
            FROM notification_cycles
            WHERE cycle_date = $1 AND cycle_type = $2
            "#,
        )
        .bind(cycle_date)
        .bind(cycle_type.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to find cycle", e))?;

        row.map(Cycle::try_from).transpose()
    }

    async fn create(&self, cycle: &Cycle) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO notification_cycles (id, cycle_date, cycle_type, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(cycle.id.as_uuid())
        .bind(cycle.cycle_date)
        .bind(cycle.cycle_type.as_str())
        .bind(cycle.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return DomainError::new(
                        ErrorCode::CycleExists,
                        format!(
                            "Cycle already exists for {} {}",
                            cycle.cycle_date, cycle.cycle_type
                        ),
                    );
                }
            }
            DomainError::database("Failed to create cycle", e)
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cycle_type: &str) -> CycleRow {
        CycleRow {
            id: Uuid::new_v4(),
            cycle_date: NaiveDate::from_ymd_opt(2024, 5, 31).unwrap(),
            cycle_type: cycle_type.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn row_converts_to_cycle() {
        let row = row("END_MONTH");
        let id = row.id;
        let cycle = Cycle::try_from(row).unwrap();
        assert_eq!(cycle.id, CycleId::from_uuid(id));
        assert_eq!(cycle.cycle_type, CycleType::EndMonth);
    }

    #[test]
    fn unknown_cycle_type_is_unrecognized() {
        let err = Cycle::try_from(row("WEEKLY")).unwrap_err();
        assert_eq!(err.code, ErrorCode::UnrecognizedCycleType);
    }
}
