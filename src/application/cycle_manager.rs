//! CycleManager - resolves the single cycle for a scheduled event.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::domain::notification::{Cycle, CycleType};
use crate::ports::{Clock, CycleRepository};

/// Find-or-create for cycles keyed by `(cycle_date, cycle_type)`.
pub struct CycleManager {
    repository: Arc<dyn CycleRepository>,
    clock: Arc<dyn Clock>,
}

impl CycleManager {
    pub fn new(repository: Arc<dyn CycleRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    /// Returns the cycle for `(date, cycle_type)`, creating it on first use.
    ///
    /// Concurrent callers racing on the same key all receive the cycle that
    /// won the insert.
    pub async fn resolve(
        &self,
        date: NaiveDate,
        cycle_type: CycleType,
    ) -> Result<Cycle, DomainError> {
        // 1. Existing cycle
        if let Some(cycle) = self.repository.find_by_date_and_type(date, cycle_type).await? {
            debug!(cycle_id = %cycle.id, %date, %cycle_type, "Cycle already exists");
            return Ok(cycle);
        }

        // 2. Create
        let cycle = Cycle::new(date, cycle_type, self.clock.now());
        match self.repository.create(&cycle).await {
            Ok(()) => {
                info!(cycle_id = %cycle.id, %date, %cycle_type, "Cycle created");
                Ok(cycle)
            }
            // 3. Lost the race: re-fetch the winner
            Err(err) if err.is_conflict() => {
                debug!(%date, %cycle_type, "Cycle created concurrently, re-fetching");
                self.repository
                    .find_by_date_and_type(date, cycle_type)
                    .await?
                    .ok_or_else(|| {
                        DomainError::new(
                            ErrorCode::CycleNotFound,
                            format!("Cycle {} {} vanished after conflict", date, cycle_type),
                        )
                    })
            }
            Err(err) => Err(err),
        }
    }
}
