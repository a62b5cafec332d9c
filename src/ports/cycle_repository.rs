//! Cycle repository port.
//!
//! Cycles are created once per `(cycle_date, cycle_type)` and never updated,
//! so the contract is lookup plus create.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::foundation::{CycleId, DomainError};
use crate::domain::notification::{Cycle, CycleType};

/// Repository port for notification cycles.
#[async_trait]
pub trait CycleRepository: Send + Sync {
    /// Find a cycle by its ID.
    ///
    /// Returns `None` if not found.
    async fn find_by_id(&self, id: &CycleId) -> Result<Option<Cycle>, DomainError>;

    /// Find the cycle for a natural key.
    async fn find_by_date_and_type(
        &self,
        cycle_date: NaiveDate,
        cycle_type: CycleType,
    ) -> Result<Option<Cycle>, DomainError>;

    /// Persist a new cycle.
    ///
    /// # Errors
    ///
    /// - `CycleExists` if a cycle with the same natural key is already stored
    /// - `DatabaseError` on persistence failure
    async fn create(&self, cycle: &Cycle) -> Result<(), DomainError>;
}
