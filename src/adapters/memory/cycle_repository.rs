//! In-memory cycle repository for tests and local runs.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::RwLock;

use crate::domain::foundation::{CycleId, DomainError, ErrorCode};
use crate::domain::notification::{Cycle, CycleType};
use crate::ports::CycleRepository;

/// Cycle store backed by a `Vec`, enforcing the `(date, type)` uniqueness
/// the database constraint provides.
///
/// # Panics
///
/// Methods panic if the internal lock is poisoned.
#[derive(Default)]
pub struct InMemoryCycleRepository {
    cycles: RwLock<Vec<Cycle>>,
}

impl InMemoryCycleRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored cycles (for test assertions).
    pub fn len(&self) -> usize {
        self.cycles
            .read()
            .expect("InMemoryCycleRepository: lock poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CycleRepository for InMemoryCycleRepository {
    async fn find_by_id(&self, id: &CycleId) -> Result<Option<Cycle>, DomainError> {
        Ok(self
            .cycles
            .read()
            .expect("InMemoryCycleRepository: lock poisoned")
            .iter()
            .find(|c| &c.id == id)
            .cloned())
    }

    async fn find_by_date_and_type(
        &self,
        cycle_date: NaiveDate,
        cycle_type: CycleType,
    ) -> Result<Option<Cycle>, DomainError> {
        Ok(self
            .cycles
            .read()
            .expect("InMemoryCycleRepository: lock poisoned")
            .iter()
            .find(|c| c.matches(cycle_date, cycle_type))
            .cloned())
    }

    async fn create(&self, cycle: &Cycle) -> Result<(), DomainError> {
        let mut cycles = self
            .cycles
            .write()
            .expect("InMemoryCycleRepository: write lock poisoned");
        if cycles
            .iter()
            .any(|c| c.id == cycle.id || c.matches(cycle.cycle_date, cycle.cycle_type))
        {
            return Err(DomainError::new(
                ErrorCode::CycleExists,
                format!(
                    "Cycle already exists for {} {}",
                    cycle.cycle_date, cycle.cycle_type
                ),
            ));
        }
        cycles.push(cycle.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::Timestamp;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 15).unwrap()
    }

    #[tokio::test]
    async fn create_then_find_by_natural_key() {
        let repo = InMemoryCycleRepository::new();
        let cycle = Cycle::new(date(), CycleType::MidMonth, Timestamp::now());
        repo.create(&cycle).await.unwrap();

        let found = repo
            .find_by_date_and_type(date(), CycleType::MidMonth)
            .await
            .unwrap();
        assert_eq!(found, Some(cycle.clone()));
        assert_eq!(repo.find_by_id(&cycle.id).await.unwrap(), Some(cycle));
    }

    #[tokio::test]
    async fn duplicate_natural_key_is_a_conflict() {
        let repo = InMemoryCycleRepository::new();
        repo.create(&Cycle::new(date(), CycleType::MidMonth, Timestamp::now()))
            .await
            .unwrap();
        let err = repo
            .create(&Cycle::new(date(), CycleType::MidMonth, Timestamp::now()))
            .await
            .unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn same_date_different_type_is_allowed() {
        let repo = InMemoryCycleRepository::new();
        repo.create(&Cycle::new(date(), CycleType::MidMonth, Timestamp::now()))
            .await
            .unwrap();
        repo.create(&Cycle::new(date(), CycleType::EndMonth, Timestamp::now()))
            .await
            .unwrap();
        assert_eq!(repo.len(), 2);
    }
}
