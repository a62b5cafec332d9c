//! In-memory status store for tests and local runs.

use async_trait::async_trait;
use std::sync::RwLock;

use crate::domain::foundation::{
    CycleId, DomainError, ErrorCode, ParticipantId, ReportStatusId, Timestamp,
};
use crate::domain::notification::{QuestionStatus, ReportKey, ReportStatus};
use crate::ports::StatusStore;

/// Status rows kept in insertion order.
///
/// Enforces the composite-key uniqueness and NotFound semantics of the
/// PostgreSQL store.
///
/// # Panics
///
/// Methods panic if the internal lock is poisoned.
#[derive(Default)]
pub struct InMemoryStatusStore {
    rows: RwLock<Vec<ReportStatus>>,
}

impl InMemoryStatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    // === Test Helpers ===

    /// Snapshot of every stored row.
    pub fn all(&self) -> Vec<ReportStatus> {
        self.rows
            .read()
            .expect("InMemoryStatusStore: lock poisoned")
            .clone()
    }

    pub fn len(&self) -> usize {
        self.rows
            .read()
            .expect("InMemoryStatusStore: lock poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes a row, simulating a partially failed initiation.
    pub fn remove(&self, id: &ReportStatusId) {
        self.rows
            .write()
            .expect("InMemoryStatusStore: write lock poisoned")
            .retain(|r| &r.id != id);
    }

    fn select<F>(&self, predicate: F) -> Vec<ReportStatus>
    where
        F: Fn(&ReportStatus) -> bool,
    {
        self.rows
            .read()
            .expect("InMemoryStatusStore: lock poisoned")
            .iter()
            .filter(|r| predicate(r))
            .cloned()
            .collect()
    }
}

fn same_key(a: &ReportStatus, b: &ReportStatus) -> bool {
    a.participant_id == b.participant_id
        && a.cycle_id == b.cycle_id
        && a.report_key == b.report_key
}

fn not_found(id: &ReportStatusId) -> DomainError {
    DomainError::new(
        ErrorCode::ReportStatusNotFound,
        format!("Report status not found: {}", id),
    )
}

fn apply_mutable_fields(stored: &mut ReportStatus, row: &ReportStatus) {
    stored.status = row.status;
    stored.last_notified_at = row.last_notified_at;
    stored.remind_at = row.remind_at;
    stored.response_attempts = row.response_attempts;
    stored.updated_at = row.updated_at;
}

#[async_trait]
impl StatusStore for InMemoryStatusStore {
    async fn create(&self, row: &ReportStatus) -> Result<(), DomainError> {
        let mut rows = self
            .rows
            .write()
            .expect("InMemoryStatusStore: write lock poisoned");
        if rows.iter().any(|r| r.id == row.id || same_key(r, row)) {
            return Err(DomainError::new(
                ErrorCode::ReportStatusExists,
                format!(
                    "Report status already exists for {} in cycle {}",
                    row.report_key, row.cycle_id
                ),
            ));
        }
        rows.push(row.clone());
        Ok(())
    }

    async fn bulk_create(&self, batch: &[ReportStatus]) -> Result<u64, DomainError> {
        let mut rows = self
            .rows
            .write()
            .expect("InMemoryStatusStore: write lock poisoned");
        let mut inserted = 0;
        for row in batch {
            if rows.iter().any(|r| r.id == row.id || same_key(r, row)) {
                continue;
            }
            rows.push(row.clone());
            inserted += 1;
        }
        Ok(inserted)
    }

    async fn get_by_composite_key(
        &self,
        participant_id: &ParticipantId,
        cycle_id: &CycleId,
        report_key: ReportKey,
    ) -> Result<Option<ReportStatus>, DomainError> {
        Ok(self
            .select(|r| {
                &r.participant_id == participant_id
                    && &r.cycle_id == cycle_id
                    && r.report_key == report_key
            })
            .into_iter()
            .next())
    }

    async fn get_by_id(&self, id: &ReportStatusId) -> Result<Option<ReportStatus>, DomainError> {
        Ok(self.select(|r| &r.id == id).into_iter().next())
    }

    async fn update(&self, row: &ReportStatus) -> Result<(), DomainError> {
        let mut rows = self
            .rows
            .write()
            .expect("InMemoryStatusStore: write lock poisoned");
        let stored = rows
            .iter_mut()
            .find(|r| r.id == row.id)
            .ok_or_else(|| not_found(&row.id))?;
        apply_mutable_fields(stored, row);
        Ok(())
    }

    async fn update_if_status(
        &self,
        row: &ReportStatus,
        expected: QuestionStatus,
    ) -> Result<bool, DomainError> {
        let mut rows = self
            .rows
            .write()
            .expect("InMemoryStatusStore: write lock poisoned");
        let stored = rows
            .iter_mut()
            .find(|r| r.id == row.id)
            .ok_or_else(|| not_found(&row.id))?;
        if stored.status != expected {
            return Ok(false);
        }
        apply_mutable_fields(stored, row);
        Ok(true)
    }

    async fn list_by_cycle(&self, cycle_id: &CycleId) -> Result<Vec<ReportStatus>, DomainError> {
        Ok(self.select(|r| &r.cycle_id == cycle_id))
    }

    async fn list_by_status(
        &self,
        cycle_id: &CycleId,
        status: QuestionStatus,
    ) -> Result<Vec<ReportStatus>, DomainError> {
        Ok(self.select(|r| &r.cycle_id == cycle_id && r.status == status))
    }

    async fn list_due_first_reminders(
        &self,
        now: Timestamp,
    ) -> Result<Vec<ReportStatus>, DomainError> {
        Ok(self.select(|r| {
            QuestionStatus::FIRST_REMINDER_TARGETS.contains(&r.status)
                && r.remind_at.map_or(false, |at| !at.is_after(&now))
        }))
    }

    async fn list_stalled_from_previous_day(
        &self,
        statuses: &[QuestionStatus],
        start: Timestamp,
        end: Timestamp,
    ) -> Result<Vec<ReportStatus>, DomainError> {
        let in_window = |at: Timestamp| !at.is_before(&start) && at.is_before(&end);
        Ok(self.select(|r| {
            statuses.contains(&r.status) && r.last_notified_at.map_or(false, in_window)
        }))
    }

    async fn all_confirmed(
        &self,
        participant_id: &ParticipantId,
        cycle_id: &CycleId,
        keys: &[ReportKey],
    ) -> Result<bool, DomainError> {
        Ok(self
            .select(|r| {
                &r.participant_id == participant_id
                    && &r.cycle_id == cycle_id
                    && keys.contains(&r.report_key)
            })
            .iter()
            .all(|r| r.status.is_confirmed()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn pending(participant: ParticipantId, cycle: CycleId, key: ReportKey) -> ReportStatus {
        ReportStatus::pending(participant, cycle, key, Timestamp::now())
    }

    #[tokio::test]
    async fn bulk_create_skips_existing_keys_without_aborting_siblings() {
        let store = InMemoryStatusStore::new();
        let (p, c) = (ParticipantId::new(), CycleId::new());
        store
            .create(&pending(p, c, ReportKey::Table1Lessons))
            .await
            .unwrap();

        let batch = vec![
            pending(p, c, ReportKey::Table1Lessons),
            pending(p, c, ReportKey::Table3Schedule),
        ];
        assert_eq!(store.bulk_create(&batch).await.unwrap(), 1);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn create_rejects_duplicate_composite_key() {
        let store = InMemoryStatusStore::new();
        let (p, c) = (ParticipantId::new(), CycleId::new());
        store
            .create(&pending(p, c, ReportKey::Table1Lessons))
            .await
            .unwrap();
        let err = store
            .create(&pending(p, c, ReportKey::Table1Lessons))
            .await
            .unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn update_of_missing_row_is_not_found() {
        let store = InMemoryStatusStore::new();
        let row = pending(
            ParticipantId::new(),
            CycleId::new(),
            ReportKey::Table1Lessons,
        );
        assert!(store.update(&row).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn update_if_status_refuses_stale_expectation() {
        let store = InMemoryStatusStore::new();
        let mut row = pending(
            ParticipantId::new(),
            CycleId::new(),
            ReportKey::Table1Lessons,
        );
        store.create(&row).await.unwrap();

        row.answer_yes(Timestamp::now()).unwrap();
        assert!(!store
            .update_if_status(&row, QuestionStatus::AnsweredNo)
            .await
            .unwrap());
        assert!(store
            .update_if_status(&row, QuestionStatus::PendingQuestion)
            .await
            .unwrap());
        let stored = store.get_by_id(&row.id).await.unwrap().unwrap();
        assert_eq!(stored.status, QuestionStatus::AnsweredYes);
    }

    #[tokio::test]
    async fn due_first_reminders_respect_remind_at() {
        let store = InMemoryStatusStore::new();
        let now = Timestamp::now();
        let mut row = pending(
            ParticipantId::new(),
            CycleId::new(),
            ReportKey::Table1Lessons,
        );
        row.answer_no(now, Duration::hours(1)).unwrap();
        store.create(&row).await.unwrap();

        assert!(store
            .list_due_first_reminders(now.plus_minutes(30))
            .await
            .unwrap()
            .is_empty());
        assert_eq!(
            store
                .list_due_first_reminders(now.plus_minutes(60))
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn deferred_questions_are_due_but_plain_pending_rows_are_not() {
        let store = InMemoryStatusStore::new();
        let now = Timestamp::now();
        let (p, c) = (ParticipantId::new(), CycleId::new());
        let mut deferred = pending(p, c, ReportKey::Table3Schedule);
        deferred.defer_question(now, Duration::hours(1)).unwrap();
        store.create(&deferred).await.unwrap();
        store.create(&pending(p, c, ReportKey::Table2Otv)).await.unwrap();

        let due = store
            .list_due_first_reminders(now.plus_minutes(60))
            .await
            .unwrap();

        assert_eq!(due, vec![deferred]);
    }

    #[tokio::test]
    async fn stalled_window_is_half_open() {
        let store = InMemoryStatusStore::new();
        let start = Timestamp::now();
        let end = start.plus_minutes(24 * 60);

        let mut at_start = pending(
            ParticipantId::new(),
            CycleId::new(),
            ReportKey::Table1Lessons,
        );
        at_start.mark_notified(start);
        let mut at_end = pending(
            ParticipantId::new(),
            CycleId::new(),
            ReportKey::Table1Lessons,
        );
        at_end.mark_notified(end);
        store.create(&at_start).await.unwrap();
        store.create(&at_end).await.unwrap();

        let stalled = store
            .list_stalled_from_previous_day(&QuestionStatus::NEXT_DAY_TARGETS, start, end)
            .await
            .unwrap();
        assert_eq!(stalled.len(), 1);
        assert_eq!(stalled[0].id, at_start.id);
    }

    #[tokio::test]
    async fn all_confirmed_ignores_missing_rows() {
        let store = InMemoryStatusStore::new();
        let (p, c) = (ParticipantId::new(), CycleId::new());
        let mut row = pending(p, c, ReportKey::Table1Lessons);
        row.answer_yes(Timestamp::now()).unwrap();
        store.create(&row).await.unwrap();

        let keys = [ReportKey::Table1Lessons, ReportKey::Table3Schedule];
        assert!(store.all_confirmed(&p, &c, &keys).await.unwrap());

        store
            .create(&pending(p, c, ReportKey::Table3Schedule))
            .await
            .unwrap();
        assert!(!store.all_confirmed(&p, &c, &keys).await.unwrap());
    }

    #[tokio::test]
    async fn list_by_status_filters_on_cycle_and_status() {
        let store = InMemoryStatusStore::new();
        let (p, c) = (ParticipantId::new(), CycleId::new());
        let mut confirmed = pending(p, c, ReportKey::Table1Lessons);
        confirmed.answer_yes(Timestamp::now()).unwrap();
        store.create(&confirmed).await.unwrap();
        store.create(&pending(p, c, ReportKey::Table3Schedule)).await.unwrap();
        store
            .create(&pending(p, CycleId::new(), ReportKey::Table1Lessons))
            .await
            .unwrap();

        let pending_rows = store
            .list_by_status(&c, QuestionStatus::PendingQuestion)
            .await
            .unwrap();
        assert_eq!(pending_rows.len(), 1);
        assert_eq!(pending_rows[0].report_key, ReportKey::Table3Schedule);

        let yes_rows = store.list_by_status(&c, QuestionStatus::AnsweredYes).await.unwrap();
        assert_eq!(yes_rows, vec![confirmed]);
    }
}
