//! StatusStore port - persistence of per-question status rows.
//!
//! Pure data access. Transition rules live in the domain and the workflow
//! engine; implementations only enforce uniqueness and existence.
//!
//! # Uniqueness
//!
//! At most one row exists per `(participant_id, cycle_id, report_key)`.

use async_trait::async_trait;

use crate::domain::foundation::{CycleId, DomainError, ParticipantId, ReportStatusId, Timestamp};
use crate::domain::notification::{QuestionStatus, ReportKey, ReportStatus};

/// Store for [`ReportStatus`] rows.
#[async_trait]
pub trait StatusStore: Send + Sync {
    /// Persist a single new row.
    ///
    /// # Errors
    ///
    /// - `ReportStatusExists` if the composite key is already taken
    /// - `DatabaseError` on persistence failure
    async fn create(&self, row: &ReportStatus) -> Result<(), DomainError>;

    /// Persist a batch of new rows atomically.
    ///
    /// A row whose composite key already exists is skipped, not an error,
    /// and does not abort its siblings. Returns the number inserted.
    async fn bulk_create(&self, rows: &[ReportStatus]) -> Result<u64, DomainError>;

    async fn get_by_composite_key(
        &self,
        participant_id: &ParticipantId,
        cycle_id: &CycleId,
        report_key: ReportKey,
    ) -> Result<Option<ReportStatus>, DomainError>;

    async fn get_by_id(&self, id: &ReportStatusId) -> Result<Option<ReportStatus>, DomainError>;

    /// Replace the mutable fields (`status`, `last_notified_at`, `remind_at`,
    /// `response_attempts`, `updated_at`) of an existing row.
    ///
    /// # Errors
    ///
    /// - `ReportStatusNotFound` if the id no longer exists
    async fn update(&self, row: &ReportStatus) -> Result<(), DomainError>;

    /// Like [`update`](Self::update), but only applies when the stored status
    /// still equals `expected`.
    ///
    /// Returns `false` when another writer changed the status first.
    ///
    /// # Errors
    ///
    /// - `ReportStatusNotFound` if the id no longer exists
    async fn update_if_status(
        &self,
        row: &ReportStatus,
        expected: QuestionStatus,
    ) -> Result<bool, DomainError>;

    async fn list_by_cycle(&self, cycle_id: &CycleId) -> Result<Vec<ReportStatus>, DomainError>;

    async fn list_by_status(
        &self,
        cycle_id: &CycleId,
        status: QuestionStatus,
    ) -> Result<Vec<ReportStatus>, DomainError>;

    /// Rows in [`QuestionStatus::FIRST_REMINDER_TARGETS`] whose `remind_at`
    /// is at or before `now`.
    async fn list_due_first_reminders(
        &self,
        now: Timestamp,
    ) -> Result<Vec<ReportStatus>, DomainError>;

    /// Rows in one of `statuses` last notified within `[start, end)`.
    async fn list_stalled_from_previous_day(
        &self,
        statuses: &[QuestionStatus],
        start: Timestamp,
        end: Timestamp,
    ) -> Result<Vec<ReportStatus>, DomainError>;

    /// True iff none of the participant's rows for `keys` in this cycle has a
    /// status other than `ANSWERED_YES`.
    ///
    /// A key without a row does not count against the result.
    async fn all_confirmed(
        &self,
        participant_id: &ParticipantId,
        cycle_id: &CycleId,
        keys: &[ReportKey],
    ) -> Result<bool, DomainError>;
}
