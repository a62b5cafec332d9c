//! WorkflowEngine - wiring, settings and outcome types.
//!
//! The operations themselves live in sibling modules:
//! - `initiate` - opening a cycle and asking the first question
//! - `responses` - Yes/No answers from participants
//! - `sweeps` - the one-hour and next-day escalations

use std::sync::Arc;

use chrono::Duration;
use chrono_tz::Tz;
use tracing::warn;

use crate::application::CycleManager;
use crate::domain::foundation::{ChatId, DomainError, ErrorCode, ParticipantId};
use crate::domain::notification::{messages, Cycle, QuestionStatus, ReportKey, ReportStatus};
use crate::domain::roster::Participant;
use crate::ports::{
    Clock, CycleRepository, NotifierGateway, ResponseButtons, RosterDirectory, StatusStore,
};

/// Tunables of the escalation ladder.
#[derive(Debug, Clone)]
pub struct WorkflowSettings {
    /// Delay between a "No" and the first reminder, and before retrying a
    /// question that failed to deliver.
    pub first_reminder_delay: Duration,
    /// Receives completion notices. When `None` they are skipped.
    pub supervisor_chat_id: Option<ChatId>,
    /// Zone in which "yesterday" is evaluated for the next-day sweep.
    pub timezone: Tz,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            first_reminder_delay: Duration::hours(1),
            supervisor_chat_id: None,
            timezone: Tz::UTC,
        }
    }
}

/// Result of [`WorkflowEngine::initiate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitiateOutcome {
    pub cycle: Cycle,
    /// Active participants at the time of the run.
    pub participants: usize,
    /// Status rows inserted by this run.
    pub rows_created: u64,
    /// First questions delivered by this run.
    pub questions_sent: usize,
    /// Participants whose first question could not be delivered or recorded.
    pub failures: usize,
}

impl InitiateOutcome {
    pub(super) fn empty(cycle: Cycle) -> Self {
        Self {
            cycle,
            participants: 0,
            rows_created: 0,
            questions_sent: 0,
            failures: 0,
        }
    }
}

/// What a Yes/No callback did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseOutcome {
    /// The status row no longer exists; the click is acknowledged only.
    Stale,
    /// Repeated click on a row already in the answered state.
    AlreadyHandled,
    /// Another writer changed the row between read and write.
    Superseded,
    /// "No" recorded; the first reminder is armed.
    ReminderArmed,
    /// "Yes" recorded and the next question was asked.
    Advanced(ReportKey),
    /// "Yes" recorded but the next question could not be delivered; the
    /// first-reminder sweep retries it.
    Deferred(ReportKey),
    /// "Yes" recorded and every expected table is now confirmed.
    Completed,
}

/// Counters reported by a sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepOutcome {
    /// Rows the sweep query returned.
    pub due: usize,
    /// Reminders delivered and recorded.
    pub reminded: usize,
    /// Rows of inactive participants; nothing is sent and their armed
    /// reminder is dropped.
    pub skipped: usize,
    /// Rows changed by a concurrent writer after the query.
    pub superseded: usize,
    /// Rows whose delivery or update failed; they stay due.
    pub failed: usize,
}

/// The notification state machine.
pub struct WorkflowEngine {
    pub(super) cycles: CycleManager,
    pub(super) cycle_repository: Arc<dyn CycleRepository>,
    pub(super) statuses: Arc<dyn StatusStore>,
    pub(super) roster: Arc<dyn RosterDirectory>,
    pub(super) notifier: Arc<dyn NotifierGateway>,
    pub(super) clock: Arc<dyn Clock>,
    pub(super) settings: WorkflowSettings,
}

impl WorkflowEngine {
    pub fn new(
        cycle_repository: Arc<dyn CycleRepository>,
        statuses: Arc<dyn StatusStore>,
        roster: Arc<dyn RosterDirectory>,
        notifier: Arc<dyn NotifierGateway>,
        clock: Arc<dyn Clock>,
        settings: WorkflowSettings,
    ) -> Self {
        Self {
            cycles: CycleManager::new(cycle_repository.clone(), clock.clone()),
            cycle_repository,
            statuses,
            roster,
            notifier,
            clock,
            settings,
        }
    }

    pub fn settings(&self) -> &WorkflowSettings {
        &self.settings
    }

    /// Sends the question tracked by `row` with fresh answer buttons.
    pub(super) async fn send_question(
        &self,
        participant: &Participant,
        row: &ReportStatus,
    ) -> Result<(), DomainError> {
        let text = messages::question(participant.display_name(), row.report_key);
        let buttons = ResponseButtons::for_status(row.id);
        self.notifier
            .send(participant.chat_id, &text, Some(&buttons))
            .await
    }

    pub(super) async fn participant(&self, id: &ParticipantId) -> Result<Participant, DomainError> {
        self.roster.find_by_id(id).await?.ok_or_else(|| {
            DomainError::new(
                ErrorCode::ParticipantNotFound,
                format!("Participant not found: {}", id),
            )
        })
    }

    /// Writes `row` only if the stored status is still `expected`.
    ///
    /// Returns `false`, after logging, when a concurrent writer got there first.
    pub(super) async fn commit(
        &self,
        row: &ReportStatus,
        expected: QuestionStatus,
    ) -> Result<bool, DomainError> {
        let applied = self.statuses.update_if_status(row, expected).await?;
        if !applied {
            warn!(
                status_id = %row.id,
                participant_id = %row.participant_id,
                report_key = %row.report_key,
                expected = %expected,
                "Status changed concurrently, transition dropped"
            );
        }
        Ok(applied)
    }
}
