//! ReportStatus entity - one question, for one participant, in one cycle.
//!
//! Every mutation goes through a method that validates the edge against
//! [`QuestionStatus`]'s state machine and stamps `updated_at`.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::{QuestionStatus, ReportKey};
use crate::domain::foundation::{
    CycleId, DomainError, ErrorCode, ParticipantId, ReportStatusId, StateMachine, Timestamp,
};

/// Tracked state of one question.
///
/// Unique per `(participant_id, cycle_id, report_key)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportStatus {
    pub id: ReportStatusId,
    pub participant_id: ParticipantId,
    pub cycle_id: CycleId,
    pub report_key: ReportKey,
    pub status: QuestionStatus,
    pub last_notified_at: Option<Timestamp>,
    /// When the first-reminder sweep should pick the row up: the reminder
    /// after a "No", or the retry of a question that failed to deliver.
    pub remind_at: Option<Timestamp>,
    pub response_attempts: u32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ReportStatus {
    /// Stages a fresh, never-asked question.
    pub fn pending(
        participant_id: ParticipantId,
        cycle_id: CycleId,
        report_key: ReportKey,
        now: Timestamp,
    ) -> Self {
        Self {
            id: ReportStatusId::new(),
            participant_id,
            cycle_id,
            report_key,
            status: QuestionStatus::PendingQuestion,
            last_notified_at: None,
            remind_at: None,
            response_attempts: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// True for a pending question nobody has been told about yet.
    pub fn awaiting_first_send(&self) -> bool {
        self.status == QuestionStatus::PendingQuestion && self.last_notified_at.is_none()
    }

    /// Records a successful delivery of this question.
    pub fn mark_notified(&mut self, now: Timestamp) {
        self.last_notified_at = Some(now);
        self.updated_at = now;
    }

    /// The participant confirmed the table is filled in.
    pub fn answer_yes(&mut self, now: Timestamp) -> Result<(), DomainError> {
        self.status = self.status.transition_to(QuestionStatus::AnsweredYes)?;
        self.remind_at = None;
        self.updated_at = now;
        Ok(())
    }

    /// The participant said "not yet"; arm the first reminder.
    pub fn answer_no(
        &mut self,
        now: Timestamp,
        reminder_delay: Duration,
    ) -> Result<(), DomainError> {
        self.status = self.status.transition_to(QuestionStatus::AnsweredNo)?;
        self.remind_at = Some(now.plus(reminder_delay));
        self.response_attempts += 1;
        self.updated_at = now;
        Ok(())
    }

    /// The question was asked again as the next step in the sequence.
    ///
    /// A row that is already pending only gets a fresh notification stamp.
    pub fn reask(&mut self, now: Timestamp) -> Result<(), DomainError> {
        if self.status != QuestionStatus::PendingQuestion {
            self.status = self.status.transition_to(QuestionStatus::PendingQuestion)?;
        }
        self.remind_at = None;
        self.mark_notified(now);
        Ok(())
    }

    /// The question became the next one to ask but could not be delivered.
    ///
    /// The row is pending again and due for the first-reminder sweep after
    /// `retry_delay`; `last_notified_at` is left alone.
    pub fn defer_question(
        &mut self,
        now: Timestamp,
        retry_delay: Duration,
    ) -> Result<(), DomainError> {
        if self.status != QuestionStatus::PendingQuestion {
            self.status = self.status.transition_to(QuestionStatus::PendingQuestion)?;
        }
        self.remind_at = Some(now.plus(retry_delay));
        self.updated_at = now;
        Ok(())
    }

    /// A deferred question was finally delivered by a sweep.
    pub fn deferred_question_sent(&mut self, now: Timestamp) -> Result<(), DomainError> {
        if self.status != QuestionStatus::PendingQuestion {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!("Cannot deliver a deferred question from {:?}", self.status),
            ));
        }
        self.remind_at = None;
        self.mark_notified(now);
        Ok(())
    }

    /// Drops an armed reminder without sending anything.
    pub fn cancel_reminder(&mut self, now: Timestamp) {
        self.remind_at = None;
        self.updated_at = now;
    }

    /// The one-hour reminder was delivered.
    pub fn first_reminder_sent(&mut self, now: Timestamp) -> Result<(), DomainError> {
        self.status = self.status.transition_to(QuestionStatus::AwaitingReminder1h)?;
        self.remind_at = None;
        self.mark_notified(now);
        Ok(())
    }

    /// The next-day reminder was delivered; no further automated escalation.
    pub fn next_day_reminder_sent(&mut self, now: Timestamp) -> Result<(), DomainError> {
        self.status = self.status.transition_to(QuestionStatus::NextDayReminderSent)?;
        self.remind_at = None;
        self.response_attempts += 1;
        self.mark_notified(now);
        Ok(())
    }
}
