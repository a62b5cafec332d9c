//! Time-driven escalation sweeps.
//!
//! Each row is handled on its own: a failure is logged and leaves the row
//! as it was, so the next firing picks it up again.

use tracing::{debug, info, warn};

use super::{SweepOutcome, WorkflowEngine};
use crate::domain::foundation::{DomainError, Timestamp};
use crate::domain::notification::{calendar, QuestionStatus, ReportStatus};

type Escalation = fn(&mut ReportStatus, Timestamp) -> Result<(), DomainError>;

enum Reminder {
    Sent,
    Skipped,
    Superseded,
}

impl WorkflowEngine {
    /// Re-asks every "No" whose one-hour delay has elapsed, and retries
    /// questions whose delivery failed earlier.
    pub async fn sweep_first_reminder(&self) -> Result<SweepOutcome, DomainError> {
        let now = self.clock.now();
        let due = self.statuses.list_due_first_reminders(now).await?;
        let outcome = self.escalate(due, now, due_reminder_sent).await;
        log_sweep("first_reminder", &outcome);
        Ok(outcome)
    }

    /// Final reminder for questions asked yesterday and still unanswered.
    pub async fn sweep_next_day(&self) -> Result<SweepOutcome, DomainError> {
        let now = self.clock.now();
        let (start, end) = calendar::previous_day_window(now, &self.settings.timezone);
        let stalled = self
            .statuses
            .list_stalled_from_previous_day(&QuestionStatus::NEXT_DAY_TARGETS, start, end)
            .await?;
        let outcome = self
            .escalate(stalled, now, ReportStatus::next_day_reminder_sent)
            .await;
        log_sweep("next_day", &outcome);
        Ok(outcome)
    }

    async fn escalate(
        &self,
        rows: Vec<ReportStatus>,
        now: Timestamp,
        step: Escalation,
    ) -> SweepOutcome {
        let mut outcome = SweepOutcome {
            due: rows.len(),
            ..SweepOutcome::default()
        };
        for row in rows {
            let status_id = row.id;
            match self.remind(row, now, step).await {
                Ok(Reminder::Sent) => outcome.reminded += 1,
                Ok(Reminder::Skipped) => outcome.skipped += 1,
                Ok(Reminder::Superseded) => outcome.superseded += 1,
                Err(err) => {
                    warn!(status_id = %status_id, error = %err, "Reminder failed, row stays due");
                    outcome.failed += 1;
                }
            }
        }
        outcome
    }

    async fn remind(
        &self,
        mut row: ReportStatus,
        now: Timestamp,
        step: Escalation,
    ) -> Result<Reminder, DomainError> {
        let participant = self.participant(&row.participant_id).await?;
        if !participant.is_active {
            debug!(
                status_id = %row.id,
                participant_id = %participant.id,
                "Participant inactive, reminder skipped"
            );
            if row.remind_at.is_some() {
                let prior = row.status;
                row.cancel_reminder(now);
                if !self.commit(&row, prior).await? {
                    return Ok(Reminder::Superseded);
                }
            }
            return Ok(Reminder::Skipped);
        }

        let prior = row.status;
        step(&mut row, now)?;
        self.send_question(&participant, &row).await?;
        if self.commit(&row, prior).await? {
            debug!(
                status_id = %row.id,
                participant_id = %participant.id,
                report_key = %row.report_key,
                status = %row.status,
                "Reminder sent"
            );
            Ok(Reminder::Sent)
        } else {
            Ok(Reminder::Superseded)
        }
    }
}

/// A deferred question is simply delivered; an armed "No" escalates.
fn due_reminder_sent(row: &mut ReportStatus, now: Timestamp) -> Result<(), DomainError> {
    if row.status == QuestionStatus::PendingQuestion {
        row.deferred_question_sent(now)
    } else {
        row.first_reminder_sent(now)
    }
}

fn log_sweep(sweep: &str, outcome: &SweepOutcome) {
    if outcome.due == 0 {
        debug!(sweep, "Nothing due");
        return;
    }
    info!(
        sweep,
        due = outcome.due,
        reminded = outcome.reminded,
        skipped = outcome.skipped,
        superseded = outcome.superseded,
        failed = outcome.failed,
        "Sweep finished"
    );
}
