//! Handling participant answers.

use tracing::{info, warn};

use super::{ResponseOutcome, WorkflowEngine};
use crate::domain::foundation::{
    CycleId, DomainError, ErrorCode, ParticipantId, ReportStatusId,
};
use crate::domain::notification::{messages, Cycle, ReportKey, ReportStatus};
use crate::domain::roster::Participant;

impl WorkflowEngine {
    /// The participant confirmed the table behind `status_id`.
    ///
    /// Either asks the next unconfirmed table of the cycle or, once all are
    /// confirmed, notifies the supervisor and thanks the participant.
    pub async fn process_yes(
        &self,
        status_id: ReportStatusId,
    ) -> Result<ResponseOutcome, DomainError> {
        // 1. Load
        let Some(mut row) = self.statuses.get_by_id(&status_id).await? else {
            info!(status_id = %status_id, "Yes for unknown status row, ignoring");
            return Ok(ResponseOutcome::Stale);
        };

        // 2. Double-click guard
        if row.status.is_confirmed() {
            return Ok(ResponseOutcome::AlreadyHandled);
        }

        // 3. Record the answer
        let prior = row.status;
        row.answer_yes(self.clock.now())?;
        if !self.commit(&row, prior).await? {
            return Ok(ResponseOutcome::Superseded);
        }
        info!(
            status_id = %row.id,
            participant_id = %row.participant_id,
            report_key = %row.report_key,
            "Answer Yes recorded"
        );

        // 4. Context
        let participant = self.participant(&row.participant_id).await?;
        let cycle = self
            .cycle_repository
            .find_by_id(&row.cycle_id)
            .await?
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::CycleNotFound,
                    format!("Cycle not found: {}", row.cycle_id),
                )
            })?;

        // 5. Next question or completion
        match self.next_unconfirmed(&participant.id, &cycle).await? {
            None => {
                self.complete(&participant, &cycle).await;
                Ok(ResponseOutcome::Completed)
            }
            Some(next) => {
                let key = next.report_key;
                if self.ask_next(&participant, next).await {
                    Ok(ResponseOutcome::Advanced(key))
                } else {
                    Ok(ResponseOutcome::Deferred(key))
                }
            }
        }
    }

    /// The participant has not filled in the table yet.
    ///
    /// Arms the first reminder and acknowledges; the next question is not asked.
    pub async fn process_no(
        &self,
        status_id: ReportStatusId,
    ) -> Result<ResponseOutcome, DomainError> {
        let Some(mut row) = self.statuses.get_by_id(&status_id).await? else {
            info!(status_id = %status_id, "No for unknown status row, ignoring");
            return Ok(ResponseOutcome::Stale);
        };

        // Already escalating, or confirmed: do not re-arm.
        if row.status.is_confirmed() || row.status.is_escalating() {
            return Ok(ResponseOutcome::AlreadyHandled);
        }

        let prior = row.status;
        row.answer_no(self.clock.now(), self.settings.first_reminder_delay)?;
        if !self.commit(&row, prior).await? {
            return Ok(ResponseOutcome::Superseded);
        }
        info!(
            status_id = %row.id,
            participant_id = %row.participant_id,
            report_key = %row.report_key,
            "Answer No recorded, reminder armed"
        );

        let participant = self.participant(&row.participant_id).await?;
        if let Err(err) = self
            .notifier
            .send(participant.chat_id, messages::NO_ACKNOWLEDGEMENT, None)
            .await
        {
            warn!(status_id = %row.id, error = %err, "Failed to acknowledge No");
        }
        Ok(ResponseOutcome::ReminderArmed)
    }

    /// First expected table, in asking order, not yet confirmed.
    ///
    /// A table without a row is treated as pending and its row is created.
    async fn next_unconfirmed(
        &self,
        participant_id: &ParticipantId,
        cycle: &Cycle,
    ) -> Result<Option<ReportStatus>, DomainError> {
        for &key in cycle.expected_report_keys() {
            match self
                .statuses
                .get_by_composite_key(participant_id, &cycle.id, key)
                .await?
            {
                Some(row) if row.status.is_confirmed() => continue,
                Some(row) => return Ok(Some(row)),
                None => {
                    warn!(
                        participant_id = %participant_id,
                        cycle_id = %cycle.id,
                        report_key = %key,
                        "Expected status row missing, creating it"
                    );
                    return self.create_missing(*participant_id, cycle.id, key).await.map(Some);
                }
            }
        }
        Ok(None)
    }

    async fn create_missing(
        &self,
        participant_id: ParticipantId,
        cycle_id: CycleId,
        key: ReportKey,
    ) -> Result<ReportStatus, DomainError> {
        let row = ReportStatus::pending(participant_id, cycle_id, key, self.clock.now());
        match self.statuses.create(&row).await {
            Ok(()) => Ok(row),
            Err(err) if err.is_conflict() => self
                .statuses
                .get_by_composite_key(&participant_id, &cycle_id, key)
                .await?
                .ok_or_else(|| {
                    DomainError::new(
                        ErrorCode::ReportStatusNotFound,
                        format!("Status row for {} vanished after conflict", key),
                    )
                }),
            Err(err) => Err(err),
        }
    }

    /// Asks `next` and returns whether it was delivered.
    ///
    /// A delivered question is recorded as re-asked. An undelivered one is
    /// deferred so the first-reminder sweep retries it.
    async fn ask_next(&self, participant: &Participant, mut next: ReportStatus) -> bool {
        let prior = next.status;
        let now = self.clock.now();
        let delivered = match self.send_question(participant, &next).await {
            Ok(()) => true,
            Err(err) => {
                warn!(
                    status_id = %next.id,
                    participant_id = %participant.id,
                    report_key = %next.report_key,
                    error = %err,
                    "Failed to ask next question, deferring it"
                );
                false
            }
        };

        let staged = if delivered {
            next.reask(now)
        } else {
            next.defer_question(now, self.settings.first_reminder_delay)
        };
        let recorded = match staged {
            Ok(()) => self.commit(&next, prior).await.map(|_| ()),
            Err(err) => Err(err),
        };
        if let Err(err) = recorded {
            warn!(status_id = %next.id, error = %err, "Failed to record next question");
        }
        delivered
    }

    /// Completion notice to the supervisor, then the thank-you.
    async fn complete(&self, participant: &Participant, cycle: &Cycle) {
        info!(
            participant_id = %participant.id,
            cycle_id = %cycle.id,
            "All tables confirmed"
        );

        match self.settings.supervisor_chat_id {
            Some(supervisor) => {
                let notice = messages::completion_notice(
                    &participant.full_name(),
                    cycle.cycle_type,
                    cycle.cycle_date,
                );
                if let Err(err) = self.notifier.send(supervisor, &notice, None).await {
                    warn!(
                        participant_id = %participant.id,
                        error = %err,
                        "Failed to notify supervisor"
                    );
                }
            }
            None => warn!(
                participant_id = %participant.id,
                "Supervisor chat not configured, completion notice skipped"
            ),
        }

        if let Err(err) = self
            .notifier
            .send(participant.chat_id, messages::THANK_YOU, None)
            .await
        {
            warn!(participant_id = %participant.id, error = %err, "Failed to send thank-you");
        }
    }
}
