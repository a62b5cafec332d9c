//! Opening a cycle: stage status rows and ask every participant the first
//! question.

use std::collections::HashSet;

use chrono::NaiveDate;
use tracing::{info, warn};

use super::{InitiateOutcome, WorkflowEngine};
use crate::domain::foundation::{DomainError, ParticipantId};
use crate::domain::notification::{Cycle, CycleType, QuestionStatus, ReportKey, ReportStatus};
use crate::domain::roster::Participant;

impl WorkflowEngine {
    /// Runs cycle setup for `(cycle_type, cycle_date)`.
    ///
    /// Safe to re-trigger: existing rows are left alone and only questions
    /// never delivered are sent.
    pub async fn initiate(
        &self,
        cycle_type: CycleType,
        cycle_date: NaiveDate,
    ) -> Result<InitiateOutcome, DomainError> {
        // 1. Resolve the cycle
        let cycle = self.cycles.resolve(cycle_date, cycle_type).await?;

        // 2. Roster
        let participants = self.roster.list_active().await?;
        if participants.is_empty() {
            info!(cycle_id = %cycle.id, %cycle_type, "No active participants, nothing to ask");
            return Ok(InitiateOutcome::empty(cycle));
        }

        // 3-4. Stage rows missing for this cycle
        let existing: HashSet<(ParticipantId, ReportKey)> = self
            .statuses
            .list_by_cycle(&cycle.id)
            .await?
            .into_iter()
            .map(|row| (row.participant_id, row.report_key))
            .collect();
        let now = self.clock.now();
        let staged: Vec<ReportStatus> = participants
            .iter()
            .flat_map(|p| cycle.expected_report_keys().iter().map(move |key| (p.id, *key)))
            .filter(|pair| !existing.contains(pair))
            .map(|(participant_id, key)| ReportStatus::pending(participant_id, cycle.id, key, now))
            .collect();

        // 5. Persist
        let rows_created = if staged.is_empty() {
            0
        } else {
            self.statuses.bulk_create(&staged).await?
        };

        // 6. First question, isolated per participant
        let mut outcome = InitiateOutcome {
            cycle,
            participants: participants.len(),
            rows_created,
            questions_sent: 0,
            failures: 0,
        };
        for participant in &participants {
            match self.ask_first_question(&outcome.cycle, participant).await {
                Ok(true) => outcome.questions_sent += 1,
                Ok(false) => {}
                Err(err) => {
                    warn!(
                        participant_id = %participant.id,
                        cycle_id = %outcome.cycle.id,
                        error = %err,
                        "Failed to ask first question"
                    );
                    outcome.failures += 1;
                }
            }
        }

        info!(
            cycle_id = %outcome.cycle.id,
            %cycle_type,
            %cycle_date,
            participants = outcome.participants,
            rows_created = outcome.rows_created,
            questions_sent = outcome.questions_sent,
            failures = outcome.failures,
            "Cycle initiated"
        );
        Ok(outcome)
    }

    /// Returns `true` when the question was delivered by this call.
    async fn ask_first_question(
        &self,
        cycle: &Cycle,
        participant: &Participant,
    ) -> Result<bool, DomainError> {
        let Some(mut row) = self
            .statuses
            .get_by_composite_key(&participant.id, &cycle.id, ReportKey::FIRST)
            .await?
        else {
            warn!(
                participant_id = %participant.id,
                cycle_id = %cycle.id,
                "First question row missing after staging"
            );
            return Ok(false);
        };
        if !row.awaiting_first_send() {
            return Ok(false);
        }

        self.send_question(participant, &row).await?;
        row.mark_notified(self.clock.now());
        self.commit(&row, QuestionStatus::PendingQuestion).await
    }
}
