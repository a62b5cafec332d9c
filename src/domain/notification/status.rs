//! QuestionStatus enum tracking one question's escalation ladder.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{DomainError, ErrorCode, StateMachine};

/// Where a single question stands for one participant in one cycle.
///
/// There is no "all done" value; completion is derived from every expected
/// question being `AnsweredYes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionStatus {
    #[default]
    PendingQuestion,
    AnsweredYes,
    AnsweredNo,
    #[serde(rename = "AWAITING_REMINDER_1H")]
    AwaitingReminder1h,
    NextDayReminderSent,
}

impl QuestionStatus {
    /// Statuses the first-reminder sweep picks up once `remind_at` elapses:
    /// an armed "No" and a deferred question.
    pub const FIRST_REMINDER_TARGETS: [QuestionStatus; 2] = [
        QuestionStatus::AnsweredNo,
        QuestionStatus::PendingQuestion,
    ];

    /// Statuses the next-day sweep targets.
    pub const NEXT_DAY_TARGETS: [QuestionStatus; 2] = [
        QuestionStatus::PendingQuestion,
        QuestionStatus::AwaitingReminder1h,
    ];

    /// Persisted representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionStatus::PendingQuestion => "PENDING_QUESTION",
            QuestionStatus::AnsweredYes => "ANSWERED_YES",
            QuestionStatus::AnsweredNo => "ANSWERED_NO",
            QuestionStatus::AwaitingReminder1h => "AWAITING_REMINDER_1H",
            QuestionStatus::NextDayReminderSent => "NEXT_DAY_REMINDER_SENT",
        }
    }

    /// True once the participant has confirmed this question.
    pub fn is_confirmed(&self) -> bool {
        matches!(self, QuestionStatus::AnsweredYes)
    }

    /// True when a "No" is already being escalated, so another "No" must not
    /// re-arm the reminder.
    pub fn is_escalating(&self) -> bool {
        matches!(
            self,
            QuestionStatus::AnsweredNo
                | QuestionStatus::AwaitingReminder1h
                | QuestionStatus::NextDayReminderSent
        )
    }
}

impl StateMachine for QuestionStatus {
    fn valid_transitions(&self) -> &'static [Self] {
        use QuestionStatus::*;
        match self {
            PendingQuestion => &[AnsweredYes, AnsweredNo, NextDayReminderSent],
            AnsweredNo => &[AnsweredYes, AwaitingReminder1h, PendingQuestion],
            AwaitingReminder1h => &[AnsweredYes, NextDayReminderSent, PendingQuestion],
            NextDayReminderSent => &[AnsweredYes, PendingQuestion],
            AnsweredYes => &[],
        }
    }
}

impl fmt::Display for QuestionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING_QUESTION" => Ok(QuestionStatus::PendingQuestion),
            "ANSWERED_YES" => Ok(QuestionStatus::AnsweredYes),
            "ANSWERED_NO" => Ok(QuestionStatus::AnsweredNo),
            "AWAITING_REMINDER_1H" => Ok(QuestionStatus::AwaitingReminder1h),
            "NEXT_DAY_REMINDER_SENT" => Ok(QuestionStatus::NextDayReminderSent),
            other => Err(DomainError::new(
                ErrorCode::UnrecognizedStatus,
                format!("Unknown question status: {}", other),
            )),
        }
    }
}
