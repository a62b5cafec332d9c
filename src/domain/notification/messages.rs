//! Participant- and supervisor-facing message texts.

use chrono::NaiveDate;

use super::{CycleType, ReportKey};

/// Label of the confirming button.
pub const YES_BUTTON: &str = "Yes";

/// Label of the declining button.
pub const NO_BUTTON: &str = "No";

/// Final message once every table of a cycle is confirmed.
pub const THANK_YOU: &str = "Thanks! All tables confirmed.";

/// Sent after a "No"; the question itself is repeated later by the sweeps.
pub const NO_ACKNOWLEDGEMENT: &str =
    "Got it. I will remind you about this table in a while.";

/// The question for `key`, addressed to `first_name`.
pub fn question(first_name: &str, key: ReportKey) -> String {
    format!(
        "Hi, {}! Is \"{}\" filled in?",
        first_name.trim(),
        key.title()
    )
}

/// Notice to the supervisor that a participant finished a cycle.
pub fn completion_notice(full_name: &str, cycle_type: CycleType, cycle_date: NaiveDate) -> String {
    format!(
        "{} has confirmed all tables for the {} cycle of {}.",
        full_name,
        cycle_type.label(),
        cycle_date.format("%Y-%m-%d")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_greets_and_names_the_table() {
        let text = question("Anna", ReportKey::Table3Schedule);
        assert!(text.starts_with("Hi, Anna!"));
        assert!(text.contains(ReportKey::Table3Schedule.title()));
    }

    #[test]
    fn completion_notice_names_participant_cycle_and_date() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 31).unwrap();
        assert_eq!(
            completion_notice("Anna Petrova", CycleType::EndMonth, date),
            "Anna Petrova has confirmed all tables for the end-of-month cycle of 2024-05-31."
        );
    }
}
