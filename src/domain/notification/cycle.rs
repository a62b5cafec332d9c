//! Notification cycle: one scheduled run, keyed by (date, type).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ReportKey;
use crate::domain::foundation::{CycleId, DomainError, ErrorCode, Timestamp};

/// Which calendar trigger produced a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CycleType {
    /// Fixed day-of-month run (the 15th by default).
    MidMonth,
    /// Last calendar day of the month.
    EndMonth,
}

impl CycleType {
    /// Persisted representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            CycleType::MidMonth => "MID_MONTH",
            CycleType::EndMonth => "END_MONTH",
        }
    }

    /// Questions expected for this cycle type, in asking order.
    pub fn expected_report_keys(&self) -> &'static [ReportKey] {
        match self {
            CycleType::MidMonth => &[ReportKey::Table1Lessons, ReportKey::Table3Schedule],
            CycleType::EndMonth => &[
                ReportKey::Table1Lessons,
                ReportKey::Table3Schedule,
                ReportKey::Table2Otv,
            ],
        }
    }

    /// Human label used in supervisor notices.
    pub fn label(&self) -> &'static str {
        match self {
            CycleType::MidMonth => "mid-month",
            CycleType::EndMonth => "end-of-month",
        }
    }
}

impl fmt::Display for CycleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CycleType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MID_MONTH" => Ok(CycleType::MidMonth),
            "END_MONTH" => Ok(CycleType::EndMonth),
            other => Err(DomainError::new(
                ErrorCode::UnrecognizedCycleType,
                format!("Unknown cycle type: {}", other),
            )),
        }
    }
}

/// A single notification run.
///
/// `(cycle_date, cycle_type)` is the natural key: at most one cycle exists
/// per pair. Cycles are never updated once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cycle {
    pub id: CycleId,
    pub cycle_date: NaiveDate,
    pub cycle_type: CycleType,
    pub created_at: Timestamp,
}

impl Cycle {
    /// Creates a new cycle with a fresh id.
    pub fn new(cycle_date: NaiveDate, cycle_type: CycleType, created_at: Timestamp) -> Self {
        Self {
            id: CycleId::new(),
            cycle_date,
            cycle_type,
            created_at,
        }
    }

    /// Questions this cycle expects from every participant, in asking order.
    pub fn expected_report_keys(&self) -> &'static [ReportKey] {
        self.cycle_type.expected_report_keys()
    }

    /// True when `(date, cycle_type)` is this cycle's natural key.
    pub fn matches(&self, date: NaiveDate, cycle_type: CycleType) -> bool {
        self.cycle_date == date && self.cycle_type == cycle_type
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mid_month_expects_two_tables_in_order() {
        assert_eq!(
            CycleType::MidMonth.expected_report_keys(),
            &[ReportKey::Table1Lessons, ReportKey::Table3Schedule]
        );
    }

    #[test]
    fn end_month_is_a_superset_asked_in_fixed_order() {
        assert_eq!(
            CycleType::EndMonth.expected_report_keys(),
            &[
                ReportKey::Table1Lessons,
                ReportKey::Table3Schedule,
                ReportKey::Table2Otv
            ]
        );
    }

    #[test]
    fn cycle_type_parses_persisted_values() {
        assert_eq!(
            "MID_MONTH".parse::<CycleType>().unwrap(),
            CycleType::MidMonth
        );
        assert_eq!(
            "END_MONTH".parse::<CycleType>().unwrap(),
            CycleType::EndMonth
        );
        let err = "WEEKLY".parse::<CycleType>().unwrap_err();
        assert_eq!(err.code, ErrorCode::UnrecognizedCycleType);
    }

    #[test]
    fn cycle_matches_its_natural_key() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 15).unwrap();
        let cycle = Cycle::new(date, CycleType::MidMonth, Timestamp::now());
        assert!(cycle.matches(date, CycleType::MidMonth));
        assert!(!cycle.matches(date, CycleType::EndMonth));
    }

    #[test]
    fn serializes_type_in_screaming_snake_case() {
        assert_eq!(
            serde_json::to_string(&CycleType::EndMonth).unwrap(),
            "\"END_MONTH\""
        );
    }
}
