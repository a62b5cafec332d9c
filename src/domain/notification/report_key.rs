//! The fixed, ordered set of report questions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{DomainError, ErrorCode};

/// Identifies one report table a participant is asked about.
///
/// Declaration order is the asking order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ReportKey {
    #[serde(rename = "TABLE_1_LESSONS")]
    Table1Lessons,
    #[serde(rename = "TABLE_3_SCHEDULE")]
    Table3Schedule,
    #[serde(rename = "TABLE_2_OTV")]
    Table2Otv,
}

impl ReportKey {
    /// Every key, in asking order.
    pub const ALL: [ReportKey; 3] = [
        ReportKey::Table1Lessons,
        ReportKey::Table3Schedule,
        ReportKey::Table2Otv,
    ];

    /// The question that opens every cycle.
    pub const FIRST: ReportKey = ReportKey::Table1Lessons;

    /// Persisted representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKey::Table1Lessons => "TABLE_1_LESSONS",
            ReportKey::Table3Schedule => "TABLE_3_SCHEDULE",
            ReportKey::Table2Otv => "TABLE_2_OTV",
        }
    }

    /// Title of the table as shown to participants.
    pub fn title(&self) -> &'static str {
        match self {
            ReportKey::Table1Lessons => "Table 1: Lessons held (report for the current period)",
            ReportKey::Table3Schedule => "Table 3: Schedule (up-to-date check)",
            ReportKey::Table2Otv => "Table 2: OTV table (all lessons held to date)",
        }
    }
}

impl fmt::Display for ReportKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportKey {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReportKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::UnrecognizedReportKey,
                    format!("Unknown report key: {}", s),
                )
            })
    }
}
