//! Notification domain - cycles, report questions and their status ladder.

pub mod calendar;
mod cycle;
pub mod messages;
mod report_key;
mod report_status;
mod response;
mod status;

pub use cycle::{Cycle, CycleType};
pub use report_key::ReportKey;
pub use report_status::ReportStatus;
pub use response::{Intent, ResponseToken, MAX_TOKEN_LEN};
pub use status::QuestionStatus;
