//! Foundation module - Shared domain primitives.
//!
//! Contains identifiers, the timestamp value object, the state machine
//! trait and the error taxonomy shared by every other layer.

mod errors;
mod ids;
mod state_machine;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ErrorKind, ValidationError};
pub use ids::{ChatId, CycleId, ParticipantId, ReportStatusId};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
