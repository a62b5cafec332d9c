//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, state machine, errors)
//! - `notification` - Cycles, report keys, question status and message texts
//! - `roster` - Participants asked to confirm reports

pub mod foundation;
pub mod notification;
pub mod roster;
