//! Roster domain - the people asked to confirm reports.

mod participant;

pub use participant::Participant;
