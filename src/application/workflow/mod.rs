//! Notification workflow - the per-question state machine in action.

mod engine;
mod initiate;
mod responses;
mod sweeps;

#[cfg(test)]
mod tests;

pub use engine::{InitiateOutcome, ResponseOutcome, SweepOutcome, WorkflowEngine, WorkflowSettings};
