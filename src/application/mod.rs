//! Application layer - services orchestrating the domain through ports.
//!
//! - `CycleManager` - find-or-create of notification cycles
//! - `WorkflowEngine` - initiation, answers and escalation sweeps
//! - `ResponseIngress` - decoding button callbacks into workflow calls

mod cycle_manager;
pub mod response_ingress;
pub mod workflow;

pub use cycle_manager::CycleManager;
pub use response_ingress::ResponseIngress;
pub use workflow::{
    InitiateOutcome, ResponseOutcome, SweepOutcome, WorkflowEngine, WorkflowSettings,
};
