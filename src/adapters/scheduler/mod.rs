//! Time-driven triggers for the workflow.

mod reminder_scheduler;

pub use reminder_scheduler::{next_fire, Job, JobReport, ReminderScheduler, ScheduledJob};
