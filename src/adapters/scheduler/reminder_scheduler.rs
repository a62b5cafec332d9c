//! ReminderScheduler - cron timers driving the workflow.
//!
//! Each job runs in its own task: it sleeps until the next cron firing in
//! the configured zone, runs under a deadline and loops. A failing or slow
//! job never delays the others. The scheduler holds no state of its own;
//! rows left unprocessed by a failed or timed-out run are due again at the
//! next firing.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use cron::Schedule;
use futures::future::join_all;
use tokio::sync::watch;
use tokio::time;
use tracing::{debug, error, info, warn};

use crate::application::workflow::{InitiateOutcome, SweepOutcome, WorkflowEngine};
use crate::config::{SchedulerConfig, ValidationError};
use crate::domain::foundation::{DomainError, Timestamp};
use crate::domain::notification::{calendar, CycleType};
use crate::ports::Clock;

/// The four timers of the escalation ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Job {
    /// Opens the mid-month cycle.
    MidMonthInitiate,
    /// Opens the end-of-month cycle when today is the last day.
    EndMonthCheck,
    /// Re-asks elapsed "No" answers.
    FirstReminderSweep,
    /// Final reminder for yesterday's unanswered questions.
    NextDaySweep,
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Job::MidMonthInitiate => "mid_month_initiate",
            Job::EndMonthCheck => "end_month_check",
            Job::FirstReminderSweep => "first_reminder_sweep",
            Job::NextDaySweep => "next_day_sweep",
        };
        write!(f, "{}", s)
    }
}

/// A job bound to its cron schedule and deadline.
#[derive(Debug, Clone)]
pub struct ScheduledJob {
    pub job: Job,
    pub schedule: Schedule,
    pub timeout: Duration,
}

/// What one firing did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobReport {
    Initiated(InitiateOutcome),
    NotLastDay,
    Swept(SweepOutcome),
}

/// Runs the workflow timers until shutdown.
pub struct ReminderScheduler {
    engine: Arc<WorkflowEngine>,
    clock: Arc<dyn Clock>,
    timezone: Tz,
    jobs: Vec<ScheduledJob>,
}

impl ReminderScheduler {
    pub fn new(
        engine: Arc<WorkflowEngine>,
        clock: Arc<dyn Clock>,
        timezone: Tz,
        jobs: Vec<ScheduledJob>,
    ) -> Self {
        Self {
            engine,
            clock,
            timezone,
            jobs,
        }
    }

    /// Builds the four standard jobs from configuration.
    pub fn from_config(
        engine: Arc<WorkflowEngine>,
        clock: Arc<dyn Clock>,
        config: &SchedulerConfig,
    ) -> Result<Self, ValidationError> {
        let jobs = vec![
            ScheduledJob {
                job: Job::MidMonthInitiate,
                schedule: config.mid_month_schedule()?,
                timeout: config.initiate_timeout(),
            },
            ScheduledJob {
                job: Job::EndMonthCheck,
                schedule: config.end_month_check_schedule()?,
                timeout: config.initiate_timeout(),
            },
            ScheduledJob {
                job: Job::FirstReminderSweep,
                schedule: config.first_reminder_schedule()?,
                timeout: config.first_reminder_timeout(),
            },
            ScheduledJob {
                job: Job::NextDaySweep,
                schedule: config.next_day_schedule()?,
                timeout: config.next_day_timeout(),
            },
        ];
        Ok(Self::new(engine, clock, config.tz()?, jobs))
    }

    pub fn jobs(&self) -> &[ScheduledJob] {
        &self.jobs
    }

    /// Run every timer until shutdown signal is received.
    pub async fn run(self: Arc<Self>, shutdown: watch::Receiver<bool>) {
        info!(jobs = self.jobs.len(), timezone = %self.timezone, "Reminder scheduler started");

        let timers = (0..self.jobs.len()).map(|index| {
            let scheduler = Arc::clone(&self);
            let shutdown = shutdown.clone();
            tokio::spawn(async move { scheduler.run_timer(index, shutdown).await })
        });
        for joined in join_all(timers).await {
            if let Err(err) = joined {
                error!(error = %err, "Scheduler timer task panicked");
            }
        }

        info!("Reminder scheduler stopped");
    }

    async fn run_timer(&self, index: usize, mut shutdown: watch::Receiver<bool>) {
        let scheduled = &self.jobs[index];
        let job = scheduled.job;

        loop {
            let now = self.clock.now();
            let Some(next) = next_fire(&scheduled.schedule, &self.timezone, now) else {
                warn!(%job, "Schedule has no upcoming firing, timer stopped");
                return;
            };
            let wait = (next - *now.as_datetime()).to_std().unwrap_or(Duration::ZERO);
            debug!(%job, next_fire = %next, "Timer armed");

            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        return;
                    }
                    continue;
                }
                _ = time::sleep(wait) => {}
            }

            match time::timeout(scheduled.timeout, self.fire(job)).await {
                Ok(Ok(report)) => debug!(%job, ?report, "Job finished"),
                Ok(Err(err)) => error!(%job, error = %err, "Job failed"),
                Err(_) => warn!(
                    %job,
                    timeout_secs = scheduled.timeout.as_secs(),
                    "Job timed out, remaining rows stay due"
                ),
            }
        }
    }

    /// Runs one job immediately.
    pub async fn fire(&self, job: Job) -> Result<JobReport, DomainError> {
        let today = self.clock.now().date_in(&self.timezone);
        match job {
            Job::MidMonthInitiate => self
                .engine
                .initiate(CycleType::MidMonth, today)
                .await
                .map(JobReport::Initiated),
            Job::EndMonthCheck => {
                if !calendar::is_last_day_of_month(today) {
                    debug!(%today, "Not the last day of the month");
                    return Ok(JobReport::NotLastDay);
                }
                self.engine
                    .initiate(CycleType::EndMonth, today)
                    .await
                    .map(JobReport::Initiated)
            }
            Job::FirstReminderSweep => self
                .engine
                .sweep_first_reminder()
                .await
                .map(JobReport::Swept),
            Job::NextDaySweep => self.engine.sweep_next_day().await.map(JobReport::Swept),
        }
    }
}

/// Next firing of `schedule` strictly after `now`, evaluated in `timezone`.
pub fn next_fire(schedule: &Schedule, timezone: &Tz, now: Timestamp) -> Option<DateTime<Utc>> {
    schedule
        .after(&now.as_datetime().with_timezone(timezone))
        .next()
        .map(|at| at.with_timezone(&Utc))
}
