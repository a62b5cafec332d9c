//! Scheduler configuration: cron triggers, time zone and deadlines

use chrono_tz::Tz;
use cron::Schedule;
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Timer configuration. Cron expressions use the 5-field format
/// (`minute hour day-of-month month day-of-week`).
///
/// Day-of-week follows the `cron` crate rather than Unix cron: values run
/// 1-7 with Sunday = 1, and `0` is rejected. Prefer names (`MON-FRI`).
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// IANA zone the cron expressions and "yesterday" are evaluated in
    #[serde(default = "default_timezone")]
    pub timezone: String,

    #[serde(default = "default_mid_month_cron")]
    pub mid_month_cron: String,

    /// Daily check; the end-of-month cycle only starts on the last day
    #[serde(default = "default_end_month_check_cron")]
    pub end_month_check_cron: String,

    #[serde(default = "default_first_reminder_cron")]
    pub first_reminder_cron: String,

    #[serde(default = "default_next_day_cron")]
    pub next_day_cron: String,

    #[serde(default = "default_initiate_timeout")]
    pub initiate_timeout_secs: u64,

    #[serde(default = "default_first_reminder_timeout")]
    pub first_reminder_timeout_secs: u64,

    #[serde(default = "default_next_day_timeout")]
    pub next_day_timeout_secs: u64,

    /// Delay between a "No" and the first reminder, in minutes
    #[serde(default = "default_first_reminder_delay")]
    pub first_reminder_delay_mins: u64,
}

/// Parse a 5-field cron expression.
///
/// The `cron` crate expects a leading seconds field, so `0` is prepended.
/// Day-of-week numbers are 1-7 starting from Sunday; names are safer.
pub fn parse_cron(field: &'static str, expr: &str) -> Result<Schedule, ValidationError> {
    format!("0 {}", expr.trim())
        .parse::<Schedule>()
        .map_err(|e| ValidationError::InvalidCron {
            field,
            expression: expr.to_string(),
            reason: e.to_string(),
        })
}

impl SchedulerConfig {
    pub fn tz(&self) -> Result<Tz, ValidationError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| ValidationError::InvalidTimezone(self.timezone.clone()))
    }

    pub fn mid_month_schedule(&self) -> Result<Schedule, ValidationError> {
        parse_cron("scheduler.mid_month_cron", &self.mid_month_cron)
    }

    pub fn end_month_check_schedule(&self) -> Result<Schedule, ValidationError> {
        parse_cron("scheduler.end_month_check_cron", &self.end_month_check_cron)
    }

    pub fn first_reminder_schedule(&self) -> Result<Schedule, ValidationError> {
        parse_cron("scheduler.first_reminder_cron", &self.first_reminder_cron)
    }

    pub fn next_day_schedule(&self) -> Result<Schedule, ValidationError> {
        parse_cron("scheduler.next_day_cron", &self.next_day_cron)
    }

    pub fn initiate_timeout(&self) -> Duration {
        Duration::from_secs(self.initiate_timeout_secs)
    }

    pub fn first_reminder_timeout(&self) -> Duration {
        Duration::from_secs(self.first_reminder_timeout_secs)
    }

    pub fn next_day_timeout(&self) -> Duration {
        Duration::from_secs(self.next_day_timeout_secs)
    }

    pub fn first_reminder_delay(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.first_reminder_delay_mins.min(24 * 60) as i64)
    }

    /// Validate scheduler configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.tz()?;
        self.mid_month_schedule()?;
        self.end_month_check_schedule()?;
        self.first_reminder_schedule()?;
        self.next_day_schedule()?;
        if self.initiate_timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout(
                "scheduler.initiate_timeout_secs",
            ));
        }
        if self.first_reminder_timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout(
                "scheduler.first_reminder_timeout_secs",
            ));
        }
        if self.next_day_timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout(
                "scheduler.next_day_timeout_secs",
            ));
        }
        if self.first_reminder_delay_mins == 0 || self.first_reminder_delay_mins > 24 * 60 {
            return Err(ValidationError::InvalidTimeout(
                "scheduler.first_reminder_delay_mins",
            ));
        }
        Ok(())
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            mid_month_cron: default_mid_month_cron(),
            end_month_check_cron: default_end_month_check_cron(),
            first_reminder_cron: default_first_reminder_cron(),
            next_day_cron: default_next_day_cron(),
            initiate_timeout_secs: default_initiate_timeout(),
            first_reminder_timeout_secs: default_first_reminder_timeout(),
            next_day_timeout_secs: default_next_day_timeout(),
            first_reminder_delay_mins: default_first_reminder_delay(),
        }
    }
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_mid_month_cron() -> String {
    "0 10 15 * *".to_string()
}

fn default_end_month_check_cron() -> String {
    "0 10 * * *".to_string()
}

fn default_first_reminder_cron() -> String {
    "*/5 * * * *".to_string()
}

fn default_next_day_cron() -> String {
    "0 9 * * *".to_string()
}

fn default_initiate_timeout() -> u64 {
    120
}

fn default_first_reminder_timeout() -> u64 {
    60
}

fn default_next_day_timeout() -> u64 {
    300
}

fn default_first_reminder_delay() -> u64 {
    60
}
