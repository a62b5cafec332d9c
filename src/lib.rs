//! Report Reminder - recurring report-confirmation survey bot
//!
//! Twice a month every participant is asked, one table at a time, whether
//! their report tables are filled in. "No" answers escalate through a timed
//! reminder and a next-day reminder; once every table is confirmed the
//! supervisor is notified.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
