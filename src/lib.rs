//! Nudge: reminder scheduling for a personal task manager.
//!
//! Given each task's deadline and reminder settings, nudge works out when the
//! next reminder should fire, keeps every pending reminder in one ordered
//! queue and drives a single wake alarm at the earliest of them, holding
//! reminders back during quiet hours.
//!
//! # Architecture
//!
//! - **Calculator**: per-task next-reminder computation (pure)
//! - **Job queue**: time-ordered pending reminders, one per task and kind
//! - **Quiet hours**: moves trigger times out of a daily do-not-disturb window
//! - **Service**: ties the queue to a [`store::TaskStore`], a
//!   [`reminders::WakeAlarm`] and a [`notify::Notifier`]

pub mod config;
pub mod error;
pub mod notify;
pub mod reminders;
pub mod store;
pub mod time;

pub use config::NudgeConfig;
pub use error::{NudgeError, Result};
pub use reminders::{
    JobKind, JobQueue, QuietWindow, ReminderConfig, ReminderService, ScheduledJob, TaskId,
};
