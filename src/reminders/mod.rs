//! Reminder scheduling.
//!
//! - [`quiet_hours`]: snaps trigger times out of the nightly quiet window.
//! - [`calculator`]: computes each task's next reminder instant.
//! - [`queue`]: orders pending jobs and tracks the earliest one.
//! - [`service`]: drives the queue, the task store and the wake alarm.
//!
//! Everything below [`service`] is synchronous and free of I/O; the only
//! async piece is [`alarm::TokioWakeAlarm`].

pub mod alarm;
pub mod calculator;
pub mod job;
pub mod queue;
pub mod quiet_hours;
pub mod service;

pub use alarm::{TokioWakeAlarm, WakeAlarm};
pub use calculator::{ReminderConfig, next_reminder};
pub use job::{JobKind, ScheduledJob, TaskId};
pub use queue::JobQueue;
pub use quiet_hours::QuietWindow;
pub use service::{ReminderService, SharedQuietWindow};
