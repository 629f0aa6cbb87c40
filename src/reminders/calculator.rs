//! Per-task reminder calculation.
//!
//! Every function here is pure: the task's reminder fields, the current time,
//! the quiet-hours window and the time zone are passed in, and the next
//! trigger instant (or `None` for "no alarm") comes out. Nothing is cached
//! between calls, so configuration changes take effect on the next
//! evaluation.
//!
//! Periodic reminders are spread out with a per-task jitter so that many
//! tasks sharing a period and reminder time do not all wake the device at
//! the same instant. The jitter is derived from a stable hash of the task id
//! and the period, so repeated evaluations for one task agree.

use crate::reminders::job::{JobKind, ScheduledJob, TaskId};
use crate::reminders::quiet_hours::{self, QuietWindow};
use crate::time::{self, ONE_DAY, ONE_HOUR, duration_millis};
use chrono::TimeZone;
use std::time::Duration;
use tracing::trace;

/// Upper bound on per-task jitter, so the configured reminder time of day
/// stays meaningful for long periods.
pub const MAX_JITTER: Duration = ONE_HOUR;

/// Window over which reminders for already-overdue tasks are spread, so a
/// backlog does not all fire on one wake-up.
pub const OVERDUE_SPREAD: Duration = Duration::from_secs(30 * 60);

/// Reminder-relevant fields of one task, as read from the task store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderConfig {
    /// Owning task.
    pub task_id: TaskId,
    /// Due instant (epoch ms). For all-day tasks any instant on the due day.
    pub due_date: Option<u64>,
    /// Whether the due date carries a specific time of day.
    pub has_due_time: bool,
    /// Remind at the deadline.
    pub notify_at_deadline: bool,
    /// Keep reminding daily once the deadline has passed.
    pub notify_after_deadline: bool,
    /// When a reminder for this task last fired.
    pub last_reminder_fired: Option<u64>,
    /// Cadence of periodic due-date reminders.
    pub reminder_period: Duration,
    /// Time of day (since local midnight) for all-day reminders.
    pub daily_reminder_offset: Duration,
    /// Snoozed until this instant.
    pub snooze_until: Option<u64>,
    /// Cadence of random nag reminders; zero disables them.
    pub random_reminder_period: Duration,
    /// Task creation instant, the base for the first random reminder.
    pub created_at: u64,
}

impl ReminderConfig {
    /// A task with no reminders enabled and default cadence settings.
    #[must_use]
    pub fn new(task_id: impl Into<TaskId>) -> Self {
        Self {
            task_id: task_id.into(),
            due_date: None,
            has_due_time: false,
            notify_at_deadline: false,
            notify_after_deadline: false,
            last_reminder_fired: None,
            reminder_period: ONE_DAY,
            daily_reminder_offset: Duration::from_secs(18 * 3600),
            snooze_until: None,
            random_reminder_period: Duration::ZERO,
            created_at: 0,
        }
    }

    /// Returns `true` if any reminder flag is set for this task.
    #[must_use]
    pub fn has_reminders(&self) -> bool {
        self.notify_at_deadline
            || self.notify_after_deadline
            || !self.random_reminder_period.is_zero()
            || self.snooze_until.is_some()
    }
}

/// Deterministic jitter for `task_id` at `period`, within
/// `[0, min(period, MAX_JITTER))`.
#[must_use]
pub fn task_jitter(task_id: TaskId, period: Duration) -> Duration {
    let window = duration_millis(period.min(MAX_JITTER));
    if window == 0 {
        return Duration::ZERO;
    }
    let hash = stable_hash(b"nudge.jitter.v1", task_id, duration_millis(period));
    Duration::from_millis(hash % window)
}

/// Deterministic fraction in `[0, 1)` for a task and a salt value.
fn unit_fraction(domain: &[u8], task_id: TaskId, salt: u64) -> f64 {
    let hash = stable_hash(domain, task_id, salt);
    // Top 53 bits fill an f64 mantissa exactly.
    (hash >> 11) as f64 / (1u64 << 53) as f64
}

fn stable_hash(domain: &[u8], task_id: TaskId, salt: u64) -> u64 {
    let mut hasher = blake3::Hasher::new();
    hasher.update(domain);
    hasher.update(&task_id.0.to_le_bytes());
    hasher.update(&salt.to_le_bytes());
    let digest = hasher.finalize();
    let mut word = [0u8; 8];
    word.copy_from_slice(&digest.as_bytes()[..8]);
    u64::from_le_bytes(word)
}

/// Next due-date reminder for a task, or `None` for no alarm.
///
/// A timed deadline still in the future fires exactly at the deadline,
/// ignoring quiet hours. Otherwise (all-day tasks, or deadlines already
/// passed) the reminder recurs at `daily_reminder_offset` on the due day,
/// stepping by `reminder_period` plus the task's jitter until it is in the
/// future, then moving out of quiet hours. At most one such reminder fires
/// per local calendar day.
pub fn calculate_next_due_date_reminder<Tz: TimeZone>(
    config: &ReminderConfig,
    now: u64,
    window: &QuietWindow,
    tz: &Tz,
) -> Option<u64> {
    if !config.notify_at_deadline {
        return None;
    }
    let due_date = config.due_date?;

    if config.has_due_time && due_date > now {
        return Some(due_date);
    }

    let candidate = periodic_candidate(config, due_date, now, tz)?;
    let adjusted = quiet_hours::adjust(candidate, window, tz);

    if let Some(last) = config.last_reminder_fired {
        if time::same_local_day(last, adjusted, tz) {
            trace!(task = %config.task_id, last, adjusted, "already reminded that day");
            return None;
        }
    }

    Some(adjusted)
}

/// First daily-offset candidate on the due day, stepped past `now`.
fn periodic_candidate<Tz: TimeZone>(
    config: &ReminderConfig,
    due_date: u64,
    now: u64,
    tz: &Tz,
) -> Option<u64> {
    let due_day = time::local_date(due_date, tz)?;
    let first = time::at_offset_on_day(due_day, config.daily_reminder_offset, tz)?;
    if first > now {
        return Some(first);
    }

    let period = duration_millis(config.reminder_period);
    if period == 0 {
        return None;
    }
    let jitter = duration_millis(task_jitter(config.task_id, config.reminder_period));

    // Smallest k >= 1 with first + jitter + k * period > now.
    let base = first.checked_add(jitter)?;
    let steps = now.saturating_sub(base) / period + 1;
    base.checked_add(steps.checked_mul(period)?)
}

/// Snooze time, if it is still in the future or has not fired yet.
///
/// A snooze that passed while nothing was running still fires, unless a
/// reminder has gone off since.
#[must_use]
pub fn calculate_next_snooze_reminder(config: &ReminderConfig, now: u64) -> Option<u64> {
    config.snooze_until.filter(|&snooze| {
        snooze > now || config.last_reminder_fired.is_none_or(|last| snooze > last)
    })
}

/// Next random nag reminder.
///
/// Fires roughly one `random_reminder_period` (scaled into `[0.85, 1.15)`)
/// after the last reminder, or after task creation if none has fired. When
/// that time has already passed, fires between 30 minutes and six and a half
/// hours from now instead.
#[must_use]
pub fn calculate_next_random_reminder(config: &ReminderConfig, now: u64) -> Option<u64> {
    let period = duration_millis(config.random_reminder_period);
    if period == 0 {
        return None;
    }

    let last = config.last_reminder_fired.unwrap_or(config.created_at);
    let fraction = unit_fraction(b"nudge.random.v1", config.task_id, last);

    let when = last.saturating_add((period as f64 * (0.85 + 0.3 * fraction)) as u64);
    if when > now {
        return Some(when);
    }

    let hour = duration_millis(ONE_HOUR) as f64;
    Some(now.saturating_add((hour * (0.5 + 6.0 * fraction)) as u64))
}

/// Next daily nag after the deadline.
///
/// Recurs at the deadline's time of day (one second past it for timed
/// deadlines, `daily_reminder_offset` for all-day ones), starting the day
/// after the deadline and never on or before the last reminder. Past results
/// are returned as-is so a missed nag fires immediately.
pub fn calculate_next_overdue_reminder<Tz: TimeZone>(
    config: &ReminderConfig,
    window: &QuietWindow,
    tz: &Tz,
) -> Option<u64> {
    if !config.notify_after_deadline {
        return None;
    }
    let due_date = config.due_date?;

    let anchor = if config.has_due_time {
        due_date.checked_add(1_000)?
    } else {
        let due_day = time::local_date(due_date, tz)?;
        time::at_offset_on_day(due_day, config.daily_reminder_offset, tz)?
    };
    let anchor_local = time::local_naive(anchor, tz)?;

    let mut days = 1;
    if let Some(last) = config.last_reminder_fired {
        // Jump close to the last reminder, then walk the remaining day or two.
        days = days.max(last.saturating_sub(anchor) / duration_millis(ONE_DAY));
    }

    let mut candidate = recurrence(anchor_local, days, tz)?;
    while config.last_reminder_fired.is_some_and(|last| candidate <= last) {
        days += 1;
        candidate = recurrence(anchor_local, days, tz)?;
    }

    Some(quiet_hours::adjust(candidate, window, tz))
}

fn recurrence<Tz: TimeZone>(anchor: chrono::NaiveDateTime, days: u64, tz: &Tz) -> Option<u64> {
    let naive = anchor.checked_add_days(chrono::Days::new(days))?;
    time::resolve_local(naive, tz)
}

/// Due reminder for a task that was already reminded on the day of its next
/// candidate: the first candidate from the following local midnight on.
fn next_day_due_reminder<Tz: TimeZone>(
    config: &ReminderConfig,
    now: u64,
    window: &QuietWindow,
    tz: &Tz,
) -> Option<u64> {
    let last = config.last_reminder_fired?;
    let next_day = time::add_days(time::local_date(last, tz)?, 1)?;
    let midnight = time::at_offset_on_day(next_day, Duration::ZERO, tz)?;
    if midnight <= now {
        return None;
    }
    calculate_next_due_date_reminder(config, midnight, window, tz)
}

/// Trigger for an overdue reminder that is already in the past: within
/// [`OVERDUE_SPREAD`] of `now`, at a fixed per-task offset.
fn spread_overdue<Tz: TimeZone>(id: TaskId, now: u64, window: &QuietWindow, tz: &Tz) -> u64 {
    let offset = duration_millis(task_jitter(id, OVERDUE_SPREAD));
    quiet_hours::adjust(now.saturating_add(offset), window, tz)
}

/// Pick the single reminder job to queue for a task.
///
/// A pending snooze overrides everything. A due reminder suppressed because
/// the task was already reminded that day moves to the next day. Overdue
/// reminders that are already past are spread over [`OVERDUE_SPREAD`]. A
/// random reminder landing less than a day before the due reminder is
/// dropped in favour of the due reminder. Otherwise the earliest of random,
/// due and overdue wins, with ties going to the later entry in that list.
pub fn next_reminder<Tz: TimeZone>(
    config: &ReminderConfig,
    now: u64,
    window: &QuietWindow,
    tz: &Tz,
) -> Option<ScheduledJob> {
    let id = config.task_id;

    if let Some(snooze) = calculate_next_snooze_reminder(config, now) {
        return Some(ScheduledJob::new(id, JobKind::Snooze, snooze));
    }

    let due = calculate_next_due_date_reminder(config, now, window, tz)
        .or_else(|| next_day_due_reminder(config, now, window, tz));
    let overdue = calculate_next_overdue_reminder(config, window, tz)
        .map(|t| if t <= now { spread_overdue(id, now, window, tz) } else { t });
    let mut random = calculate_next_random_reminder(config, now);

    if let (Some(r), Some(d)) = (random, due) {
        if d.saturating_sub(r) < duration_millis(ONE_DAY) {
            random = None;
        }
    }

    let never = |t: Option<u64>| t.unwrap_or(u64::MAX);
    let (r, d, o) = (never(random), never(due), never(overdue));

    let job = if random.is_some() && r < d && r < o {
        ScheduledJob::new(id, JobKind::Random, r)
    } else if due.is_some() && d < o {
        ScheduledJob::new(id, JobKind::Due, d)
    } else if overdue.is_some() {
        ScheduledJob::new(id, JobKind::Overdue, o)
    } else {
        return None;
    };
    trace!(task = %id, kind = %job.kind, trigger_time = job.trigger_time, "next reminder");
    Some(job)
}
