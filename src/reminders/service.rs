//! Reminder service: the control loop around the job queue.
//!
//! The service owns the [`JobQueue`] behind a mutex and is the only caller of
//! the [`WakeAlarm`]. Every mutation that moves the queue's earliest trigger
//! reprograms the alarm while the queue lock is still held, so the alarm
//! always matches the queue head.
//!
//! Quiet hours are read from a [`SharedQuietWindow`] on every evaluation.
//! Settings edits take effect on the next call without restarting anything.
//!
//! Collaborator failures inside [`ReminderService::on_wake`] (notification,
//! store writes, recalculation) are logged and skipped so that one bad task
//! cannot stop the remaining reminders from firing.

use crate::error::Result;
use crate::notify::Notifier;
use crate::reminders::alarm::WakeAlarm;
use crate::reminders::calculator::{ReminderConfig, next_reminder};
use crate::reminders::job::{JobKind, ScheduledJob, TaskId};
use crate::reminders::queue::JobQueue;
use crate::reminders::quiet_hours::QuietWindow;
use crate::store::TaskStore;
use chrono::{Local, TimeZone};
use std::sync::{Arc, Mutex, RwLock};
use tracing::{debug, info, warn};

/// Quiet-hours setting shared between the settings owner and the service.
#[derive(Debug, Clone, Default)]
pub struct SharedQuietWindow(Arc<RwLock<QuietWindow>>);

impl SharedQuietWindow {
    /// Wrap an initial window.
    #[must_use]
    pub fn new(window: QuietWindow) -> Self {
        Self(Arc::new(RwLock::new(window)))
    }

    /// Current window.
    #[must_use]
    pub fn get(&self) -> QuietWindow {
        *self.0.read().unwrap_or_else(|e| e.into_inner())
    }

    /// Replace the window. Callers should then call
    /// [`ReminderService::reprogram_alarm`] so a pending wake moves with it.
    pub fn set(&self, window: QuietWindow) {
        *self.0.write().unwrap_or_else(|e| e.into_inner()) = window;
    }
}

/// Schedules reminder jobs for stored tasks and fires them on wake-up.
pub struct ReminderService<S, A, N, Tz = Local> {
    queue: Mutex<JobQueue>,
    store: S,
    alarm: Mutex<A>,
    notifier: N,
    quiet_hours: SharedQuietWindow,
    tz: Tz,
}

impl<S, A, N> ReminderService<S, A, N, Local>
where
    S: TaskStore,
    A: WakeAlarm,
    N: Notifier,
{
    /// Create a service evaluating calendar days in the system time zone.
    pub fn new(store: S, alarm: A, notifier: N, quiet_hours: SharedQuietWindow) -> Self {
        Self::with_time_zone(store, alarm, notifier, quiet_hours, Local)
    }
}

impl<S, A, N, Tz> ReminderService<S, A, N, Tz>
where
    S: TaskStore,
    A: WakeAlarm,
    N: Notifier,
    Tz: TimeZone,
{
    /// Create a service evaluating calendar days in `tz`.
    pub fn with_time_zone(
        store: S,
        alarm: A,
        notifier: N,
        quiet_hours: SharedQuietWindow,
        tz: Tz,
    ) -> Self {
        Self {
            queue: Mutex::new(JobQueue::new()),
            store,
            alarm: Mutex::new(alarm),
            notifier,
            quiet_hours,
            tz,
        }
    }

    /// The task store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The shared quiet-hours handle.
    pub fn quiet_hours(&self) -> &SharedQuietWindow {
        &self.quiet_hours
    }

    /// Snapshot of queued jobs in firing order.
    pub fn queued_jobs(&self) -> Vec<ScheduledJob> {
        self.lock_queue().jobs()
    }

    /// When the alarm is (or should be) set for, given current settings.
    pub fn next_wake(&self) -> Option<u64> {
        self.lock_queue()
            .next_scheduled_time(&self.quiet_hours.get(), &self.tz)
    }

    /// Replace whatever is queued for `config`'s task with its next reminder.
    ///
    /// Returns the queued job, or `None` when the task has nothing to fire.
    ///
    /// # Errors
    ///
    /// Returns an error if the alarm had to move and could not be
    /// reprogrammed. The queue is updated regardless.
    pub fn schedule_task(&self, config: &ReminderConfig, now: u64) -> Result<Option<ScheduledJob>> {
        let window = self.quiet_hours.get();
        let job = next_reminder(config, now, &window, &self.tz);

        let mut queue = self.lock_queue();
        let mut changed = queue.cancel_task(config.task_id);
        if let Some(job) = job {
            changed |= queue.add(job);
        }
        if changed {
            self.program_alarm(&queue, &window)?;
        }
        Ok(job)
    }

    /// Drop every queued job for `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the alarm could not be reprogrammed.
    pub fn cancel_task(&self, id: TaskId) -> Result<bool> {
        let mut queue = self.lock_queue();
        let had_jobs = JobKind::ALL.iter().any(|&kind| queue.get(id, kind).is_some());
        if queue.cancel_task(id) {
            self.program_alarm(&queue, &self.quiet_hours.get())?;
        }
        Ok(had_jobs)
    }

    /// Rebuild the queue from the store's active reminders.
    ///
    /// Returns how many jobs were queued.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or the alarm cannot be
    /// reprogrammed.
    pub fn rebuild(&self, now: u64) -> Result<usize> {
        let configs = self.store.active_reminders()?;
        let window = self.quiet_hours.get();

        let mut queue = self.lock_queue();
        queue.clear();
        for config in &configs {
            if let Some(job) = next_reminder(config, now, &window, &self.tz) {
                queue.add(job);
            }
        }
        self.program_alarm(&queue, &window)?;

        info!(tasks = configs.len(), queued = queue.len(), "reminder queue rebuilt");
        Ok(queue.len())
    }

    /// Handle an alarm firing at `now`.
    ///
    /// Removes every job due by `now`, notifies each, records the fire in the
    /// store, queues each task's following reminder and reprograms the alarm.
    /// Returns the fired jobs in firing order.
    ///
    /// # Errors
    ///
    /// Returns an error only if the alarm cannot be reprogrammed.
    pub fn on_wake(&self, now: u64) -> Result<Vec<ScheduledJob>> {
        let window = self.quiet_hours.get();
        let mut queue = self.lock_queue();
        let fired = queue.remove_overdue_jobs(now);

        for job in &fired {
            if let Err(e) = self.notifier.notify(job) {
                warn!(task = %job.id, kind = %job.kind, "failed to deliver reminder: {e}");
            }
            if let Err(e) = self.store.record_reminder_fired(job.id, now) {
                warn!(task = %job.id, "failed to record reminder: {e}");
            }
            match self.store.reminder_config(job.id) {
                Ok(Some(config)) => {
                    if let Some(next) = next_reminder(&config, now, &window, &self.tz) {
                        queue.add(next);
                    }
                }
                Ok(None) => debug!(task = %job.id, "task gone, not rescheduling"),
                Err(e) => warn!(task = %job.id, "failed to reload task: {e}"),
            }
        }

        if !fired.is_empty() {
            debug!(fired = fired.len(), pending = queue.len(), "wake handled");
        }
        self.program_alarm(&queue, &window)?;
        Ok(fired)
    }

    /// Point the alarm at the queue head under the current quiet hours, or
    /// cancel it when nothing is queued. Returns the programmed time.
    ///
    /// # Errors
    ///
    /// Returns an error if the alarm rejects the request.
    pub fn reprogram_alarm(&self) -> Result<Option<u64>> {
        let queue = self.lock_queue();
        self.program_alarm(&queue, &self.quiet_hours.get())
    }

    fn program_alarm(&self, queue: &JobQueue, window: &QuietWindow) -> Result<Option<u64>> {
        let next = queue.next_scheduled_time(window, &self.tz);
        let mut alarm = self.alarm.lock().unwrap_or_else(|e| e.into_inner());
        match next {
            Some(at) => alarm.schedule_wake(at)?,
            None => alarm.cancel_wake()?,
        }
        Ok(next)
    }

    fn lock_queue(&self) -> std::sync::MutexGuard<'_, JobQueue> {
        self.queue.lock().unwrap_or_else(|e| e.into_inner())
    }
}
