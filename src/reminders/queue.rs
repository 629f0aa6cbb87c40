//! In-memory priority queue of scheduled reminder jobs.
//!
//! Only one operating-system wake request is ever outstanding, so the queue's
//! job is to know which job fires first. Every mutation reports whether the
//! earliest trigger time changed; when it did, the caller must reprogram the
//! external alarm to [`JobQueue::next_scheduled_time`].
//!
//! Jobs are ordered by trigger time, with ties kept in insertion order. An
//! index keyed by `(task id, kind)` gives upsert and cancel without a scan.
//!
//! The queue is not synchronized; owners that share it across threads wrap it
//! in a mutex (see [`crate::reminders::service::ReminderService`]).

use crate::reminders::job::{JobKind, ScheduledJob, TaskId};
use crate::reminders::quiet_hours::{self, QuietWindow};
use chrono::TimeZone;
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// Sort key: trigger time first, insertion sequence as the tiebreaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct QueueKey {
    trigger_time: u64,
    seq: u64,
    id: TaskId,
    kind: JobKind,
}

impl From<QueueKey> for ScheduledJob {
    fn from(key: QueueKey) -> Self {
        Self {
            id: key.id,
            kind: key.kind,
            trigger_time: key.trigger_time,
        }
    }
}

/// Time-ordered collection of [`ScheduledJob`]s, one per `(id, kind)`.
#[derive(Debug, Default)]
pub struct JobQueue {
    ordered: BTreeSet<QueueKey>,
    index: HashMap<(TaskId, JobKind), QueueKey>,
    next_seq: u64,
}

impl JobQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pending jobs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    /// Returns `true` when no jobs are pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    /// Trigger time of the earliest job, before quiet-hours adjustment.
    #[must_use]
    pub fn earliest_trigger(&self) -> Option<u64> {
        self.ordered.first().map(|key| key.trigger_time)
    }

    /// The earliest job, if any.
    #[must_use]
    pub fn peek(&self) -> Option<ScheduledJob> {
        self.ordered.first().copied().map(ScheduledJob::from)
    }

    /// Look up the pending job for `(id, kind)`.
    #[must_use]
    pub fn get(&self, id: TaskId, kind: JobKind) -> Option<ScheduledJob> {
        self.index.get(&(id, kind)).copied().map(ScheduledJob::from)
    }

    /// Snapshot of all pending jobs in firing order.
    #[must_use]
    pub fn jobs(&self) -> Vec<ScheduledJob> {
        self.ordered.iter().copied().map(ScheduledJob::from).collect()
    }

    /// Insert `job`, replacing any pending job with the same `(id, kind)`.
    ///
    /// Returns `true` if the earliest trigger time changed, meaning the
    /// external alarm must be reprogrammed.
    pub fn add(&mut self, job: ScheduledJob) -> bool {
        let before = self.earliest_trigger();

        if let Some(previous) = self.index.remove(&job.key()) {
            self.ordered.remove(&previous);
        }

        let key = QueueKey {
            trigger_time: job.trigger_time,
            seq: self.next_seq,
            id: job.id,
            kind: job.kind,
        };
        self.next_seq = self.next_seq.wrapping_add(1);
        self.ordered.insert(key);
        self.index.insert(job.key(), key);

        let changed = before != self.earliest_trigger();
        debug!(
            task = %job.id,
            kind = %job.kind,
            trigger_time = job.trigger_time,
            changed,
            "queued reminder job"
        );
        changed
    }

    /// Remove the job for `(id, kind)` if present.
    ///
    /// Returns `true` if the earliest trigger time changed. Cancelling an
    /// absent job is a no-op returning `false`.
    pub fn cancel(&mut self, id: TaskId, kind: JobKind) -> bool {
        let before = self.earliest_trigger();
        if !self.remove_key(id, kind) {
            return false;
        }
        let changed = before != self.earliest_trigger();
        debug!(task = %id, %kind, changed, "cancelled reminder job");
        changed
    }

    /// Remove every job belonging to task `id`.
    ///
    /// Returns `true` if the earliest trigger time changed.
    pub fn cancel_task(&mut self, id: TaskId) -> bool {
        let before = self.earliest_trigger();
        let mut removed = false;
        for kind in JobKind::ALL {
            removed |= self.remove_key(id, kind);
        }
        removed && before != self.earliest_trigger()
    }

    /// Remove exactly the listed jobs, skipping any that were since replaced
    /// by an upsert with a different trigger time.
    ///
    /// Returns `true` if the earliest trigger time changed.
    pub fn remove(&mut self, jobs: &[ScheduledJob]) -> bool {
        let before = self.earliest_trigger();
        for job in jobs {
            let matches = self
                .index
                .get(&job.key())
                .is_some_and(|key| key.trigger_time == job.trigger_time);
            if matches {
                self.remove_key(job.id, job.kind);
            }
        }
        before != self.earliest_trigger()
    }

    /// Drop every pending job.
    ///
    /// Returns `true` if the queue was non-empty, meaning the external alarm
    /// must be cancelled.
    pub fn clear(&mut self) -> bool {
        let had_jobs = !self.is_empty();
        self.ordered.clear();
        self.index.clear();
        had_jobs
    }

    /// When the external alarm should fire: the earliest trigger time moved
    /// out of quiet hours, or `None` when nothing is pending.
    pub fn next_scheduled_time<Tz: TimeZone>(&self, window: &QuietWindow, tz: &Tz) -> Option<u64> {
        self.earliest_trigger()
            .map(|trigger| quiet_hours::adjust(trigger, window, tz))
    }

    /// Remove and return every job with `trigger_time <= now`, in firing
    /// order. Later jobs stay queued in their existing order.
    pub fn remove_overdue_jobs(&mut self, now: u64) -> Vec<ScheduledJob> {
        let mut overdue = Vec::new();
        while let Some(first) = self.ordered.first().copied() {
            if first.trigger_time > now {
                break;
            }
            self.ordered.pop_first();
            self.index.remove(&(first.id, first.kind));
            overdue.push(ScheduledJob::from(first));
        }
        if !overdue.is_empty() {
            debug!(count = overdue.len(), now, "removed overdue reminder jobs");
        }
        overdue
    }

    fn remove_key(&mut self, id: TaskId, kind: JobKind) -> bool {
        match self.index.remove(&(id, kind)) {
            Some(key) => {
                self.ordered.remove(&key);
                true
            }
            None => false,
        }
    }
}
