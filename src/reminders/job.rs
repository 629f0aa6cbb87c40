//! Scheduled job definitions.

use serde::{Deserialize, Serialize};

/// Identifier of a task in the external task store.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TaskId(pub u64);

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for TaskId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Reminder category. Disambiguates multiple jobs for one task; never
/// affects queue ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    /// Reminder at (or, for all-day tasks, on the day of) the due date.
    Due,
    /// Daily nag after the deadline has passed.
    Overdue,
    /// Periodic reminder at a roughly regular cadence.
    Random,
    /// User-requested snooze.
    Snooze,
    /// Explicit alarm attached to the task.
    Alarm,
}

impl JobKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::Due,
        Self::Overdue,
        Self::Random,
        Self::Snooze,
        Self::Alarm,
    ];

    /// Stable lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Due => "due",
            Self::Overdue => "overdue",
            Self::Random => "random",
            Self::Snooze => "snooze",
            Self::Alarm => "alarm",
        }
    }
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One pending wake request for a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScheduledJob {
    /// Owning task.
    pub id: TaskId,
    /// Reminder category.
    pub kind: JobKind,
    /// Epoch milliseconds at which the job should fire.
    pub trigger_time: u64,
}

impl ScheduledJob {
    /// Create a job.
    #[must_use]
    pub fn new(id: impl Into<TaskId>, kind: JobKind, trigger_time: u64) -> Self {
        Self {
            id: id.into(),
            kind,
            trigger_time,
        }
    }

    /// Composite identity used for upserts: at most one job per key.
    #[must_use]
    pub const fn key(&self) -> (TaskId, JobKind) {
        (self.id, self.kind)
    }
}
