//! Task store seam.
//!
//! The reminder service reads each task's reminder fields through
//! [`TaskStore`] and writes back the time a reminder last fired. Persistence
//! of the tasks themselves belongs to the host application; this crate ships
//! an in-memory store that the CLI fills from a JSON task file.

use crate::error::{NudgeError, Result};
use crate::reminders::calculator::ReminderConfig;
use crate::reminders::job::TaskId;
use crate::time;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::RwLock;
use std::time::Duration;
use tracing::{debug, info};

/// Read/write access to the reminder fields of stored tasks.
pub trait TaskStore: Send + Sync {
    /// Reminder fields of one task, or `None` if it no longer exists or has
    /// been completed.
    ///
    /// # Errors
    ///
    /// Returns [`NudgeError::Store`] if the backing store cannot be read.
    fn reminder_config(&self, id: TaskId) -> Result<Option<ReminderConfig>>;

    /// Every open task that has at least one reminder enabled.
    ///
    /// # Errors
    ///
    /// Returns [`NudgeError::Store`] if the backing store cannot be read.
    fn active_reminders(&self) -> Result<Vec<ReminderConfig>>;

    /// Record that a reminder for `id` fired at `at` (epoch ms).
    ///
    /// # Errors
    ///
    /// Returns [`NudgeError::Store`] if the update cannot be written.
    fn record_reminder_fired(&self, id: TaskId, at: u64) -> Result<()>;
}

/// Cadence settings applied to task records that do not carry their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderDefaults {
    /// Period between due-date reminders.
    pub reminder_period: Duration,
    /// Time of day (since local midnight) for all-day reminders.
    pub daily_reminder_offset: Duration,
}

impl Default for ReminderDefaults {
    fn default() -> Self {
        let base = ReminderConfig::new(TaskId::default());
        Self {
            reminder_period: base.reminder_period,
            daily_reminder_offset: base.daily_reminder_offset,
        }
    }
}

/// One task as written in a JSON task file.
///
/// Instants are RFC 3339 strings so files stay readable and carry their
/// UTC offset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskRecord {
    /// Task identifier.
    pub id: u64,
    /// Free-form title, used only for display.
    pub title: String,
    /// Due instant.
    pub due: Option<DateTime<FixedOffset>>,
    /// Whether `due` carries a meaningful time of day.
    pub has_due_time: bool,
    /// Remind at the deadline.
    pub notify_at_deadline: bool,
    /// Keep nagging daily after the deadline.
    pub notify_after_deadline: bool,
    /// Last time a reminder fired.
    pub last_reminder_fired: Option<DateTime<FixedOffset>>,
    /// Snoozed until this instant.
    pub snooze_until: Option<DateTime<FixedOffset>>,
    /// Override of the due-reminder period, in hours.
    pub reminder_period_hours: Option<u64>,
    /// Random nag period in hours; absent or zero disables it.
    pub random_reminder_hours: Option<u64>,
    /// Creation instant, the base for random reminders.
    pub created: Option<DateTime<FixedOffset>>,
    /// Completed tasks never get reminders.
    pub completed: bool,
}

impl TaskRecord {
    /// Convert to the calculator's view of the task.
    #[must_use]
    pub fn to_reminder_config(&self, defaults: &ReminderDefaults) -> ReminderConfig {
        let millis = |t: &DateTime<FixedOffset>| time::to_epoch_millis(t);
        let hours = |h: u64| Duration::from_secs(h.saturating_mul(3600));

        let mut config = ReminderConfig::new(self.id);
        config.due_date = self.due.as_ref().map(millis);
        config.has_due_time = self.has_due_time;
        config.notify_at_deadline = self.notify_at_deadline;
        config.notify_after_deadline = self.notify_after_deadline;
        config.last_reminder_fired = self.last_reminder_fired.as_ref().map(millis);
        config.snooze_until = self.snooze_until.as_ref().map(millis);
        config.reminder_period = self
            .reminder_period_hours
            .map_or(defaults.reminder_period, hours);
        config.daily_reminder_offset = defaults.daily_reminder_offset;
        config.random_reminder_period = self.random_reminder_hours.map_or(Duration::ZERO, hours);
        config.created_at = self.created.as_ref().map_or(0, millis);
        config
    }
}

/// Thread-safe in-memory task store.
#[derive(Debug, Default)]
pub struct MemoryTaskStore {
    tasks: RwLock<BTreeMap<TaskId, ReminderConfig>>,
}

impl MemoryTaskStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from task records, skipping completed tasks.
    #[must_use]
    pub fn from_records(records: &[TaskRecord], defaults: &ReminderDefaults) -> Self {
        let store = Self::new();
        for record in records.iter().filter(|r| !r.completed) {
            store.insert(record.to_reminder_config(defaults));
        }
        store
    }

    /// Load a JSON array of [`TaskRecord`]s.
    ///
    /// # Errors
    ///
    /// Returns [`NudgeError::Io`] if the file cannot be read and
    /// [`NudgeError::Serialization`] if it is not a valid task list.
    pub fn from_json_file(path: &Path, defaults: &ReminderDefaults) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let records: Vec<TaskRecord> = serde_json::from_str(&content)
            .map_err(|e| NudgeError::Serialization(format!("{}: {e}", path.display())))?;
        let store = Self::from_records(&records, defaults);
        info!(path = %path.display(), tasks = store.len(), "loaded task file");
        Ok(store)
    }

    /// Insert or replace a task.
    pub fn insert(&self, config: ReminderConfig) {
        let mut tasks = self.tasks.write().unwrap_or_else(|e| e.into_inner());
        tasks.insert(config.task_id, config);
    }

    /// Remove a task, e.g. once it is completed or deleted.
    pub fn remove(&self, id: TaskId) -> Option<ReminderConfig> {
        let mut tasks = self.tasks.write().unwrap_or_else(|e| e.into_inner());
        tasks.remove(&id)
    }

    /// Number of stored tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Returns `true` if the store holds no tasks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TaskStore for MemoryTaskStore {
    fn reminder_config(&self, id: TaskId) -> Result<Option<ReminderConfig>> {
        let tasks = self.tasks.read().unwrap_or_else(|e| e.into_inner());
        Ok(tasks.get(&id).cloned())
    }

    fn active_reminders(&self) -> Result<Vec<ReminderConfig>> {
        let tasks = self.tasks.read().unwrap_or_else(|e| e.into_inner());
        Ok(tasks.values().filter(|c| c.has_reminders()).cloned().collect())
    }

    fn record_reminder_fired(&self, id: TaskId, at: u64) -> Result<()> {
        let mut tasks = self.tasks.write().unwrap_or_else(|e| e.into_inner());
        let config = tasks
            .get_mut(&id)
            .ok_or_else(|| NudgeError::Store(format!("unknown task {id}")))?;
        config.last_reminder_fired = Some(at);
        debug!(task = %id, at, "recorded reminder fired");
        Ok(())
    }
}
