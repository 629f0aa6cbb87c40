//! Configuration for the reminder engine.
//!
//! Loaded from `config.toml` in the nudge config directory. Every section
//! and field has a default, so an empty or partial file is valid.
//!
//! ```toml
//! [quiet_hours]
//! enabled = true
//! start = "22:00"
//! end = "08:00"
//!
//! [reminders]
//! default_due_time = "18:00"
//! period_hours = 24
//! ```

use crate::error::{NudgeError, Result};
use crate::reminders::quiet_hours::QuietWindow;
use crate::store::ReminderDefaults;
use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Format of every time-of-day field.
const TIME_OF_DAY_FORMAT: &str = "%H:%M";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NudgeConfig {
    /// Daily window during which reminders are held back.
    pub quiet_hours: QuietHoursConfig,
    /// Reminder cadence.
    pub reminders: ReminderSettings,
}

/// Quiet-hours settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuietHoursConfig {
    /// Whether quiet hours are applied.
    pub enabled: bool,
    /// Local time at which quiet hours begin, `HH:MM`.
    pub start: String,
    /// Local time at which quiet hours end, `HH:MM`. May be earlier than
    /// `start` for an overnight window.
    pub end: String,
}

impl Default for QuietHoursConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            start: "22:00".to_owned(),
            end: "08:00".to_owned(),
        }
    }
}

/// Reminder cadence settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReminderSettings {
    /// Local time of day at which all-day tasks are reminded, `HH:MM`.
    pub default_due_time: String,
    /// Hours between repeated due-date reminders.
    pub period_hours: u64,
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            default_due_time: "18:00".to_owned(),
            period_hours: 24,
        }
    }
}

impl NudgeConfig {
    /// The quiet-hours window described by `[quiet_hours]`.
    ///
    /// # Errors
    ///
    /// Returns [`NudgeError::Config`] if `start` or `end` is not `HH:MM`.
    pub fn quiet_window(&self) -> Result<QuietWindow> {
        let q = &self.quiet_hours;
        QuietWindow::new(
            q.enabled,
            parse_time_of_day("quiet_hours.start", &q.start)?,
            parse_time_of_day("quiet_hours.end", &q.end)?,
        )
    }

    /// Offset since local midnight at which all-day tasks are reminded.
    ///
    /// # Errors
    ///
    /// Returns [`NudgeError::Config`] if `default_due_time` is not `HH:MM`.
    pub fn daily_reminder_offset(&self) -> Result<Duration> {
        parse_time_of_day("reminders.default_due_time", &self.reminders.default_due_time)
    }

    /// Period between repeated due-date reminders.
    ///
    /// # Errors
    ///
    /// Returns [`NudgeError::Config`] if `period_hours` is zero.
    pub fn reminder_period(&self) -> Result<Duration> {
        match self.reminders.period_hours {
            0 => Err(NudgeError::Config(
                "reminders.period_hours must be at least 1".to_owned(),
            )),
            h => Ok(Duration::from_secs(h.saturating_mul(3600))),
        }
    }

    /// Cadence defaults for task records, validated.
    ///
    /// # Errors
    ///
    /// Returns [`NudgeError::Config`] if any `[reminders]` field is invalid.
    pub fn reminder_defaults(&self) -> Result<ReminderDefaults> {
        Ok(ReminderDefaults {
            reminder_period: self.reminder_period()?,
            daily_reminder_offset: self.daily_reminder_offset()?,
        })
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| NudgeError::Config(format!("{}: {e}", path.display())))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| NudgeError::Serialization(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load from `path` if it exists, otherwise fall back to defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Returns the default config file path: `<config dir>/nudge/config.toml`.
    ///
    /// The directory can be overridden with `NUDGE_CONFIG_DIR`.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        config_dir().join("config.toml")
    }
}

/// Application config directory.
fn config_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("NUDGE_CONFIG_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::config_dir()
        .map(|d| d.join("nudge"))
        .unwrap_or_else(|| PathBuf::from("/tmp/nudge-config"))
}

fn parse_time_of_day(field: &str, value: &str) -> Result<Duration> {
    let time = NaiveTime::parse_from_str(value.trim(), TIME_OF_DAY_FORMAT).map_err(|e| {
        NudgeError::Config(format!("{field}: expected HH:MM, got {value:?} ({e})"))
    })?;
    Ok(Duration::from_secs(u64::from(time.num_seconds_from_midnight())))
}
