//! Quiet hours: a daily time-of-day window during which reminders must not
//! fire.
//!
//! [`adjust`] snaps a candidate trigger time to the end of the window when it
//! falls inside it. The window is half-open, `[start, end)`, and may wrap
//! past midnight (e.g. 22:00 to 08:00). The calendar day used to place the
//! window is always the candidate's own local day, never "today".

use crate::error::{NudgeError, Result};
use crate::time;
use chrono::{Local, TimeZone};
use std::time::Duration;
use tracing::trace;

/// Daily quiet-hours window, as offsets since local midnight.
///
/// `start == end` means "no quiet hours" regardless of `enabled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QuietWindow {
    enabled: bool,
    start: Duration,
    end: Duration,
}

impl QuietWindow {
    /// Create a window, validating that both offsets are within one day.
    ///
    /// # Errors
    ///
    /// Returns [`NudgeError::Config`] if either offset is 24h or more.
    pub fn new(enabled: bool, start: Duration, end: Duration) -> Result<Self> {
        for (name, offset) in [("start", start), ("end", end)] {
            if offset >= time::ONE_DAY {
                return Err(NudgeError::Config(format!(
                    "quiet hours {name} must be less than 24h, got {}s",
                    offset.as_secs()
                )));
            }
        }
        Ok(Self {
            enabled,
            start,
            end,
        })
    }

    /// A window that never suppresses anything.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            enabled: false,
            start: Duration::ZERO,
            end: Duration::ZERO,
        }
    }

    /// Whether quiet hours are switched on.
    #[must_use]
    pub const fn enabled(&self) -> bool {
        self.enabled
    }

    /// Offset since local midnight at which quiet hours begin.
    #[must_use]
    pub const fn start(&self) -> Duration {
        self.start
    }

    /// Offset since local midnight at which quiet hours end.
    #[must_use]
    pub const fn end(&self) -> Duration {
        self.end
    }

    /// Returns `true` if this window can suppress anything at all.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.enabled && self.start != self.end
    }

    /// Returns `true` if the window spans midnight.
    #[must_use]
    pub fn wraps_midnight(&self) -> bool {
        self.start > self.end
    }

    /// Returns `true` if `instant` falls inside the window.
    pub fn contains<Tz: TimeZone>(&self, instant: u64, tz: &Tz) -> bool {
        quiet_until(instant, self, tz).is_some()
    }
}

/// Return the next instant at or after `candidate` that is outside quiet
/// hours.
///
/// Inputs outside chrono's representable range are returned unchanged.
pub fn adjust<Tz: TimeZone>(candidate: u64, window: &QuietWindow, tz: &Tz) -> u64 {
    match quiet_until(candidate, window, tz) {
        Some(end) => {
            trace!(candidate, adjusted = end, "trigger moved out of quiet hours");
            end
        }
        None => candidate,
    }
}

/// [`adjust`] against the system's local time zone.
pub fn adjust_local(candidate: u64, window: &QuietWindow) -> u64 {
    adjust(candidate, window, &Local)
}

/// End of the quiet period containing `candidate`, if it is inside one.
fn quiet_until<Tz: TimeZone>(candidate: u64, window: &QuietWindow, tz: &Tz) -> Option<u64> {
    if !window.is_active() {
        return None;
    }

    let day = time::local_date(candidate, tz)?;
    let start = time::at_offset_on_day(day, window.start, tz)?;
    let end = time::at_offset_on_day(day, window.end, tz)?;

    if start < end {
        return (start..end).contains(&candidate).then_some(end);
    }

    // Wrapping window: [start, midnight) today plus [midnight, end) today.
    if candidate >= start {
        let next_day = time::add_days(day, 1)?;
        time::at_offset_on_day(next_day, window.end, tz)
    } else if candidate < end {
        Some(end)
    } else {
        None
    }
}
