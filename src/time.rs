//! Epoch-millisecond clock and local-calendar helpers.
//!
//! All instants in the engine are `u64` milliseconds since the Unix epoch.
//! Calendar questions ("which local day is this?", "what is 22:00 on that
//! day?") are answered against an explicit [`chrono::TimeZone`] so the
//! scheduling functions stay pure and testable with fixed zones.

use chrono::{
    DateTime, Days, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone,
};
use std::time::Duration;

/// One calendar day as a fixed duration.
pub const ONE_DAY: Duration = Duration::from_secs(86_400);

/// One hour as a fixed duration.
pub const ONE_HOUR: Duration = Duration::from_secs(3_600);

/// Returns current UTC milliseconds since epoch.
pub fn now_epoch_millis() -> u64 {
    match std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH) {
        Ok(duration) => u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
        Err(_) => 0,
    }
}

/// Converts a duration to whole milliseconds, saturating at `u64::MAX`.
#[must_use]
pub fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Converts an epoch-millisecond instant to a zoned date-time.
///
/// Returns `None` for instants chrono cannot represent.
pub fn to_datetime<Tz: TimeZone>(millis: u64, tz: &Tz) -> Option<DateTime<Tz>> {
    let millis = i64::try_from(millis).ok()?;
    tz.timestamp_millis_opt(millis).single()
}

/// Converts a zoned date-time back to epoch milliseconds (clamped at 0).
pub fn to_epoch_millis<Tz: TimeZone>(datetime: &DateTime<Tz>) -> u64 {
    u64::try_from(datetime.timestamp_millis()).unwrap_or(0)
}

/// Local wall-clock date-time of an instant.
pub fn local_naive<Tz: TimeZone>(millis: u64, tz: &Tz) -> Option<NaiveDateTime> {
    to_datetime(millis, tz).map(|dt| dt.naive_local())
}

/// Local calendar date of an instant.
pub fn local_date<Tz: TimeZone>(millis: u64, tz: &Tz) -> Option<NaiveDate> {
    to_datetime(millis, tz).map(|dt| dt.date_naive())
}

/// Returns `true` when both instants fall on the same local calendar day.
pub fn same_local_day<Tz: TimeZone>(a: u64, b: u64, tz: &Tz) -> bool {
    match (local_date(a, tz), local_date(b, tz)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Resolves a local wall-clock date-time to an instant.
///
/// Ambiguous times (clocks falling back) resolve to the earlier instant.
/// Times inside a DST gap are pushed forward by the usual one-hour shift.
pub fn resolve_local<Tz: TimeZone>(naive: NaiveDateTime, tz: &Tz) -> Option<u64> {
    let resolved = match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => {
            let shifted = naive.checked_add_signed(TimeDelta::hours(1))?;
            tz.from_local_datetime(&shifted).earliest()?
        }
    };
    Some(to_epoch_millis(&resolved))
}

/// The instant at `offset` past local midnight on `date`.
///
/// The offset is applied to the wall clock, so `22:00` stays `22:00` on
/// days where DST shifts the length of the day.
pub fn at_offset_on_day<Tz: TimeZone>(date: NaiveDate, offset: Duration, tz: &Tz) -> Option<u64> {
    let offset = TimeDelta::from_std(offset).ok()?;
    let naive = date.and_time(NaiveTime::MIN).checked_add_signed(offset)?;
    resolve_local(naive, tz)
}

/// Start of the local calendar day containing `millis`.
pub fn start_of_local_day<Tz: TimeZone>(millis: u64, tz: &Tz) -> Option<u64> {
    let date = local_date(millis, tz)?;
    at_offset_on_day(date, Duration::ZERO, tz)
}

/// Adds whole calendar days to a local date.
pub fn add_days(date: NaiveDate, days: u64) -> Option<NaiveDate> {
    date.checked_add_days(Days::new(days))
}
