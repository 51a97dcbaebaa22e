//! Scheduled-minute derivation from request timestamps.
//!
//! Material requests carry a literal `DD/MM/YYYY, HH:MM:SS` timestamp; the
//! matcher only needs its minute-of-day. A malformed timestamp is local to
//! that one task: the caller skips it and the run continues.

use chrono::{Local, NaiveDateTime, Timelike};

/// Literal request timestamp format, e.g. `01/01/2024, 09:00:00`.
const REQUEST_TIME_FORMAT: &str = "%d/%m/%Y, %H:%M:%S";

/// Parse a request timestamp into its minute-of-day (0..=1439).
pub fn scheduled_minute(raw: &str) -> Result<i64, chrono::ParseError> {
    let parsed = NaiveDateTime::parse_from_str(raw.trim(), REQUEST_TIME_FORMAT)?;
    Ok(i64::from(parsed.hour()) * 60 + i64::from(parsed.minute()))
}

/// Current local minute-of-day, used to filter the clinical fleet snapshot.
pub fn current_minute() -> i64 {
    let now = Local::now();
    i64::from(now.hour()) * 60 + i64::from(now.minute())
}
