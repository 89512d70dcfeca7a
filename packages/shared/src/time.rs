//! Time-related utilities for message timestamps.

use chrono::{DateTime, FixedOffset, Local, TimeZone, Utc};

/// Layout used for message timestamps: long date followed by long time.
///
/// e.g. `January 1, 2023 at 12:00:00 AM +09:00`
const LONG_DATE_TIME: &str = "%B %-d, %Y at %-I:%M:%S %p %:z";

/// Get current Unix timestamp (milliseconds)
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Convert Unix timestamp (milliseconds) to a `DateTime` in the given zone.
///
/// Returns `None` when the timestamp is outside the range chrono can represent.
fn to_zoned<Tz: TimeZone>(timestamp_millis: i64, zone: &Tz) -> Option<DateTime<Tz>> {
    DateTime::<Utc>::from_timestamp_millis(timestamp_millis).map(|dt| dt.with_timezone(zone))
}

/// Format a Unix timestamp (milliseconds) as long date + long time in `offset`.
///
/// Out-of-range timestamps fall back to the raw millisecond value.
pub fn format_timestamp(timestamp_millis: i64, offset: &FixedOffset) -> String {
    match to_zoned(timestamp_millis, offset) {
        Some(dt) => dt.format(LONG_DATE_TIME).to_string(),
        None => timestamp_millis.to_string(),
    }
}

/// Format a Unix timestamp (milliseconds) as long date + long time in the local zone.
pub fn format_local_timestamp(timestamp_millis: i64) -> String {
    match to_zoned(timestamp_millis, &Local) {
        Some(dt) => dt.format(LONG_DATE_TIME).to_string(),
        None => timestamp_millis.to_string(),
    }
}
