//! Timestamp utilities

use chrono::{DateTime, Duration as ChronoDuration, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Current timestamp, at least one millisecond after `previous`
///
/// Record timestamps are stored at millisecond precision and must advance on
/// every update, even when the wall clock steps backwards or two updates land
/// in the same millisecond.
pub fn now_after(previous: DateTime<Utc>) -> DateTime<Utc> {
    now().max(previous + ChronoDuration::milliseconds(1))
}

/// Convert milliseconds to duration
pub fn millis_to_duration(millis: u64) -> std::time::Duration {
    std::time::Duration::from_millis(millis)
}
