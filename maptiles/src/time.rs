//! Time-related utility functions.
//!
//! Task timestamps are stored as Unix epoch milliseconds so they survive
//! process restarts and can be compared across the launcher, the worker and
//! the reconciler.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Current wall-clock time as Unix epoch milliseconds.
pub fn now_ms() -> i64 {
    system_time_to_ms(SystemTime::now())
}

/// Convert a `SystemTime` to Unix epoch milliseconds.
///
/// Times before the epoch collapse to 0.
pub fn system_time_to_ms(time: SystemTime) -> i64 {
    time.duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

/// Milliseconds in a duration, saturating at `i64::MAX`.
pub fn duration_ms(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}
