//! Timestamp utilities
//!
//! Timestamps are persisted as RFC 3339 UTC strings with fixed microsecond
//! precision so that stored values sort lexicographically in time order.

use chrono::{DateTime, Duration, SecondsFormat, Utc};

use crate::{Error, Result};

/// Default case window when no deadline is given
pub const DEFAULT_CASE_WINDOW_HOURS: i64 = 72;

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Format a timestamp for storage
pub fn to_db_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp, normalizing any offset to UTC
pub fn from_db_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("Invalid stored timestamp '{}': {}", raw, e)))
}

/// Resolve a case's start and deadline times
///
/// Start defaults to now; deadline defaults to start + 72h.
pub fn derive_case_times(
    start_time: Option<DateTime<Utc>>,
    deadline_time: Option<DateTime<Utc>>,
) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = start_time.unwrap_or_else(now);
    let deadline =
        deadline_time.unwrap_or_else(|| start + Duration::hours(DEFAULT_CASE_WINDOW_HOURS));
    (start, deadline)
}
