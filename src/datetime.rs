//! Date/time utilities for Folio.
//!
//! Timestamps are stored as fixed-width RFC 3339 UTC strings with millisecond
//! precision, so lexical order in SQL equals chronological order.

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};

/// Format a UTC datetime in the storage format (e.g. `2024-01-15T10:30:00.000Z`).
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Current time in the storage format.
pub fn now_timestamp() -> String {
    format_timestamp(&Utc::now())
}

/// Convert a unix timestamp (seconds) to the storage format.
pub fn from_unix(secs: i64) -> Option<String> {
    Utc.timestamp_opt(secs, 0).single().map(|dt| format_timestamp(&dt))
}
