//! Timestamp utilities
//!
//! All stored timestamps are naive UTC so they compare lexically inside
//! SQLite and match `CURRENT_TIMESTAMP`.

use chrono::{DateTime, NaiveDateTime, Utc};

/// Get current UTC timestamp without offset
pub fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

/// Current Unix time in whole seconds
pub fn unix_now() -> i64 {
    Utc::now().timestamp()
}

/// Convert a client timestamp to the stored representation
pub fn to_storage(ts: DateTime<Utc>) -> NaiveDateTime {
    ts.naive_utc()
}

/// Whole seconds from `start` to `end` (negative if `end` is earlier)
pub fn seconds_between(start: NaiveDateTime, end: NaiveDateTime) -> i64 {
    (end - start).num_seconds()
}

/// Parse a timestamp sent by the extension into storage form
///
/// RFC 3339 with an offset is converted to UTC; a naive timestamp (`T` or
/// space separated) is taken as UTC already.
pub fn parse_client_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(to_storage(ts.with_timezone(&Utc)));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}
