//! Conversion helpers between Rust types and their SQLite TEXT/INTEGER
//! representations.
//!
//! Timestamps are stored as fixed-width RFC3339 text (UTC, microsecond
//! precision). The fixed width matters: seek predicates compare these columns
//! as TEXT, and only a constant-width encoding keeps lexicographic order equal
//! to chronological order.

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};

/// Render a timestamp in the canonical column format,
/// e.g. `2026-06-01T12:00:00.000000Z`.
pub fn datetime_to_str(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Current time in the canonical column format.
pub fn now_str() -> String {
    datetime_to_str(Utc::now())
}

/// Parse a timestamp column back into a `DateTime<Utc>`.
pub fn str_to_datetime(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("invalid datetime in database: {s}"))
}

/// SQLite has no BOOLEAN; flags are stored as 0/1 INTEGER.
pub fn int_to_bool(i: i64) -> bool {
    i != 0
}
