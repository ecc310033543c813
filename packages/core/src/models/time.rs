//! Timestamp parsing and formatting helpers
//!
//! SQLite `CURRENT_TIMESTAMP` produces `"YYYY-MM-DD HH:MM:SS"`; rows
//! written by application code may carry RFC3339. Both are accepted on
//! read, and all application writes use the SQLite format so string
//! comparisons in SQL stay consistent.

use anyhow::Result;
use chrono::{DateTime, NaiveDateTime, Utc};

const SQLITE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse a timestamp from the database, accepting SQLite and RFC3339 formats.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, SQLITE_FORMAT) {
        return Ok(naive.and_utc());
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    Err(anyhow::anyhow!(
        "Unable to parse timestamp '{}' as SQLite or RFC3339 format",
        s
    ))
}

/// Format a timestamp the way SQLite's `CURRENT_TIMESTAMP` does.
pub fn to_sqlite(dt: DateTime<Utc>) -> String {
    dt.format(SQLITE_FORMAT).to_string()
}
