//! Conversion between the CSV's textual timestamps and the `TIMESTAMP`
//! columns in Postgres.
//!
//! `created_at` is mandatory. `updated_at` is nullable: an empty cell, or a
//! value equal to the zero instant `0001-01-01 00:00:00`, maps to `None`.

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};

/// Parse a required timestamp cell.
pub fn parse_required(value: &str, format: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value.trim(), format)
        .with_context(|| format!("invalid timestamp '{}' (expected format '{}')", value, format))
}

/// Parse a nullable timestamp cell.
pub fn parse_optional(value: &str, format: &str) -> Result<Option<NaiveDateTime>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let parsed = parse_required(trimmed, format)?;
    if is_zero(&parsed) {
        return Ok(None);
    }
    Ok(Some(parsed))
}

fn is_zero(ts: &NaiveDateTime) -> bool {
    NaiveDate::from_ymd_opt(1, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .is_some_and(|zero| *ts == zero)
}

/// Render a stored timestamp the way the CLI prints it.
pub fn display(ts: &NaiveDateTime) -> String {
    ts.format("%Y-%m-%d %H:%M:%S%.3f").to_string()
}
