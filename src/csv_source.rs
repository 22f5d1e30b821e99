//! CSV reader for journal exports.
//!
//! The export has a header row followed by positional columns
//! `id, text, creator_id, created_at, updated_at`. Every row is parsed up
//! front so a malformed file fails before any API or database call.

use anyhow::{bail, Context, Result};
use std::io::Read;
use std::path::Path;

use crate::models::EntryRecord;
use crate::timestamp;

const COL_ID: usize = 0;
const COL_TEXT: usize = 1;
const COL_CREATOR_ID: usize = 2;
const COL_CREATED_AT: usize = 3;
const COL_UPDATED_AT: usize = 4;
const MIN_COLUMNS: usize = 5;

pub fn read_entries(path: &Path, timestamp_format: &str) -> Result<Vec<EntryRecord>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("error opening file: {}", path.display()))?;
    parse_entries(file, timestamp_format)
}

pub fn parse_entries<R: Read>(reader: R, timestamp_format: &str) -> Result<Vec<EntryRecord>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut entries = Vec::new();

    for (index, row) in csv_reader.records().enumerate() {
        let row = row.with_context(|| format!("error reading CSV record {}", index + 1))?;
        // Quoted newlines make record index and file line diverge.
        let line = row.position().map(|p| p.line()).unwrap_or(index as u64 + 2);
        let entry = row_to_entry(&row, timestamp_format)
            .with_context(|| format!("invalid record at line {}", line))?;
        entries.push(entry);
    }

    Ok(entries)
}

fn row_to_entry(row: &csv::StringRecord, timestamp_format: &str) -> Result<EntryRecord> {
    if row.len() < MIN_COLUMNS {
        bail!(
            "expected {} columns (id, text, creator_id, created_at, updated_at), found {}",
            MIN_COLUMNS,
            row.len()
        );
    }

    let id: i32 = field(row, COL_ID)
        .trim()
        .parse()
        .with_context(|| format!("error converting ID '{}' to int", field(row, COL_ID)))?;

    let created_at = timestamp::parse_required(field(row, COL_CREATED_AT), timestamp_format)
        .context("error parsing created_at")?;
    let updated_at = timestamp::parse_optional(field(row, COL_UPDATED_AT), timestamp_format)
        .context("error parsing updated_at")?;

    Ok(EntryRecord {
        id,
        text: field(row, COL_TEXT).to_string(),
        creator_id: field(row, COL_CREATOR_ID).to_string(),
        created_at,
        updated_at,
    })
}

fn field(row: &csv::StringRecord, index: usize) -> &str {
    row.get(index).unwrap_or_default()
}
