//! Database statistics.
//!
//! A quick summary of what has been loaded: entry counts, how many carry an
//! update timestamp, the date range, and a per-creator breakdown. Used by
//! `recall stats` to confirm a load did what was expected.

use anyhow::Result;

use crate::config::Config;
use crate::store::postgres::PgEntryStore;
use crate::store::{EntryStats, EntryStore};
use crate::timestamp;

pub fn format_stats(stats: &EntryStats) -> String {
    let mut out = String::new();
    out.push_str("journal-recall — Entry Stats\n");
    out.push_str("============================\n\n");
    out.push_str(&format!("  Entries:     {}\n", stats.total));
    out.push_str(&format!("  Updated:     {}\n", stats.updated));

    match (&stats.first_created_at, &stats.last_created_at) {
        (Some(first), Some(last)) => {
            out.push_str(&format!("  First:       {}\n", timestamp::display(first)));
            out.push_str(&format!("  Last:        {}\n", timestamp::display(last)));
        }
        _ => out.push_str("  (no entries loaded)\n"),
    }

    if !stats.per_creator.is_empty() {
        out.push('\n');
        out.push_str(&format!("  {:<24} {:>8}\n", "CREATOR", "ENTRIES"));
        for c in &stats.per_creator {
            out.push_str(&format!("  {:<24} {:>8}\n", c.creator_id, c.entries));
        }
    }

    out
}

/// Run the stats command: query the database and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let store = PgEntryStore::connect(config).await?;
    let result = store.stats().await;
    store.close().await;

    print!("{}", format_stats(&result?));
    Ok(())
}
