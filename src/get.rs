//! Entry retrieval by ID.

use anyhow::{bail, Result};

use crate::config::Config;
use crate::models::StoredEntry;
use crate::store::postgres::PgEntryStore;
use crate::store::EntryStore;
use crate::timestamp;

pub async fn get_entry(store: &dyn EntryStore, id: i32) -> Result<StoredEntry> {
    match store.get_entry(id).await? {
        Some(entry) => Ok(entry),
        None => bail!("entry not found: {}", id),
    }
}

pub fn format_entry(entry: &StoredEntry) -> String {
    let updated = entry
        .updated_at
        .as_ref()
        .map(timestamp::display)
        .unwrap_or_else(|| "(never)".to_string());

    format!(
        "--- Entry ---\n\
         id:          {}\n\
         creator_id:  {}\n\
         created_at:  {}\n\
         updated_at:  {}\n\
         \n\
         --- Text ---\n\
         {}\n",
        entry.id,
        entry.creator_id,
        timestamp::display(&entry.created_at),
        updated,
        entry.text.as_deref().unwrap_or("")
    )
}

/// CLI entry point — fetches the entry and prints it to stdout.
pub async fn run_get(config: &Config, id: i32) -> Result<()> {
    let store = PgEntryStore::connect(config).await?;
    let result = get_entry(&store, id).await;
    store.close().await;

    print!("{}", format_entry(&result?));
    Ok(())
}
