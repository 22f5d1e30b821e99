//! Storage abstraction for journal entries.
//!
//! The [`EntryStore`] trait covers every operation the load, search, and
//! summarize pipelines need, so they run the same against Postgres
//! ([`postgres::PgEntryStore`]) and the in-memory store used in tests
//! ([`memory::InMemoryStore`]).
//!
//! | Method | Purpose |
//! |--------|---------|
//! | [`loaded_entry_ids`](EntryStore::loaded_entry_ids) | IDs already present (load reconciliation) |
//! | [`insert_entry`](EntryStore::insert_entry) | Store a new entry with its embedding |
//! | [`similar_entries`](EntryStore::similar_entries) | Nearest entries by cosine similarity |
//! | [`get_entry`](EntryStore::get_entry) | One entry by ID |
//! | [`stats`](EntryStore::stats) | Counts and date range |

pub mod memory;
pub mod postgres;

use std::collections::HashSet;

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::models::{EntryRecord, ScoredEntry, StoredEntry};

/// Entries written by one creator.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct CreatorCount {
    pub creator_id: String,
    pub entries: i64,
}

/// Summary of what has been loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryStats {
    pub total: i64,
    pub updated: i64,
    pub first_created_at: Option<NaiveDateTime>,
    pub last_created_at: Option<NaiveDateTime>,
    /// Sorted by entry count, descending.
    pub per_creator: Vec<CreatorCount>,
}

#[async_trait]
pub trait EntryStore: Send + Sync {
    /// IDs of every stored entry.
    async fn loaded_entry_ids(&self) -> Result<HashSet<i32>>;

    /// Insert a new entry. Entries are never updated, so an existing ID is
    /// an error.
    async fn insert_entry(&self, entry: &EntryRecord, embedding: &[f32]) -> Result<()>;

    /// Up to `limit` entries, most similar first.
    async fn similar_entries(&self, query: &[f32], limit: i64) -> Result<Vec<ScoredEntry>>;

    async fn get_entry(&self, id: i32) -> Result<Option<StoredEntry>>;

    async fn stats(&self) -> Result<EntryStats>;
}
