//! Core data models used throughout journal-recall.
//!
//! A journal entry moves through three shapes: parsed from CSV
//! ([`EntryRecord`]), read back from Postgres ([`StoredEntry`]), and ranked
//! against a query ([`ScoredEntry`]).

use chrono::NaiveDateTime;

/// One CSV row after parsing, before it is embedded and stored.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryRecord {
    pub id: i32,
    pub creator_id: String,
    pub text: String,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

/// A row of the `entries` table, without its embedding.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StoredEntry {
    pub id: i32,
    pub creator_id: String,
    pub text: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

/// An entry ranked by cosine similarity to a query embedding.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ScoredEntry {
    pub id: i32,
    pub creator_id: String,
    pub text: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
    pub cosine_similarity: f64,
}

impl ScoredEntry {
    /// Entry text, or empty when the column is NULL.
    pub fn text_or_empty(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }
}
