//! Postgres + pgvector implementation of [`EntryStore`].
//!
//! Similarity ranking is done entirely by the database: `<=>` is pgvector's
//! cosine distance, so `1 - distance` is the cosine similarity.

use std::collections::HashSet;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use pgvector::Vector;
use sqlx::PgPool;

use super::{CreatorCount, EntryStats, EntryStore};
use crate::config::Config;
use crate::db;
use crate::models::{EntryRecord, ScoredEntry, StoredEntry};

pub struct PgEntryStore {
    pool: PgPool,
}

impl PgEntryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(config: &Config) -> Result<Self> {
        Ok(Self::new(db::connect(config).await?))
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl EntryStore for PgEntryStore {
    async fn loaded_entry_ids(&self) -> Result<HashSet<i32>> {
        let ids: Vec<i32> = sqlx::query_scalar("SELECT id FROM entries")
            .fetch_all(&self.pool)
            .await
            .context("error getting entry IDs")?;
        Ok(ids.into_iter().collect())
    }

    async fn insert_entry(&self, entry: &EntryRecord, embedding: &[f32]) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO entries (id, creator_id, text, created_at, updated_at, embedding)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(entry.id)
        .bind(&entry.creator_id)
        .bind(&entry.text)
        .bind(entry.created_at)
        .bind(entry.updated_at)
        .bind(Vector::from(embedding.to_vec()))
        .execute(&self.pool)
        .await
        .with_context(|| format!("error loading entry {} into database", entry.id))?;

        Ok(())
    }

    async fn similar_entries(&self, query: &[f32], limit: i64) -> Result<Vec<ScoredEntry>> {
        let rows = sqlx::query_as::<_, ScoredEntry>(
            r#"
            SELECT id, creator_id, text, created_at, updated_at,
                   1 - (embedding <=> $1) AS cosine_similarity
            FROM entries
            ORDER BY embedding <=> $1
            LIMIT $2
            "#,
        )
        .bind(Vector::from(query.to_vec()))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("error listing entries from database")?;

        Ok(rows)
    }

    async fn get_entry(&self, id: i32) -> Result<Option<StoredEntry>> {
        let row = sqlx::query_as::<_, StoredEntry>(
            "SELECT id, creator_id, text, created_at, updated_at FROM entries WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn stats(&self) -> Result<EntryStats> {
        let (total, updated, first_created_at, last_created_at): (
            i64,
            i64,
            Option<NaiveDateTime>,
            Option<NaiveDateTime>,
        ) = sqlx::query_as(
            r#"
            SELECT COUNT(*), COUNT(updated_at), MIN(created_at), MAX(created_at)
            FROM entries
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let per_creator = sqlx::query_as::<_, CreatorCount>(
            r#"
            SELECT creator_id, COUNT(*) AS entries
            FROM entries
            GROUP BY creator_id
            ORDER BY entries DESC, creator_id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(EntryStats {
            total,
            updated,
            first_created_at,
            last_created_at,
            per_creator,
        })
    }
}
