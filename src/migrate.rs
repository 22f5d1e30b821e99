use anyhow::{Context, Result};
use sqlx::PgPool;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    apply_schema(&pool, config.embedding.dims).await?;
    pool.close().await;
    Ok(())
}

/// Create the `vector` extension, the `entries` table and its indexes.
///
/// Every statement is `IF NOT EXISTS`, so this is safe to run repeatedly.
/// The embedding column width is fixed at creation time; changing
/// `embedding.dims` afterwards requires a fresh table.
pub async fn apply_schema(pool: &PgPool, dims: usize) -> Result<()> {
    sqlx::query("CREATE EXTENSION IF NOT EXISTS vector")
        .execute(pool)
        .await
        .context("error creating vector extension")?;

    // Column type is interpolated: DDL cannot take bind parameters.
    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS entries (
            id INTEGER PRIMARY KEY,
            creator_id TEXT NOT NULL,
            text TEXT,
            created_at TIMESTAMP NOT NULL,
            updated_at TIMESTAMP,
            embedding vector({}) NOT NULL
        )
        "#,
        dims
    ))
    .execute(pool)
    .await
    .context("error creating entries table")?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_entries_embedding ON entries USING hnsw (embedding vector_cosine_ops)",
    )
    .execute(pool)
    .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_entries_created_at ON entries(created_at DESC)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_entries_creator_id ON entries(creator_id)")
        .execute(pool)
        .await?;

    Ok(())
}
