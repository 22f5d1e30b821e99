//! Semantic search over stored entries.
//!
//! The query is embedded with the same model as the entries and the store
//! returns the nearest rows by cosine similarity. No re-ranking happens here.

use anyhow::{bail, Result};

use crate::config::Config;
use crate::embedding::{self, EmbeddingProvider};
use crate::models::ScoredEntry;
use crate::store::postgres::PgEntryStore;
use crate::store::EntryStore;
use crate::timestamp;

pub const RESULT_SEPARATOR: &str = "===========================";

/// Reject empty queries before any API call is made.
pub fn validate_query(query: &str) -> Result<()> {
    if query.trim().is_empty() {
        bail!("query string cannot be empty");
    }
    Ok(())
}

/// Resolve the result limit from the CLI override or config.
pub fn effective_limit(config: &Config, limit: Option<i64>) -> Result<i64> {
    let limit = limit.unwrap_or(config.retrieval.limit);
    if limit < 1 {
        bail!("limit must be >= 1");
    }
    Ok(limit)
}

/// Embed `query` and return up to `limit` entries, most similar first.
pub async fn search_entries(
    query: &str,
    limit: i64,
    store: &dyn EntryStore,
    embedder: &dyn EmbeddingProvider,
) -> Result<Vec<ScoredEntry>> {
    validate_query(query)?;

    let query_vec = embedding::embed_query(embedder, query)
        .await
        .map_err(|e| e.context("error creating query embedding"))?;

    let start = std::time::Instant::now();
    let results = store.similar_entries(&query_vec, limit).await?;
    tracing::debug!(
        hits = results.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "similarity query"
    );

    Ok(results)
}

/// Render results the way `recall search` prints them.
pub fn format_results(results: &[ScoredEntry]) -> String {
    let mut out = String::new();
    for result in results {
        out.push('\n');
        out.push_str(RESULT_SEPARATOR);
        out.push_str("\n\n");
        out.push_str(&timestamp::display(&result.created_at));
        out.push('\n');
        out.push_str(result.text_or_empty());
        out.push('\n');
        out.push_str(&format!("({})\n", result.cosine_similarity));
    }
    out
}

/// Full `recall search` output, including the empty case.
pub fn render_search(results: &[ScoredEntry]) -> String {
    if results.is_empty() {
        return "No results.\n".to_string();
    }
    format_results(results)
}

pub async fn run_search(config: &Config, query: &str, limit: Option<i64>) -> Result<()> {
    validate_query(query)?;
    let limit = effective_limit(config, limit)?;

    let provider = embedding::create_provider(&config.embedding)?;
    let store = PgEntryStore::connect(config).await?;

    let result = search_entries(query, limit, &store, provider.as_ref()).await;
    store.close().await;
    print!("{}", render_search(&result?));
    Ok(())
}
