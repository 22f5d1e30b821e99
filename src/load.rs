//! Load pipeline: CSV → token estimate → embed → insert.
//!
//! Reconciliation is by ID only. A record whose ID is already in the store is
//! skipped unconditionally, even if its text has changed since it was loaded,
//! so an entry is embedded at most once.

use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::config::Config;
use crate::csv_source;
use crate::embedding::{self, EmbeddingProvider};
use crate::models::EntryRecord;
use crate::progress::{LoadProgressEvent, LoadProgressReporter, ProgressMode};
use crate::store::postgres::PgEntryStore;
use crate::store::EntryStore;
use crate::tokens::{CostEstimate, TokenCounter};

/// Records parsed from a CSV plus the token estimate for embedding them.
#[derive(Debug)]
pub struct LoadPlan {
    pub records: Vec<EntryRecord>,
    pub estimate: CostEstimate,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LoadSummary {
    pub loaded: u64,
    pub skipped_existing: u64,
    pub skipped_empty: u64,
}

/// Parse the file and count tokens. No network or database access.
pub fn plan_load(config: &Config, file: &Path, limit: Option<usize>) -> Result<LoadPlan> {
    let mut records = csv_source::read_entries(file, &config.load.timestamp_format)?;

    if let Some(lim) = limit {
        records.truncate(lim);
    }

    let counter = TokenCounter::for_model(&config.embedding.model)?;
    let tokens: usize = records.iter().map(|r| counter.count(&r.text)).sum();

    let estimate = CostEstimate::new(records.len(), tokens, config.embedding.cost_per_1k_tokens);
    Ok(LoadPlan { records, estimate })
}

/// Text sent to the embedding model: newlines flattened to spaces.
pub fn embedding_text(text: &str) -> String {
    text.replace('\n', " ")
}

/// Embed and insert every record whose ID is not yet stored.
///
/// Records are embedded `batch_size` at a time. The first embedding or
/// insert error stops the load; records inserted before it stay inserted.
pub async fn load_entries(
    records: &[EntryRecord],
    store: &dyn EntryStore,
    embedder: &dyn EmbeddingProvider,
    batch_size: usize,
    reporter: &dyn LoadProgressReporter,
) -> Result<LoadSummary> {
    if batch_size == 0 {
        bail!("batch size must be > 0");
    }

    let mut loaded_ids = store.loaded_entry_ids().await?;
    tracing::debug!(already_loaded = loaded_ids.len(), "fetched loaded entry IDs");

    let total = records.len() as u64;
    let mut summary = LoadSummary::default();
    let mut handled = 0u64;
    let mut pending: Vec<(&EntryRecord, String)> = Vec::with_capacity(batch_size);

    for record in records {
        if loaded_ids.contains(&record.id) {
            println!("Skipping record {}", record.id);
            summary.skipped_existing += 1;
            handled += 1;
            reporter.report(LoadProgressEvent::Loading { n: handled, total });
            continue;
        }

        let text = embedding_text(&record.text);
        if text.is_empty() {
            println!("Skipping record {} due to empty text", record.id);
            summary.skipped_empty += 1;
            handled += 1;
            reporter.report(LoadProgressEvent::Loading { n: handled, total });
            continue;
        }

        // Claim the ID now so a repeated row later in the file is skipped.
        loaded_ids.insert(record.id);
        println!("Loading record {}...", record.id);
        pending.push((record, text));

        if pending.len() >= batch_size {
            handled += flush(&mut pending, store, embedder, &mut summary).await?;
            reporter.report(LoadProgressEvent::Loading { n: handled, total });
        }
    }

    if !pending.is_empty() {
        handled += flush(&mut pending, store, embedder, &mut summary).await?;
        reporter.report(LoadProgressEvent::Loading { n: handled, total });
    }

    Ok(summary)
}

async fn flush(
    pending: &mut Vec<(&EntryRecord, String)>,
    store: &dyn EntryStore,
    embedder: &dyn EmbeddingProvider,
    summary: &mut LoadSummary,
) -> Result<u64> {
    let texts: Vec<String> = pending.iter().map(|(_, text)| text.clone()).collect();
    let vectors = embedder
        .embed(&texts)
        .await
        .context("error creating embedding")?;

    if vectors.len() != pending.len() {
        bail!(
            "embedding provider returned {} vectors for {} texts",
            vectors.len(),
            pending.len()
        );
    }
    if let Some(bad) = vectors.iter().find(|v| v.len() != embedder.dims()) {
        bail!(
            "embedding has {} dimensions, expected {}",
            bad.len(),
            embedder.dims()
        );
    }

    let count = pending.len() as u64;
    for ((record, _), vector) in pending.iter().zip(vectors.iter()) {
        store.insert_entry(record, vector).await?;
        println!("Loaded record {}", record.id);
        summary.loaded += 1;
    }

    pending.clear();
    Ok(count)
}

fn print_estimate(estimate: &CostEstimate) {
    println!("total records: {}", estimate.records);
    println!("total tokens: {}", estimate.tokens);
    println!("expected cost: ${:.6}", estimate.cost_usd);
}

pub async fn run_load(
    config: &Config,
    file: &Path,
    dry_run: bool,
    limit: Option<usize>,
    progress: ProgressMode,
) -> Result<()> {
    let plan = plan_load(config, file, limit)?;
    print_estimate(&plan.estimate);

    if dry_run {
        return Ok(());
    }

    let reporter = progress.reporter();
    reporter.report(LoadProgressEvent::Read {
        file: file.display().to_string(),
        records: plan.records.len() as u64,
    });

    let provider = embedding::create_provider(&config.embedding)?;
    let store = PgEntryStore::connect(config).await?;

    let result = load_entries(
        &plan.records,
        &store,
        provider.as_ref(),
        config.embedding.batch_size,
        reporter.as_ref(),
    )
    .await;
    store.close().await;
    let summary = result?;

    println!("load {}", file.display());
    println!("  loaded: {}", summary.loaded);
    println!("  skipped (already loaded): {}", summary.skipped_existing);
    println!("  skipped (empty text): {}", summary.skipped_empty);
    println!("ok");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ScoredEntry, StoredEntry};
    use crate::progress::NoProgress;
    use crate::store::memory::InMemoryStore;
    use crate::store::EntryStats;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// Embeds text as `[len, 1.0]` and records every batch it sees.
    struct FakeEmbedder {
        batches: Mutex<Vec<Vec<String>>>,
        fail: bool,
    }

    impl FakeEmbedder {
        fn new() -> Self {
            Self {
                batches: Mutex::new(Vec::new()),
                fail: false,
            }
        }

        fn calls(&self) -> Vec<Vec<String>> {
            self.batches.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl EmbeddingProvider for FakeEmbedder {
        fn model_name(&self) -> &str {
            "fake"
        }
        fn dims(&self) -> usize {
            2
        }
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            if self.fail {
                bail!("quota exceeded");
            }
            self.batches.lock().unwrap().push(texts.to_vec());
            Ok(texts.iter().map(|t| vec![t.len() as f32, 1.0]).collect())
        }
    }

    fn record(id: i32, text: &str) -> EntryRecord {
        EntryRecord {
            id,
            creator_id: "me".to_string(),
            text: text.to_string(),
            created_at: NaiveDate::from_ymd_opt(2023, 5, 1)
                .unwrap()
                .and_hms_opt(8, 30, 0)
                .unwrap(),
            updated_at: None,
        }
    }

    #[test]
    fn newlines_become_spaces() {
        assert_eq!(embedding_text("a\nb\n\nc"), "a b  c");
    }

    #[tokio::test]
    async fn loads_new_records() {
        let store = InMemoryStore::new();
        let embedder = FakeEmbedder::new();
        let records = vec![record(1, "one"), record(2, "two")];

        let summary = load_entries(&records, &store, &embedder, 16, &NoProgress)
            .await
            .unwrap();

        assert_eq!(summary.loaded, 2);
        assert_eq!(store.len(), 2);
        assert_eq!(embedder.calls().len(), 1);
    }

    #[tokio::test]
    async fn already_loaded_ids_are_skipped_even_if_text_changed() {
        let store = InMemoryStore::new();
        store.insert_entry(&record(1, "original"), &[1.0, 1.0]).await.unwrap();
        let embedder = FakeEmbedder::new();
        let records = vec![record(1, "edited since"), record(2, "new")];

        let summary = load_entries(&records, &store, &embedder, 16, &NoProgress)
            .await
            .unwrap();

        assert_eq!(summary.skipped_existing, 1);
        assert_eq!(summary.loaded, 1);
        assert_eq!(embedder.calls(), vec![vec!["new".to_string()]]);
        let kept = store.get_entry(1).await.unwrap().unwrap();
        assert_eq!(kept.text.as_deref(), Some("original"));
    }

    #[tokio::test]
    async fn empty_text_is_skipped() {
        let store = InMemoryStore::new();
        let embedder = FakeEmbedder::new();
        let records = vec![record(1, ""), record(2, "real")];

        let summary = load_entries(&records, &store, &embedder, 16, &NoProgress)
            .await
            .unwrap();

        assert_eq!(summary.skipped_empty, 1);
        assert_eq!(summary.loaded, 1);
        assert!(store.get_entry(1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn whitespace_only_text_is_loaded() {
        let store = InMemoryStore::new();
        let embedder = FakeEmbedder::new();
        let records = vec![record(1, "\n"), record(2, "   ")];

        let summary = load_entries(&records, &store, &embedder, 16, &NoProgress)
            .await
            .unwrap();

        assert_eq!(summary.skipped_empty, 0);
        assert_eq!(summary.loaded, 2);
        assert_eq!(
            embedder.calls(),
            vec![vec![" ".to_string(), "   ".to_string()]]
        );
        let stored = store.get_entry(1).await.unwrap().unwrap();
        assert_eq!(stored.text.as_deref(), Some("\n"));
    }

    #[tokio::test]
    async fn stores_original_text_but_embeds_flattened() {
        let store = InMemoryStore::new();
        let embedder = FakeEmbedder::new();
        let records = vec![record(1, "morning\nrun")];

        load_entries(&records, &store, &embedder, 16, &NoProgress)
            .await
            .unwrap();

        assert_eq!(embedder.calls(), vec![vec!["morning run".to_string()]]);
        let stored = store.get_entry(1).await.unwrap().unwrap();
        assert_eq!(stored.text.as_deref(), Some("morning\nrun"));
    }

    #[tokio::test]
    async fn duplicate_rows_in_file_load_once() {
        let store = InMemoryStore::new();
        let embedder = FakeEmbedder::new();
        let records = vec![record(4, "first"), record(4, "second")];

        let summary = load_entries(&records, &store, &embedder, 16, &NoProgress)
            .await
            .unwrap();

        assert_eq!(summary.loaded, 1);
        assert_eq!(summary.skipped_existing, 1);
    }

    #[tokio::test]
    async fn batches_respect_batch_size() {
        let store = InMemoryStore::new();
        let embedder = FakeEmbedder::new();
        let records: Vec<EntryRecord> = (1..=5).map(|i| record(i, "text")).collect();

        load_entries(&records, &store, &embedder, 2, &NoProgress)
            .await
            .unwrap();

        let sizes: Vec<usize> = embedder.calls().iter().map(|b| b.len()).collect();
        assert_eq!(sizes, vec![2, 2, 1]);
        assert_eq!(store.len(), 5);
    }

    #[tokio::test]
    async fn embedding_failure_halts() {
        let store = InMemoryStore::new();
        let embedder = FakeEmbedder {
            batches: Mutex::new(Vec::new()),
            fail: true,
        };
        let records = vec![record(1, "one")];

        let err = load_entries(&records, &store, &embedder, 16, &NoProgress)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("error creating embedding"));
        assert!(store.is_empty());
    }

    /// Returns a fixed set of vectors regardless of how many texts it gets.
    struct CannedEmbedder {
        vectors: Vec<Vec<f32>>,
    }

    #[async_trait]
    impl EmbeddingProvider for CannedEmbedder {
        fn model_name(&self) -> &str {
            "canned"
        }
        fn dims(&self) -> usize {
            2
        }
        async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(self.vectors.clone())
        }
    }

    /// In-memory store whose insert fails for one ID.
    struct FailingStore {
        inner: InMemoryStore,
        fail_on: i32,
    }

    #[async_trait]
    impl EntryStore for FailingStore {
        async fn loaded_entry_ids(&self) -> Result<HashSet<i32>> {
            self.inner.loaded_entry_ids().await
        }
        async fn insert_entry(&self, entry: &EntryRecord, embedding: &[f32]) -> Result<()> {
            if entry.id == self.fail_on {
                bail!("connection reset");
            }
            self.inner.insert_entry(entry, embedding).await
        }
        async fn similar_entries(&self, query: &[f32], limit: i64) -> Result<Vec<ScoredEntry>> {
            self.inner.similar_entries(query, limit).await
        }
        async fn get_entry(&self, id: i32) -> Result<Option<StoredEntry>> {
            self.inner.get_entry(id).await
        }
        async fn stats(&self) -> Result<EntryStats> {
            self.inner.stats().await
        }
    }

    #[tokio::test]
    async fn short_embedding_response_is_an_error() {
        let store = InMemoryStore::new();
        let embedder = CannedEmbedder {
            vectors: vec![vec![1.0, 0.0]],
        };
        let records = vec![record(1, "one"), record(2, "two")];

        let err = load_entries(&records, &store, &embedder, 16, &NoProgress)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("returned 1 vectors for 2 texts"));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn wrong_dimension_embedding_is_an_error() {
        let store = InMemoryStore::new();
        let embedder = CannedEmbedder {
            vectors: vec![vec![1.0, 0.0, 0.0]],
        };
        let records = vec![record(1, "one")];

        let err = load_entries(&records, &store, &embedder, 16, &NoProgress)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("expected 2"));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn insert_failure_halts_and_keeps_earlier_rows() {
        let store = FailingStore {
            inner: InMemoryStore::new(),
            fail_on: 2,
        };
        let embedder = FakeEmbedder::new();
        let records = vec![record(1, "one"), record(2, "two"), record(3, "three")];

        let err = load_entries(&records, &store, &embedder, 16, &NoProgress)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("connection reset"));
        assert!(store.get_entry(1).await.unwrap().is_some());
        assert!(store.get_entry(3).await.unwrap().is_none());
        assert_eq!(store.inner.len(), 1);
    }

    #[test]
    fn plan_counts_tokens_and_applies_limit() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("entries.csv");
        std::fs::write(
            &path,
            "id,text,creator_id,created_at,updated_at\n\
             1,hello world,u,2023-01-01 00:00:00.000,\n\
             2,hello world,u,2023-01-02 00:00:00.000,\n\
             3,hello world,u,2023-01-03 00:00:00.000,\n",
        )
        .unwrap();

        let plan = plan_load(&Config::default(), &path, Some(2)).unwrap();
        assert_eq!(plan.records.len(), 2);
        assert_eq!(plan.estimate.records, 2);
        assert_eq!(plan.estimate.tokens, 4);
    }
}
