//! In-memory [`EntryStore`] implementation for tests.
//!
//! Uses a `BTreeMap` behind `std::sync::RwLock`. Similarity search is
//! brute-force cosine similarity over every stored vector.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::RwLock;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;

use super::{CreatorCount, EntryStats, EntryStore};
use crate::models::{EntryRecord, ScoredEntry, StoredEntry};

struct StoredVector {
    entry: StoredEntry,
    vector: Vec<f32>,
}

pub struct InMemoryStore {
    entries: RwLock<BTreeMap<i32, StoredVector>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<T>(_: T) -> anyhow::Error {
    anyhow!("in-memory store lock poisoned")
}

/// Cosine similarity in `[-1.0, 1.0]`; `0.0` for empty or mismatched vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }

    dot / denom
}

#[async_trait]
impl EntryStore for InMemoryStore {
    async fn loaded_entry_ids(&self) -> Result<HashSet<i32>> {
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(entries.keys().copied().collect())
    }

    async fn insert_entry(&self, entry: &EntryRecord, embedding: &[f32]) -> Result<()> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        if entries.contains_key(&entry.id) {
            bail!("entry {} already exists", entry.id);
        }
        entries.insert(
            entry.id,
            StoredVector {
                entry: StoredEntry {
                    id: entry.id,
                    creator_id: entry.creator_id.clone(),
                    text: Some(entry.text.clone()),
                    created_at: entry.created_at,
                    updated_at: entry.updated_at,
                },
                vector: embedding.to_vec(),
            },
        );
        Ok(())
    }

    async fn similar_entries(&self, query: &[f32], limit: i64) -> Result<Vec<ScoredEntry>> {
        let entries = self.entries.read().map_err(poisoned)?;

        let mut scored: Vec<ScoredEntry> = entries
            .values()
            .map(|sv| ScoredEntry {
                id: sv.entry.id,
                creator_id: sv.entry.creator_id.clone(),
                text: sv.entry.text.clone(),
                created_at: sv.entry.created_at,
                updated_at: sv.entry.updated_at,
                cosine_similarity: cosine_similarity(query, &sv.vector) as f64,
            })
            .collect();

        scored.sort_by(|a, b| {
            b.cosine_similarity
                .partial_cmp(&a.cosine_similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(limit.max(0) as usize);
        Ok(scored)
    }

    async fn get_entry(&self, id: i32) -> Result<Option<StoredEntry>> {
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(entries.get(&id).map(|sv| sv.entry.clone()))
    }

    async fn stats(&self) -> Result<EntryStats> {
        let entries = self.entries.read().map_err(poisoned)?;

        let mut counts: HashMap<&str, i64> = HashMap::new();
        for sv in entries.values() {
            *counts.entry(sv.entry.creator_id.as_str()).or_insert(0) += 1;
        }
        let mut per_creator: Vec<CreatorCount> = counts
            .into_iter()
            .map(|(creator_id, entries)| CreatorCount {
                creator_id: creator_id.to_string(),
                entries,
            })
            .collect();
        per_creator.sort_by(|a, b| {
            b.entries
                .cmp(&a.entries)
                .then_with(|| a.creator_id.cmp(&b.creator_id))
        });

        Ok(EntryStats {
            total: entries.len() as i64,
            updated: entries
                .values()
                .filter(|sv| sv.entry.updated_at.is_some())
                .count() as i64,
            first_created_at: entries.values().map(|sv| sv.entry.created_at).min(),
            last_created_at: entries.values().map(|sv| sv.entry.created_at).max(),
            per_creator,
        })
    }
}
