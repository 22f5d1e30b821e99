//! Token counting for cost estimates and context budgets.
//!
//! Uses the BPE that the embedding model itself uses (`cl100k_base` for
//! `text-embedding-ada-002` and the `text-embedding-3-*` family), so the
//! counts match what the API bills.

use anyhow::{Context, Result};
use tiktoken_rs::CoreBPE;

pub struct TokenCounter {
    bpe: CoreBPE,
}

impl TokenCounter {
    /// Tokenizer for `model`, falling back to `cl100k_base` when tiktoken
    /// has no mapping for the name.
    pub fn for_model(model: &str) -> Result<Self> {
        let bpe = match tiktoken_rs::get_bpe_from_model(model) {
            Ok(bpe) => bpe,
            Err(_) => {
                tracing::debug!(model, "no tokenizer mapping, using cl100k_base");
                tiktoken_rs::cl100k_base().context("error creating tokenizer")?
            }
        };
        Ok(Self { bpe })
    }

    pub fn count(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }
}

/// Pre-flight numbers printed by `recall load` before anything is embedded.
#[derive(Debug, Clone, PartialEq)]
pub struct CostEstimate {
    pub records: usize,
    pub tokens: usize,
    pub cost_usd: f64,
}

impl CostEstimate {
    pub fn new(records: usize, tokens: usize, cost_per_1k_tokens: f64) -> Self {
        Self {
            records,
            tokens,
            cost_usd: tokens as f64 / 1000.0 * cost_per_1k_tokens,
        }
    }
}
