//! Retrieval-augmented summary of journal entries.
//!
//! Nearest entries become the context of a chat-completion prompt that asks
//! for a summary about the query, using only that context.

use anyhow::Result;

use crate::chat::{ChatMessage, ChatModel, OpenAIChat};
use crate::config::Config;
use crate::embedding::{self, EmbeddingProvider};
use crate::models::ScoredEntry;
use crate::search;
use crate::store::postgres::PgEntryStore;
use crate::store::EntryStore;
use crate::tokens::TokenCounter;

/// Concatenate entry texts, most similar first, each followed by a blank
/// line, stopping before the entry that would push the context past
/// `max_tokens`. The first entry is always included.
pub fn build_context(results: &[ScoredEntry], counter: &TokenCounter, max_tokens: usize) -> String {
    let mut context = String::new();
    let mut used = 0usize;

    for (i, result) in results.iter().enumerate() {
        let piece = format!("{}\n\n", result.text_or_empty());
        let cost = counter.count(&piece);

        if i > 0 && used + cost > max_tokens {
            tracing::debug!(included = i, dropped = results.len() - i, "context budget reached");
            break;
        }

        used += cost;
        context.push_str(&piece);
    }

    context
}

pub fn build_messages(context: &str, query: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(format!(
            "You are a neutral agent helping to summarize content from a journal. \n Here are some posts to give you context: \n {}",
            context
        )),
        ChatMessage::user(format!(
            "Using only the context above, Write a summary about {}",
            query
        )),
    ]
}

/// Summarize the entries nearest to `query`.
///
/// Returns `None` when the store has nothing to summarize; the chat model
/// is not called in that case.
pub async fn summarize_entries(
    query: &str,
    limit: i64,
    store: &dyn EntryStore,
    embedder: &dyn EmbeddingProvider,
    chat: &dyn ChatModel,
    counter: &TokenCounter,
    max_context_tokens: usize,
) -> Result<Option<String>> {
    let results = search::search_entries(query, limit, store, embedder).await?;
    if results.is_empty() {
        return Ok(None);
    }

    let context = build_context(&results, counter, max_context_tokens);
    let messages = build_messages(&context, query);

    tracing::debug!(model = chat.model_name(), entries = results.len(), "requesting summary");
    let summary = chat.complete(&messages).await?;
    Ok(Some(summary))
}

pub async fn run_summarize(config: &Config, query: &str, limit: Option<i64>) -> Result<()> {
    search::validate_query(query)?;
    let limit = search::effective_limit(config, limit)?;

    let provider = embedding::create_provider(&config.embedding)?;
    let chat = OpenAIChat::new(&config.chat)?;
    let counter = TokenCounter::for_model(&config.chat.model)?;
    let store = PgEntryStore::connect(config).await?;

    let result = summarize_entries(
        query,
        limit,
        &store,
        provider.as_ref(),
        &chat,
        &counter,
        config.summarize.max_context_tokens,
    )
    .await;
    store.close().await;

    match result? {
        Some(summary) => {
            println!();
            println!("{}", summary);
            println!();
        }
        None => println!("No entries to summarize."),
    }

    Ok(())
}
