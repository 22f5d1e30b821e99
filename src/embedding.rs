//! Embedding provider abstraction and implementations.
//!
//! Defines the [`EmbeddingProvider`] trait and concrete implementations:
//! - **[`DisabledProvider`]** — returns errors; used when embeddings are not configured.
//! - **[`OpenAIProvider`]** — calls the OpenAI embeddings API with retry and backoff.
//!
//! # Provider Selection
//!
//! Use [`create_provider`] to instantiate the appropriate provider based
//! on the configuration:
//!
//! ```rust,no_run
//! # use journal_recall::config::EmbeddingConfig;
//! # use journal_recall::embedding::create_provider;
//! let config = EmbeddingConfig {
//!     provider: "disabled".to_string(),
//!     ..EmbeddingConfig::default()
//! };
//! let provider = create_provider(&config).unwrap();
//! assert_eq!(provider.model_name(), "disabled");
//! ```

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use serde::Deserialize;

use crate::config::EmbeddingConfig;
use crate::openai::{self, ApiClient};

/// Trait for embedding providers.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Returns the model identifier (e.g. `"text-embedding-ada-002"`).
    fn model_name(&self) -> &str;
    /// Returns the embedding vector dimensionality (e.g. `1536`).
    fn dims(&self) -> usize;
    /// Embed a batch of texts, returning one vector per input in input order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Embed a single query text.
pub async fn embed_query(provider: &dyn EmbeddingProvider, text: &str) -> Result<Vec<f32>> {
    let results = provider.embed(&[text.to_string()]).await?;
    results
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("Empty embedding response"))
}

// ============ Disabled Provider ============

/// A no-op embedding provider that always returns errors.
///
/// Used when `embedding.provider = "disabled"`. Dry-run loads still work.
pub struct DisabledProvider;

#[async_trait]
impl EmbeddingProvider for DisabledProvider {
    fn model_name(&self) -> &str {
        "disabled"
    }
    fn dims(&self) -> usize {
        0
    }
    async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        bail!("Embedding provider is disabled. Set [embedding] provider in config.")
    }
}

// ============ OpenAI Provider ============

/// Embedding provider using `POST {base_url}/embeddings`.
pub struct OpenAIProvider {
    model: String,
    dims: usize,
    client: ApiClient,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

impl OpenAIProvider {
    /// Create a provider using the key in `OPENAI_API_KEY`.
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        Self::with_api_key(config, openai::api_key_from_env()?)
    }

    pub fn with_api_key(config: &EmbeddingConfig, api_key: String) -> Result<Self> {
        let client = ApiClient::new(
            &config.base_url,
            api_key,
            config.timeout_secs,
            config.max_retries,
        )?;
        Ok(Self {
            model: config.model.clone(),
            dims: config.dims,
            client,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAIProvider {
    fn model_name(&self) -> &str {
        &self.model
    }
    fn dims(&self) -> usize {
        self.dims
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
        });

        let response: EmbeddingResponse = self.client.post_json("/embeddings", &body).await?;
        let vectors = into_ordered_vectors(response, texts.len(), self.dims)?;

        tracing::debug!(count = vectors.len(), model = %self.model, "embedded batch");
        Ok(vectors)
    }
}

/// Sort by `index`, then check count and width against what was asked for.
fn into_ordered_vectors(
    mut response: EmbeddingResponse,
    expected_count: usize,
    dims: usize,
) -> Result<Vec<Vec<f32>>> {
    if response.data.len() != expected_count {
        bail!(
            "Invalid embedding response: expected {} vectors, got {}",
            expected_count,
            response.data.len()
        );
    }

    response.data.sort_by_key(|d| d.index);

    response
        .data
        .into_iter()
        .map(|d| {
            if d.embedding.len() != dims {
                bail!(
                    "Embedding has {} dimensions, expected {} (check embedding.dims)",
                    d.embedding.len(),
                    dims
                );
            }
            Ok(d.embedding)
        })
        .collect()
}

/// Create the appropriate [`EmbeddingProvider`] based on configuration.
///
/// | Config Value | Provider |
/// |-------------|----------|
/// | `"disabled"` | [`DisabledProvider`] |
/// | `"openai"` | [`OpenAIProvider`] |
pub fn create_provider(config: &EmbeddingConfig) -> Result<Box<dyn EmbeddingProvider>> {
    match config.provider.as_str() {
        "disabled" => Ok(Box::new(DisabledProvider)),
        "openai" => Ok(Box::new(OpenAIProvider::new(config)?)),
        other => bail!("Unknown embedding provider: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(base_url: String, dims: usize) -> EmbeddingConfig {
        EmbeddingConfig {
            base_url,
            dims,
            max_retries: 0,
            ..EmbeddingConfig::default()
        }
    }

    #[tokio::test]
    async fn openai_embeds_in_input_order() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/embeddings")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "model": "text-embedding-ada-002",
                "input": ["first", "second"],
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"data": [
                    {"index": 1, "embedding": [0.0, 1.0, 0.0]},
                    {"index": 0, "embedding": [1.0, 0.0, 0.0]}
                ]}"#,
            )
            .create_async()
            .await;

        let provider =
            OpenAIProvider::with_api_key(&test_config(server.url(), 3), "sk-test".to_string())
                .unwrap();
        let vectors = provider
            .embed(&["first".to_string(), "second".to_string()])
            .await
            .unwrap();

        assert_eq!(vectors, vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn wrong_width_is_rejected() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/embeddings")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"data": [{"index": 0, "embedding": [1.0, 2.0]}]}"#)
            .create_async()
            .await;

        let provider =
            OpenAIProvider::with_api_key(&test_config(server.url(), 3), "sk-test".to_string())
                .unwrap();
        let err = embed_query(&provider, "hello").await.unwrap_err();
        assert!(err.to_string().contains("expected 3"));
    }

    #[tokio::test]
    async fn empty_batch_makes_no_request() {
        let provider = OpenAIProvider::with_api_key(
            &test_config("http://127.0.0.1:9".to_string(), 3),
            "sk-test".to_string(),
        )
        .unwrap();
        assert!(provider.embed(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn disabled_provider_errors() {
        let err = embed_query(&DisabledProvider, "anything").await.unwrap_err();
        assert!(err.to_string().contains("disabled"));
    }

    #[test]
    fn count_mismatch_is_rejected() {
        let response = EmbeddingResponse {
            data: vec![EmbeddingData {
                index: 0,
                embedding: vec![1.0],
            }],
        };
        assert!(into_ordered_vectors(response, 2, 1).is_err());
    }

    #[test]
    fn create_disabled_provider() {
        let config = EmbeddingConfig {
            provider: "disabled".to_string(),
            ..EmbeddingConfig::default()
        };
        let provider = create_provider(&config).unwrap();
        assert_eq!(provider.model_name(), "disabled");
        assert_eq!(provider.dims(), 0);
    }
}
