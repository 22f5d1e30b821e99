//! Chat-completion client used by `recall summarize`.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::ChatConfig;
use crate::openai::{self, ApiClient};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// A model that turns a conversation into a single reply.
#[async_trait]
pub trait ChatModel: Send + Sync {
    fn model_name(&self) -> &str;
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;
}

/// Chat model behind `POST {base_url}/chat/completions`.
pub struct OpenAIChat {
    model: String,
    temperature: Option<f32>,
    client: ApiClient,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAIChat {
    pub fn new(config: &ChatConfig) -> Result<Self> {
        Self::with_api_key(config, openai::api_key_from_env()?)
    }

    pub fn with_api_key(config: &ChatConfig, api_key: String) -> Result<Self> {
        let client = ApiClient::new(
            &config.base_url,
            api_key,
            config.timeout_secs,
            config.max_retries,
        )?;
        Ok(Self {
            model: config.model.clone(),
            temperature: config.temperature,
            client,
        })
    }
}

#[async_trait]
impl ChatModel for OpenAIChat {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let mut body = serde_json::json!({
            "model": self.model,
            "messages": messages,
        });
        if let Some(t) = self.temperature {
            body["temperature"] = serde_json::json!(t);
        }

        let response: CompletionResponse =
            self.client.post_json("/chat/completions", &body).await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| anyhow!("error getting chat completion: response had no content"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(base_url: String) -> ChatConfig {
        ChatConfig {
            base_url,
            max_retries: 0,
            ..ChatConfig::default()
        }
    }

    #[test]
    fn roles_serialize_lowercase() {
        let json = serde_json::to_value(ChatMessage::system("hi")).unwrap();
        assert_eq!(json, serde_json::json!({"role": "system", "content": "hi"}));
    }

    #[tokio::test]
    async fn returns_first_choice() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "model": "gpt-3.5-turbo",
                "messages": [{"role": "user", "content": "hello"}],
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"choices": [
                    {"message": {"role": "assistant", "content": "A quiet week."}, "finish_reason": "stop"}
                ]}"#,
            )
            .create_async()
            .await;

        let chat = OpenAIChat::with_api_key(&test_config(server.url()), "sk-test".to_string())
            .unwrap();
        let reply = chat.complete(&[ChatMessage::user("hello")]).await.unwrap();

        assert_eq!(reply, "A quiet week.");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn no_choices_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices": []}"#)
            .create_async()
            .await;

        let chat = OpenAIChat::with_api_key(&test_config(server.url()), "sk-test".to_string())
            .unwrap();
        let err = chat.complete(&[ChatMessage::user("hello")]).await.unwrap_err();
        assert!(err.to_string().contains("no content"));
    }
}
