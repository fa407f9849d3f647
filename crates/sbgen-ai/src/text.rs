//! Chat-completion text provider.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::TextProviderConfig;
use crate::error::{AiError, AiResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// A provider that turns a conversation into a single completion.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Run one completion over `messages`.
    async fn complete(&self, messages: &[ChatMessage]) -> AiResult<String>;

    /// Complete a single prompt with an optional system prompt.
    ///
    /// Blank completions are reported as [`AiError::UpstreamEmptyResponse`].
    async fn generate(&self, prompt: &str, system_prompt: Option<&str>) -> AiResult<String> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system_prompt {
            messages.push(ChatMessage::system(system));
        }
        messages.push(ChatMessage::user(prompt));

        let text = self.complete(&messages).await?;
        if text.trim().is_empty() {
            return Err(AiError::empty_response("completion was blank"));
        }
        Ok(text)
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Client for OpenAI-compatible `/chat/completions` endpoints.
pub struct ChatCompletionClient {
    http: Client,
    config: TextProviderConfig,
}

impl ChatCompletionClient {
    pub fn new(config: TextProviderConfig) -> AiResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AiError::NotConfigured(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> AiResult<Self> {
        Self::new(TextProviderConfig::from_env())
    }

    pub fn config(&self) -> &TextProviderConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl TextGenerator for ChatCompletionClient {
    async fn complete(&self, messages: &[ChatMessage]) -> AiResult<String> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| AiError::NotConfigured("TEXT_API_KEY is not set".to_string()))?;

        let request = ChatCompletionRequest {
            model: &self.config.model,
            messages,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            stream: false,
        };

        let url = self.endpoint();
        debug!(model = %self.config.model, "Sending chat completion request to {}", url);

        let response = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AiError::unavailable(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("Text provider returned {}: {}", status, body);
            return Err(AiError::unavailable(format!(
                "text provider returned {}: {}",
                status, body
            )));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| AiError::empty_response(format!("unreadable response body: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| AiError::empty_response("no completion content in response"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> TextProviderConfig {
        TextProviderConfig {
            base_url: format!("{}/v1", server.uri()),
            api_key: Some("test-key".to_string()),
            model: "test-model".to_string(),
            temperature: 0.5,
            max_tokens: 256,
            timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn test_generate_returns_first_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(serde_json::json!({
                "model": "test-model",
                "messages": [
                    {"role": "system", "content": "be brief"},
                    {"role": "user", "content": "hello"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "hi there"}}]
            })))
            .mount(&server)
            .await;

        let client = ChatCompletionClient::new(config_for(&server)).unwrap();
        let text = client.generate("hello", Some("be brief")).await.unwrap();
        assert_eq!(text, "hi there");
    }

    #[tokio::test]
    async fn test_error_status_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let client = ChatCompletionClient::new(config_for(&server)).unwrap();
        let err = client.generate("hello", None).await.unwrap_err();
        assert!(matches!(err, AiError::UpstreamUnavailable(_)));
    }

    #[tokio::test]
    async fn test_empty_choices_is_empty_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "choices": [] })),
            )
            .mount(&server)
            .await;

        let client = ChatCompletionClient::new(config_for(&server)).unwrap();
        let err = client.generate("hello", None).await.unwrap_err();
        assert!(matches!(err, AiError::UpstreamEmptyResponse(_)));
    }

    #[tokio::test]
    async fn test_missing_key_is_not_configured() {
        let client = ChatCompletionClient::new(TextProviderConfig::default()).unwrap();
        let err = tokio_test::assert_err!(client.generate("hello", None).await);
        assert!(matches!(err, AiError::NotConfigured(_)));
    }
}
