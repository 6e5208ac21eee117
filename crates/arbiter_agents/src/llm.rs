//! LLM client consumed by agents' `chat` and `analyze` implementations.
//!
//! The orchestrator never talks to the LLM directly. Agents hold an optional
//! `Arc<dyn LlmClient>` and fall back to canned responses without one.
//!
//! [`HttpLlmClient`] speaks the OpenAI-compatible chat completions API and is
//! configured from the environment:
//! - `ARBITER_LLM_API_KEY` (or `OPENAI_API_KEY`)
//! - `ARBITER_LLM_MODEL`
//! - `ARBITER_LLM_BASE_URL`

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{AgentError, AgentResult};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const MAX_RETRIES: u32 = 3;

/// Role of a message in a conversation history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One message of a conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
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

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Response of a generation request. Failures are data, not errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmResponse {
    pub success: bool,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LlmResponse {
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            success: true,
            text: text.into(),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            text: String::new(),
            error: Some(error.into()),
        }
    }

    /// Text of a successful response, or `None`.
    pub fn into_text(self) -> Option<String> {
        if self.success && !self.text.trim().is_empty() {
            Some(self.text)
        } else {
            None
        }
    }
}

/// Opaque text generation service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn generate(&self, prompt: &str, history: &[ChatMessage]) -> LlmResponse;
}

/// Settings for [`HttpLlmClient`].
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
    pub max_tokens: u32,
}

impl LlmConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(60),
            max_tokens: 2048,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Read settings from the environment.
    pub fn from_env() -> AgentResult<Self> {
        let api_key = ["ARBITER_LLM_API_KEY", "OPENAI_API_KEY"]
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find(|key| !key.is_empty())
            .ok_or_else(|| {
                AgentError::Llm(
                    "LLM not configured. Set ARBITER_LLM_API_KEY or OPENAI_API_KEY".to_string(),
                )
            })?;

        let mut config = Self::new(api_key);
        if let Ok(model) = std::env::var("ARBITER_LLM_MODEL") {
            if !model.is_empty() {
                config = config.with_model(model);
            }
        }
        if let Ok(url) = std::env::var("ARBITER_LLM_BASE_URL") {
            if !url.is_empty() {
                config = config.with_base_url(url);
            }
        }
        Ok(config)
    }
}

/// OpenAI-compatible chat completions client.
pub struct HttpLlmClient {
    config: LlmConfig,
    client: reqwest::Client,
}

impl HttpLlmClient {
    pub fn new(config: LlmConfig) -> AgentResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AgentError::Llm(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { config, client })
    }

    pub fn from_env() -> AgentResult<Self> {
        Self::new(LlmConfig::from_env()?)
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn build_request(&self, prompt: &str, history: &[ChatMessage]) -> CompletionRequest {
        let mut messages: Vec<ChatMessage> = history.to_vec();
        messages.push(ChatMessage::user(prompt));
        CompletionRequest {
            model: self.config.model.clone(),
            messages,
            max_tokens: Some(self.config.max_tokens),
        }
    }

    async fn send(&self, request: &CompletionRequest) -> Result<String, String> {
        let url = format!("{}/chat/completions", self.config.base_url);
        let mut last_error = String::from("Max retries exceeded");

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // 1s, 2s
                tokio::time::sleep(Duration::from_secs(1 << (attempt - 1))).await;
            }

            let response = match self
                .client
                .post(&url)
                .bearer_auth(&self.config.api_key)
                .json(request)
                .send()
                .await
            {
                Ok(resp) => resp,
                Err(e) => {
                    last_error = format!("Network error: {}", e);
                    continue;
                }
            };

            let status = response.status();
            if status.is_server_error() || status.as_u16() == 429 {
                let body = response.text().await.unwrap_or_default();
                last_error = format!(
                    "LLM API error {} (attempt {}/{}): {}",
                    status,
                    attempt + 1,
                    MAX_RETRIES,
                    body
                );
                continue;
            }
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(format!("LLM API error {}: {}", status, body));
            }

            let parsed: CompletionResponse = response
                .json()
                .await
                .map_err(|e| format!("Failed to parse response: {}", e))?;

            return parsed
                .choices
                .into_iter()
                .next()
                .map(|c| c.message.content)
                .ok_or_else(|| "No choices in LLM response".to_string());
        }

        Err(last_error)
    }
}

#[async_trait]
impl LlmClient for HttpLlmClient {
    async fn generate(&self, prompt: &str, history: &[ChatMessage]) -> LlmResponse {
        let request = self.build_request(prompt, history);
        debug!(
            "Sending {} messages to {}",
            request.messages.len(),
            self.config.model
        );
        match self.send(&request).await {
            Ok(text) => LlmResponse::ok(text),
            Err(error) => {
                warn!("LLM generation failed: {}", error);
                LlmResponse::failed(error)
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = LlmConfig::new("key").with_base_url("http://localhost:8080/v1/");
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.base_url, "http://localhost:8080/v1");
    }

    #[test]
    fn test_request_appends_prompt_to_history() {
        let client = HttpLlmClient::new(LlmConfig::new("key").with_model("local-model")).unwrap();
        let history = vec![ChatMessage::system("You review React code.")];
        let request = client.build_request("Is this hook correct?", &history);

        assert_eq!(request.model, "local-model");
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[1], ChatMessage::user("Is this hook correct?"));

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["messages"][0]["role"], "system");
    }

    #[test]
    fn test_response_text() {
        assert_eq!(LlmResponse::ok("hi").into_text(), Some("hi".to_string()));
        assert_eq!(LlmResponse::ok("  ").into_text(), None);
        assert_eq!(LlmResponse::failed("down").into_text(), None);
    }
}
