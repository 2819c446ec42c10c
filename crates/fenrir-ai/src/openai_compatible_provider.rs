use crate::llm_provider::*;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for a hosted endpoint speaking the OpenAI Chat Completions API
#[derive(Debug, Clone)]
pub struct OpenAICompatibleConfig {
    /// Base URL for the API (e.g., "https://gateway.example.com/v1")
    pub base_url: String,
    /// Model to use
    pub model: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Optional API key (some providers require it, some don't)
    pub api_key: Option<SecretString>,
    /// Provider name for display purposes
    pub provider_name: String,
}

impl OpenAICompatibleConfig {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
            timeout_secs: 120,
            api_key: None,
            provider_name: "openai-compatible".to_string(),
        }
    }
}

/// OpenAI-compatible LLM provider speaking the Chat Completions API
pub struct OpenAICompatibleProvider {
    config: OpenAICompatibleConfig,
    client: Client,
}

impl OpenAICompatibleProvider {
    pub fn new(config: OpenAICompatibleConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { config, client })
    }

    fn build_request(&self, messages: &[Message], config: &GenerationConfig) -> ChatCompletionsRequest {
        ChatCompletionsRequest {
            model: self.config.model.clone(),
            messages: messages
                .iter()
                .map(|m| ChatMessage {
                    role: m.role.to_string(),
                    content: m.content.clone(),
                })
                .collect(),
            temperature: Some(config.temperature),
            max_tokens: config.max_tokens,
            top_p: config.top_p,
            stop: config.stop.clone(),
        }
    }

    /// Single request; there is no retry.
    async fn send_request(
        &self,
        messages: &[Message],
        config: &GenerationConfig,
    ) -> Result<ChatCompletionsResponse> {
        let request = self.build_request(messages, config);

        let mut request_builder = self
            .client
            .post(format!(
                "{}/chat/completions",
                self.config.base_url.trim_end_matches('/')
            ))
            .header("Content-Type", "application/json")
            .json(&request);

        if let Some(api_key) = &self.config.api_key {
            request_builder = request_builder
                .header("Authorization", format!("Bearer {}", api_key.expose_secret()));
        }

        let response = request_builder.send().await.context(format!(
            "Failed to send request to {} Chat Completions API at {}",
            self.config.provider_name, self.config.base_url
        ))?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            return Err(anyhow!(
                "{} API error ({}): {}",
                self.config.provider_name,
                status,
                error_text
            ));
        }

        response.json().await.context(format!(
            "Failed to parse {} Chat Completions API response",
            self.config.provider_name
        ))
    }
}

#[async_trait]
impl LLMProvider for OpenAICompatibleProvider {
    async fn generate_chat(
        &self,
        messages: &[Message],
        config: &GenerationConfig,
    ) -> LLMResult<LLMResponse> {
        let response = self.send_request(messages, config).await?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("No choices in response"))?;

        Ok(LLMResponse {
            content: choice.message.content,
            total_tokens: response.usage.as_ref().map(|u| u.total_tokens),
            prompt_tokens: response.usage.as_ref().map(|u| u.prompt_tokens),
            completion_tokens: response.usage.as_ref().map(|u| u.completion_tokens),
            finish_reason: choice.finish_reason,
            model: response.model.unwrap_or_else(|| self.config.model.clone()),
        })
    }

    async fn is_available(&self) -> bool {
        self.client
            .get(format!("{}/models", self.config.base_url.trim_end_matches('/')))
            .send()
            .await
            .is_ok()
    }

    fn provider_name(&self) -> &str {
        &self.config.provider_name
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionsRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionsResponse {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: usize,
    completion_tokens: usize,
    total_tokens: usize,
}
