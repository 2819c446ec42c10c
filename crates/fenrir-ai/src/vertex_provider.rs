use crate::llm_provider::*;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for a model deployed behind a Vertex AI endpoint
#[derive(Debug, Clone)]
pub struct VertexConfig {
    pub project_id: String,
    pub location: String,
    pub endpoint_id: String,
    /// OAuth bearer token (e.g. from `gcloud auth print-access-token`)
    pub access_token: SecretString,
    /// Override for the regional API host, mainly for tests and private endpoints
    pub api_base: Option<String>,
    pub timeout_secs: u64,
}

impl VertexConfig {
    /// Fully qualified endpoint resource name
    pub fn endpoint_resource(&self) -> String {
        format!(
            "projects/{}/locations/{}/endpoints/{}",
            self.project_id, self.location, self.endpoint_id
        )
    }

    fn api_base(&self) -> String {
        self.api_base
            .clone()
            .unwrap_or_else(|| format!("https://{}-aiplatform.googleapis.com/v1", self.location))
    }

    pub fn generate_url(&self) -> String {
        format!(
            "{}/{}:generateContent",
            self.api_base().trim_end_matches('/'),
            self.endpoint_resource()
        )
    }
}

/// Vertex AI `generateContent` provider
pub struct VertexProvider {
    config: VertexConfig,
    client: Client,
}

impl VertexProvider {
    pub fn new(config: VertexConfig) -> Result<Self> {
        if config.access_token.expose_secret().is_empty() {
            return Err(anyhow!(
                "Vertex AI access token is required. Set GOOGLE_ACCESS_TOKEN or llm.access_token."
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { config, client })
    }

    fn build_request(messages: &[Message], config: &GenerationConfig) -> GenerateContentRequest {
        let system_instruction = messages
            .iter()
            .find(|m| m.role == MessageRole::System)
            .map(|m| Content {
                role: None,
                parts: vec![Part {
                    text: m.content.clone(),
                }],
            });

        let contents = messages
            .iter()
            .filter(|m| m.role != MessageRole::System)
            .map(|m| Content {
                role: Some(
                    match m.role {
                        MessageRole::Assistant => "model",
                        _ => "user",
                    }
                    .to_string(),
                ),
                parts: vec![Part {
                    text: m.content.clone(),
                }],
            })
            .collect();

        GenerateContentRequest {
            contents,
            system_instruction,
            generation_config: VertexGenerationConfig {
                temperature: Some(config.temperature),
                max_output_tokens: config.max_tokens,
                top_p: config.top_p,
                stop_sequences: config.stop.clone(),
            },
        }
    }

    async fn send_request(
        &self,
        messages: &[Message],
        config: &GenerationConfig,
    ) -> Result<GenerateContentResponse> {
        let request = Self::build_request(messages, config);

        let response = self
            .client
            .post(self.config.generate_url())
            .bearer_auth(self.config.access_token.expose_secret())
            .json(&request)
            .send()
            .await
            .context(format!(
                "Failed to send request to Vertex AI endpoint {}",
                self.config.endpoint_resource()
            ))?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            return Err(anyhow!("Vertex AI API error ({}): {}", status, error_text));
        }

        response
            .json::<GenerateContentResponse>()
            .await
            .context("Failed to parse Vertex AI generateContent response")
    }
}

/// Concatenated text of the first candidate, or an error when there is none.
fn first_candidate_text(response: &GenerateContentResponse) -> Result<(String, Option<String>)> {
    let candidate = response
        .candidates
        .first()
        .ok_or_else(|| anyhow!("Vertex AI returned no candidates"))?;

    let text = candidate
        .content
        .as_ref()
        .map(|c| {
            c.parts
                .iter()
                .map(|p| p.text.as_str())
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(anyhow!(
            "Vertex AI returned an empty candidate (finish reason: {})",
            candidate.finish_reason.as_deref().unwrap_or("unknown")
        ));
    }

    Ok((text, candidate.finish_reason.clone()))
}

#[async_trait]
impl LLMProvider for VertexProvider {
    async fn generate_chat(
        &self,
        messages: &[Message],
        config: &GenerationConfig,
    ) -> LLMResult<LLMResponse> {
        let response = self.send_request(messages, config).await?;
        let (content, finish_reason) = first_candidate_text(&response)?;
        let usage = response.usage_metadata.as_ref();

        Ok(LLMResponse {
            content,
            total_tokens: usage.and_then(|u| u.total_token_count),
            prompt_tokens: usage.and_then(|u| u.prompt_token_count),
            completion_tokens: usage.and_then(|u| u.candidates_token_count),
            finish_reason,
            model: response
                .model_version
                .clone()
                .unwrap_or_else(|| self.config.endpoint_resource()),
        })
    }

    async fn is_available(&self) -> bool {
        let url = format!(
            "{}/{}",
            self.config.api_base().trim_end_matches('/'),
            self.config.endpoint_resource()
        );
        match self
            .client
            .get(url)
            .bearer_auth(self.config.access_token.expose_secret())
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    fn provider_name(&self) -> &str {
        "vertex"
    }

    fn model_name(&self) -> &str {
        &self.config.endpoint_id
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    generation_config: VertexGenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VertexGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop_sequences: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
    #[serde(default)]
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: Option<usize>,
    #[serde(default)]
    candidates_token_count: Option<usize>,
    #[serde(default)]
    total_token_count: Option<usize>,
}
