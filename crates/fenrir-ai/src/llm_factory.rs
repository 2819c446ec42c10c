use crate::llm_provider::*;
use crate::openai_compatible_provider::{OpenAICompatibleConfig, OpenAICompatibleProvider};
use crate::vertex_provider::{VertexConfig, VertexProvider};
use anyhow::{anyhow, Result};
use fenrir_core::{FenrirError, LLMConfig};
use std::sync::Arc;
use tracing::info;

/// Factory for creating LLM providers based on configuration
pub struct LLMProviderFactory;

impl LLMProviderFactory {
    /// Create an LLM provider from configuration.
    ///
    /// Any failure here is a startup error: the analysis feature cannot run
    /// without a model endpoint.
    pub fn create_from_config(config: &LLMConfig) -> fenrir_core::Result<Arc<dyn LLMProvider>> {
        let provider_name = config.provider.to_lowercase();

        let provider = match provider_name.as_str() {
            "vertex" => Self::create_vertex_provider(config),
            "openai-compatible" => Self::create_openai_compatible_provider(config),
            _ => Err(anyhow!(
                "Unsupported LLM provider: {}. Available providers: {}",
                provider_name,
                Self::supported_providers().join(", ")
            )),
        }
        .map_err(|e| FenrirError::ModelInit(format!("{:#}", e)))?;

        info!(
            "Initialized {} provider (model: {})",
            provider.provider_name(),
            provider.model_name()
        );
        Ok(provider)
    }

    fn create_vertex_provider(config: &LLMConfig) -> Result<Arc<dyn LLMProvider>> {
        let project_id = config
            .project_id
            .clone()
            .ok_or_else(|| anyhow!("Vertex AI project id not found. Set GCP_PROJECT_ID"))?;
        let endpoint_id = config
            .endpoint_id
            .clone()
            .ok_or_else(|| anyhow!("Vertex AI endpoint id not found. Set GCP_ENDPOINT_ID"))?;
        let access_token = config.access_token.clone().ok_or_else(|| {
            anyhow!(
                "Vertex AI access token not found. Set 'access_token' in config \
                 or GOOGLE_ACCESS_TOKEN environment variable"
            )
        })?;

        let vertex_config = VertexConfig {
            project_id,
            location: config.location.clone(),
            endpoint_id,
            access_token,
            api_base: config.base_url.clone(),
            timeout_secs: config.timeout_secs,
        };

        Ok(Arc::new(VertexProvider::new(vertex_config)?))
    }

    fn create_openai_compatible_provider(config: &LLMConfig) -> Result<Arc<dyn LLMProvider>> {
        let base_url = config.base_url.clone().ok_or_else(|| {
            anyhow!("OpenAI-compatible base URL not found. Set 'base_url' in config or FENRIR_BASE_URL")
        })?;

        let model = config
            .model
            .clone()
            .ok_or_else(|| anyhow!("Model name is required for OpenAI-compatible provider"))?;

        let mut compat_config = OpenAICompatibleConfig::new(base_url, model);
        compat_config.timeout_secs = config.timeout_secs;
        compat_config.api_key = config.api_key.clone();

        Ok(Arc::new(OpenAICompatibleProvider::new(compat_config)?))
    }

    pub fn supported_providers() -> Vec<&'static str> {
        vec!["vertex", "openai-compatible"]
    }
}
