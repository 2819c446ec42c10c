use crate::sessions::SessionStore;
use fenrir_ai::{GenerationConfig, LLMProvider, LLMProviderFactory, TutorPipeline};
use fenrir_core::{ConceptStore, FenrirConfig, Result};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: TutorPipeline,
    pub config: Arc<FenrirConfig>,
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    pub fn new(
        config: FenrirConfig,
        store: Arc<ConceptStore>,
        provider: Arc<dyn LLMProvider>,
    ) -> Self {
        let pipeline = TutorPipeline::new(provider, store)
            .with_generation_config(GenerationConfig::from_llm_config(&config.llm));

        Self {
            pipeline,
            config: Arc::new(config),
            sessions: Arc::new(SessionStore::new()),
        }
    }

    /// Load the concept store and build the model provider.
    ///
    /// Both are startup resources: an error here means the tutor cannot serve
    /// analyses at all.
    pub fn from_config(config: FenrirConfig) -> Result<Self> {
        let store = ConceptStore::load(&config.concepts.primary, &config.concepts.secondary)?;
        info!("Loaded {} concepts", store.len());

        let provider = LLMProviderFactory::create_from_config(&config.llm)?;
        Ok(Self::new(config, Arc::new(store), provider))
    }
}
