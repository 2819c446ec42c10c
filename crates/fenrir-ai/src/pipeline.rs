use crate::context_assembly::assemble_context;
use crate::feedback_synthesis::synthesize_feedback;
use crate::keyword_extraction::{extract_keywords, KeywordExtraction};
use crate::llm_provider::{GenerationConfig, LLMProvider};
use fenrir_core::{AnalysisRequest, AnalysisResult, AnalysisStage, ConceptStore, Result};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument};

/// Everything produced by one successful analysis
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub result: AnalysisResult,
    pub extraction: KeywordExtraction,
    pub context: String,
}

impl AnalysisOutcome {
    /// User-facing warnings for recoverable problems
    pub fn warnings(&self) -> Vec<String> {
        self.extraction
            .diagnostic()
            .map(|reason| {
                vec![format!(
                    "Concept keyword extraction failed ({}); feedback was generated without reference concepts",
                    reason
                )]
            })
            .unwrap_or_default()
    }
}

/// Concept-grounded two-stage feedback pipeline.
///
/// Holds explicit handles to the model provider and the concept store; both
/// are built once at startup and shared across requests.
#[derive(Clone)]
pub struct TutorPipeline {
    provider: Arc<dyn LLMProvider>,
    store: Arc<ConceptStore>,
    generation: GenerationConfig,
}

impl TutorPipeline {
    pub fn new(provider: Arc<dyn LLMProvider>, store: Arc<ConceptStore>) -> Self {
        Self {
            provider,
            store,
            generation: GenerationConfig::default(),
        }
    }

    pub fn with_generation_config(mut self, generation: GenerationConfig) -> Self {
        self.generation = generation;
        self
    }

    pub fn store(&self) -> &ConceptStore {
        &self.store
    }

    pub fn provider(&self) -> &Arc<dyn LLMProvider> {
        &self.provider
    }

    pub async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisOutcome> {
        self.analyze_with_observer(request, |_| {}).await
    }

    /// Run both stages, reporting every state transition to `observe`.
    #[instrument(skip_all, fields(provider = self.provider.provider_name()))]
    pub async fn analyze_with_observer<F>(
        &self,
        request: &AnalysisRequest,
        mut observe: F,
    ) -> Result<AnalysisOutcome>
    where
        F: FnMut(AnalysisStage) + Send,
    {
        request.validate()?;
        let started = Instant::now();

        observe(AnalysisStage::Stage1Running);
        let extraction =
            extract_keywords(self.provider.as_ref(), request, &self.store, &self.generation).await;
        observe(if extraction.is_empty() {
            AnalysisStage::KeywordsEmpty
        } else {
            AnalysisStage::KeywordsExtracted
        });

        let context = assemble_context(extraction.keywords(), &self.store);

        observe(AnalysisStage::Stage2Running);
        let text = match synthesize_feedback(
            self.provider.as_ref(),
            &context,
            request,
            &self.generation,
        )
        .await
        {
            Ok(text) => text,
            Err(e) => {
                observe(AnalysisStage::Stage2Failed);
                return Err(e);
            }
        };
        observe(AnalysisStage::ResultReady);

        info!(
            "Analysis finished in {} ms ({} keywords)",
            started.elapsed().as_millis(),
            extraction.keywords().len()
        );

        Ok(AnalysisOutcome {
            result: AnalysisResult::new(text, extraction.keywords().to_vec()),
            extraction,
            context,
        })
    }
}
