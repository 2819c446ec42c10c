pub mod context_assembly;
pub mod feedback_synthesis;
pub mod keyword_extraction;
pub mod llm_factory;
pub mod llm_provider;
pub mod pipeline;
pub mod prompts;

// Model endpoints
pub mod openai_compatible_provider;
pub mod vertex_provider;

#[cfg(any(test, feature = "test-support"))]
pub mod scripted_provider;

pub use context_assembly::assemble_context;
pub use feedback_synthesis::synthesize_feedback;
pub use keyword_extraction::{extract_keywords, KeywordExtraction, KeywordParseError};
pub use llm_factory::LLMProviderFactory;
pub use llm_provider::*;
pub use pipeline::{AnalysisOutcome, TutorPipeline};
