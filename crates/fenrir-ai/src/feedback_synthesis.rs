use crate::llm_provider::{GenerationConfig, LLMProvider};
use crate::prompts;
use fenrir_core::{AnalysisRequest, FenrirError, Result};
use tracing::{error, info, instrument};

/// Stage 2: ask the model for the five-section critique.
///
/// The returned text is used verbatim. Any failure, including an empty
/// answer, aborts the request; no placeholder text is substituted.
#[instrument(skip_all, fields(context_chars = context.len()))]
pub async fn synthesize_feedback(
    provider: &dyn LLMProvider,
    context: &str,
    request: &AnalysisRequest,
    generation: &GenerationConfig,
) -> Result<String> {
    let payload = prompts::build_prompt_payload(
        &prompts::feedback_instruction(),
        &prompts::feedback_input(context, request),
    );

    let response = provider
        .generate_with_config(&payload, generation)
        .await
        .map_err(|e| {
            error!("Feedback synthesis failed: {:#}", e);
            FenrirError::Synthesis(format!("{:#}", e))
        })?;

    if response.content.trim().is_empty() {
        error!("Feedback synthesis returned an empty answer");
        return Err(FenrirError::Synthesis(
            "the model returned an empty answer".to_string(),
        ));
    }

    info!(
        "Feedback generated ({} chars, {} tokens)",
        response.content.len(),
        response
            .total_tokens
            .map(|t| t.to_string())
            .unwrap_or_else(|| "?".to_string())
    );
    Ok(response.content)
}
