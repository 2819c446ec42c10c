use crate::llm_provider::{GenerationConfig, LLMProvider};
use crate::prompts;
use fenrir_core::{AnalysisRequest, ConceptStore};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument, warn};

/// A fence marker plus any language tag, in any case
static CODE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)```[a-z0-9_+-]*").expect("code fence pattern is valid"));

/// Why stage 1 produced no keywords
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeywordParseError {
    #[error("model call failed: {0}")]
    Model(String),

    #[error("response is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("response is JSON but not a list (found {0})")]
    NotAList(&'static str),
}

/// Outcome of the keyword extraction stage.
///
/// Extraction never aborts a request; a failed parse degrades to an empty
/// keyword set while keeping the reason for reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeywordExtraction {
    Extracted(Vec<String>),
    Fallback { reason: KeywordParseError },
}

impl KeywordExtraction {
    pub fn keywords(&self) -> &[String] {
        match self {
            KeywordExtraction::Extracted(keywords) => keywords,
            KeywordExtraction::Fallback { .. } => &[],
        }
    }

    pub fn diagnostic(&self) -> Option<&KeywordParseError> {
        match self {
            KeywordExtraction::Extracted(_) => None,
            KeywordExtraction::Fallback { reason } => Some(reason),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.keywords().is_empty()
    }
}

/// Remove markdown code fences wrapped around a model answer.
pub fn strip_code_fences(raw: &str) -> String {
    CODE_FENCE.replace_all(raw.trim(), "").trim().to_string()
}

/// Parse a stage 1 answer into keywords, dropping non-string list items.
pub fn parse_keyword_response(raw: &str) -> Result<Vec<String>, KeywordParseError> {
    let cleaned = strip_code_fences(raw);
    let value: Value = serde_json::from_str(&cleaned)
        .map_err(|e| KeywordParseError::InvalidJson(e.to_string()))?;

    match value {
        Value::Array(items) => Ok(items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(keyword) => Some(keyword),
                other => {
                    debug!("Ignoring non-string keyword item: {}", other);
                    None
                }
            })
            .collect()),
        Value::Object(_) => Err(KeywordParseError::NotAList("an object")),
        Value::String(_) => Err(KeywordParseError::NotAList("a string")),
        Value::Number(_) => Err(KeywordParseError::NotAList("a number")),
        Value::Bool(_) => Err(KeywordParseError::NotAList("a boolean")),
        Value::Null => Err(KeywordParseError::NotAList("null")),
    }
}

/// Stage 1: ask the model which glossary concepts the problem involves.
#[instrument(skip_all, fields(vocabulary = store.len()))]
pub async fn extract_keywords(
    provider: &dyn LLMProvider,
    request: &AnalysisRequest,
    store: &ConceptStore,
    generation: &GenerationConfig,
) -> KeywordExtraction {
    let instruction = prompts::keyword_instruction(store.keywords());
    let payload = prompts::build_prompt_payload(&instruction, &prompts::keyword_input(request));

    let raw = match provider.generate_with_config(&payload, generation).await {
        Ok(response) => response.content,
        Err(e) => {
            let reason = KeywordParseError::Model(format!("{:#}", e));
            warn!("Keyword extraction failed, continuing without concepts: {}", reason);
            return KeywordExtraction::Fallback { reason };
        }
    };

    match parse_keyword_response(&raw) {
        Ok(keywords) => {
            debug!("Extracted keywords: {:?}", keywords);
            KeywordExtraction::Extracted(keywords)
        }
        Err(reason) => {
            warn!("Keyword extraction failed, continuing without concepts: {}", reason);
            KeywordExtraction::Fallback { reason }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_json_fences() {
        assert_eq!(
            strip_code_fences("```json\n[\"limits\"]\n```"),
            "[\"limits\"]"
        );
        assert_eq!(strip_code_fences("  ```\n[]\n```  "), "[]");
        assert_eq!(strip_code_fences("[\"a\"]"), "[\"a\"]");
    }

    #[test]
    fn strips_fences_with_any_language_tag() {
        assert_eq!(strip_code_fences("```JSON\n[\"limits\"]\n```"), "[\"limits\"]");
        assert_eq!(
            strip_code_fences("```javascript\n[\"limits\"]\n```"),
            "[\"limits\"]"
        );
        assert_eq!(
            parse_keyword_response("```Json\n[\"limits\", \"series\"]\n```").expect("list"),
            vec!["limits", "series"]
        );
        assert_eq!(
            parse_keyword_response("```javascript\n[\"limits\"]\n```").expect("list"),
            vec!["limits"]
        );
    }

    #[test]
    fn parses_fenced_list() {
        let keywords =
            parse_keyword_response("```json\n[\"quadratic_equations\", \"factoring\"]\n```")
                .expect("list");
        assert_eq!(keywords, vec!["quadratic_equations", "factoring"]);
    }

    #[test]
    fn non_json_is_invalid() {
        assert!(matches!(
            parse_keyword_response("not json"),
            Err(KeywordParseError::InvalidJson(_))
        ));
    }

    #[test]
    fn object_is_not_a_list() {
        assert_eq!(
            parse_keyword_response(r#"{"keywords": ["limits"]}"#),
            Err(KeywordParseError::NotAList("an object"))
        );
    }

    #[test]
    fn non_string_items_are_dropped() {
        let keywords = parse_keyword_response(r#"["limits", 3, {"x": 1}, "sequences"]"#)
            .expect("list");
        assert_eq!(keywords, vec!["limits", "sequences"]);
    }

    #[test]
    fn fallback_has_no_keywords() {
        let extraction = KeywordExtraction::Fallback {
            reason: KeywordParseError::InvalidJson("eof".into()),
        };
        assert!(extraction.is_empty());
        assert!(extraction.diagnostic().is_some());

        let extracted = KeywordExtraction::Extracted(vec!["limits".into()]);
        assert_eq!(extracted.keywords(), ["limits".to_string()]);
        assert!(extracted.diagnostic().is_none());
    }
}
