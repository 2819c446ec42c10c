//! Deterministic provider replaying canned answers, for tests.

use crate::llm_provider::*;
use anyhow::anyhow;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub enum ScriptedReply {
    Text(String),
    Failure(String),
}

/// Replays replies in order and records every prompt it receives
#[derive(Debug, Default)]
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<ScriptedReply>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn new(replies: impl IntoIterator<Item = ScriptedReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn push_text(&self, text: impl Into<String>) {
        self.replies.lock().push_back(ScriptedReply::Text(text.into()));
    }

    pub fn push_failure(&self, message: impl Into<String>) {
        self.replies
            .lock()
            .push_back(ScriptedReply::Failure(message.into()));
    }

    /// Prompts received so far, oldest first
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl LLMProvider for ScriptedProvider {
    async fn generate_chat(
        &self,
        messages: &[Message],
        _config: &GenerationConfig,
    ) -> LLMResult<LLMResponse> {
        let prompt = messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        self.prompts.lock().push(prompt);

        match self.replies.lock().pop_front() {
            Some(ScriptedReply::Text(content)) => Ok(LLMResponse {
                content,
                total_tokens: None,
                prompt_tokens: None,
                completion_tokens: None,
                finish_reason: Some("stop".to_string()),
                model: "scripted".to_string(),
            }),
            Some(ScriptedReply::Failure(message)) => Err(anyhow!(message)),
            None => Err(anyhow!("scripted provider has no reply left")),
        }
    }

    async fn is_available(&self) -> bool {
        true
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}
