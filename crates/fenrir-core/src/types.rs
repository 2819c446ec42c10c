use crate::error::{FenrirError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Problem statement and student solution for a single analysis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub problem: String,
    pub solution: String,
}

impl AnalysisRequest {
    /// Build a request, rejecting blank input on either side.
    pub fn new(problem: impl Into<String>, solution: impl Into<String>) -> Result<Self> {
        let request = Self {
            problem: problem.into(),
            solution: solution.into(),
        };
        request.validate()?;
        Ok(request)
    }

    pub fn validate(&self) -> Result<()> {
        if self.problem.trim().is_empty() || self.solution.trim().is_empty() {
            return Err(FenrirError::InvalidRequest(
                "both the problem and the student's solution are required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Feedback text returned by the synthesis stage, kept verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub id: Uuid,
    pub text: String,
    pub keywords: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl AnalysisResult {
    pub fn new(text: String, keywords: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text,
            keywords,
            created_at: Utc::now(),
        }
    }
}

/// Lifecycle of one analysis request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStage {
    Idle,
    Stage1Running,
    KeywordsExtracted,
    KeywordsEmpty,
    Stage2Running,
    ResultReady,
    Stage2Failed,
}

impl AnalysisStage {
    pub fn is_terminal(self) -> bool {
        matches!(self, AnalysisStage::ResultReady | AnalysisStage::Stage2Failed)
    }

    /// Whether `next` is a legal successor of `self`.
    pub fn can_advance_to(self, next: AnalysisStage) -> bool {
        use AnalysisStage::*;
        matches!(
            (self, next),
            (Idle, Stage1Running)
                | (Stage1Running, KeywordsExtracted)
                | (Stage1Running, KeywordsEmpty)
                | (KeywordsExtracted, Stage2Running)
                | (KeywordsEmpty, Stage2Running)
                | (Stage2Running, ResultReady)
                | (Stage2Running, Stage2Failed)
        )
    }
}

impl fmt::Display for AnalysisStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AnalysisStage::Idle => "idle",
            AnalysisStage::Stage1Running => "extracting concepts (1/2)",
            AnalysisStage::KeywordsExtracted => "concepts extracted",
            AnalysisStage::KeywordsEmpty => "no concepts extracted",
            AnalysisStage::Stage2Running => "generating feedback (2/2)",
            AnalysisStage::ResultReady => "result ready",
            AnalysisStage::Stage2Failed => "feedback generation failed",
        };
        f.write_str(label)
    }
}
