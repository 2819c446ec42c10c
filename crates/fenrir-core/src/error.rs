use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FenrirError {
    #[error("Failed to load concept source {path}: {reason}")]
    ConceptLoad { path: PathBuf, reason: String },

    #[error("Model initialization failed: {0}")]
    ModelInit(String),

    #[error("Feedback synthesis failed: {0}")]
    Synthesis(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl FenrirError {
    /// Startup failures disable the analysis feature for the whole process.
    pub fn is_fatal_startup(&self) -> bool {
        matches!(
            self,
            FenrirError::ConceptLoad { .. } | FenrirError::ModelInit(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, FenrirError>;
