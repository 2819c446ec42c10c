pub mod concept_store;
pub mod config_manager;
pub mod error;
pub mod types;

pub use concept_store::ConceptStore;
pub use config_manager::{
    ConceptsConfig, ConfigError, ConfigManager, FenrirConfig, LLMConfig, LoggingConfig,
    ServerConfig,
};
pub use error::{FenrirError, Result};
pub use types::{AnalysisRequest, AnalysisResult, AnalysisStage};
