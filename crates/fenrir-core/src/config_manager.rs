use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("Failed to read config: {0}")]
    ReadError(String),

    #[error("Failed to parse config: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Main configuration for the Fenrir tutor
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FenrirConfig {
    /// Model endpoint configuration
    #[serde(default)]
    pub llm: LLMConfig,

    /// Concept glossary sources
    #[serde(default)]
    pub concepts: ConceptsConfig,

    /// HTTP service settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Model endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMConfig {
    /// Provider: "vertex" or "openai-compatible"
    #[serde(default = "default_llm_provider")]
    pub provider: String,

    /// Model identifier (ignored by "vertex", which addresses an endpoint)
    #[serde(default)]
    pub model: Option<String>,

    /// GCP project hosting the Vertex AI endpoint
    #[serde(default)]
    pub project_id: Option<String>,

    /// GCP region of the Vertex AI endpoint
    #[serde(default = "default_location")]
    pub location: String,

    /// Vertex AI endpoint id
    #[serde(default)]
    pub endpoint_id: Option<String>,

    /// OAuth access token for Vertex AI (never serialized)
    #[serde(default, skip_serializing)]
    pub access_token: Option<SecretString>,

    /// Base URL for OpenAI-compatible endpoints
    #[serde(default)]
    pub base_url: Option<String>,

    /// API key for OpenAI-compatible endpoints (never serialized)
    #[serde(default, skip_serializing)]
    pub api_key: Option<SecretString>,

    /// Request timeout for a single model call
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Temperature for generation
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            model: None,
            project_id: None,
            location: default_location(),
            endpoint_id: None,
            access_token: None,
            base_url: None,
            api_key: None,
            timeout_secs: default_timeout_secs(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// Paths of the two concept documents, merged in order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConceptsConfig {
    #[serde(default = "default_primary_concepts")]
    pub primary: PathBuf,

    /// Entries here override `primary` on key collision
    #[serde(default = "default_secondary_concepts")]
    pub secondary: PathBuf,
}

impl Default for ConceptsConfig {
    fn default() -> Self {
        Self {
            primary: default_primary_concepts(),
            secondary: default_secondary_concepts(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: "pretty", "json", "compact"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_llm_provider() -> String {
    "vertex".to_string()
}
fn default_location() -> String {
    "us-central1".to_string()
}
fn default_timeout_secs() -> u64 {
    120
}
fn default_temperature() -> f32 {
    0.2
}
fn default_max_tokens() -> usize {
    8192
}
fn default_primary_concepts() -> PathBuf {
    PathBuf::from("concepts_su1.json")
}
fn default_secondary_concepts() -> PathBuf {
    PathBuf::from("concepts_su2.json")
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "pretty".to_string()
}

/// Configuration manager: defaults, then config file, then environment
pub struct ConfigManager {
    config: FenrirConfig,
    config_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Load configuration with the following precedence:
    /// 1. Environment variables (.env file)
    /// 2. Config file (.fenrir.toml)
    /// 3. Sensible defaults
    pub fn load() -> Result<Self, ConfigError> {
        info!("Loading Fenrir configuration...");
        Self::load_dotenv();
        let (config, config_path) = Self::load_config_file()?;
        Self::finish(config, config_path)
    }

    /// Load configuration from an explicit file instead of the search path
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        info!("Loading Fenrir configuration from {}", path.display());
        Self::load_dotenv();
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let config = Self::read_toml_file(path)?;
        Self::finish(config, Some(path.to_path_buf()))
    }

    /// Build a manager around an already assembled configuration
    pub fn from_config(config: FenrirConfig) -> Result<Self, ConfigError> {
        let config = Self::normalize(config);
        Self::validate_config(&config)?;
        Ok(Self {
            config,
            config_path: None,
        })
    }

    fn finish(config: FenrirConfig, config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let config = Self::apply_env_overrides(config);
        Self::validate_config(&config)?;

        info!("Configuration loaded successfully");
        match config_path {
            Some(ref path) => info!("   Config file: {}", path.display()),
            None => info!("   Config file: NONE (using defaults)"),
        }
        info!("   LLM provider: {}", config.llm.provider);
        info!(
            "   Concept sources: {} + {}",
            config.concepts.primary.display(),
            config.concepts.secondary.display()
        );

        Ok(Self {
            config,
            config_path,
        })
    }

    /// Load .env file if it exists
    fn load_dotenv() {
        if Path::new(".env").exists() {
            if let Err(e) = dotenv::from_filename(".env") {
                warn!("Failed to load .env file: {}", e);
            } else {
                info!("Loaded .env file from current directory");
            }
            return;
        }

        if let Some(home) = dirs::home_dir() {
            let home_env = home.join(".fenrir.env");
            if home_env.exists() {
                if let Err(e) = dotenv::from_path(&home_env) {
                    warn!("Failed to load .fenrir.env: {}", e);
                } else {
                    info!("Loaded .fenrir.env from home directory");
                }
            }
        }
    }

    /// Find and load config file
    /// Search order:
    /// 1. ./.fenrir.toml (current directory)
    /// 2. ~/.fenrir/config.toml (user config)
    /// 3. Use defaults
    fn load_config_file() -> Result<(FenrirConfig, Option<PathBuf>), ConfigError> {
        let local_config = Path::new(".fenrir.toml");
        if local_config.exists() {
            let config = Self::read_toml_file(local_config)?;
            return Ok((config, Some(local_config.to_path_buf())));
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".fenrir").join("config.toml");
            if user_config.exists() {
                let config = Self::read_toml_file(&user_config)?;
                return Ok((config, Some(user_config)));
            }
        }

        info!("No config file found, using defaults");
        Ok((FenrirConfig::default(), None))
    }

    fn read_toml_file(path: &Path) -> Result<FenrirConfig, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError(e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(mut config: FenrirConfig) -> FenrirConfig {
        // Model endpoint
        if let Ok(provider) = std::env::var("FENRIR_LLM_PROVIDER") {
            config.llm.provider = provider;
        }
        if let Ok(model) = std::env::var("FENRIR_MODEL") {
            config.llm.model = Some(model);
        }
        if let Ok(project) = std::env::var("GCP_PROJECT_ID") {
            config.llm.project_id = Some(project);
        }
        if let Ok(location) = std::env::var("GCP_LOCATION") {
            config.llm.location = location;
        }
        if let Ok(endpoint) = std::env::var("GCP_ENDPOINT_ID") {
            config.llm.endpoint_id = Some(endpoint);
        }
        if let Ok(token) = std::env::var("GOOGLE_ACCESS_TOKEN") {
            config.llm.access_token = Some(SecretString::from(token));
        }
        if let Ok(url) = std::env::var("FENRIR_BASE_URL") {
            config.llm.base_url = Some(url);
        }
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            config.llm.api_key = Some(SecretString::from(key));
        }
        if let Ok(timeout) = std::env::var("FENRIR_TIMEOUT_SECS") {
            if let Ok(secs) = timeout.parse() {
                config.llm.timeout_secs = secs;
            }
        }
        if let Ok(temp) = std::env::var("FENRIR_TEMPERATURE") {
            if let Ok(t) = temp.parse() {
                config.llm.temperature = t;
            }
        }

        // Concept sources
        if let Ok(path) = std::env::var("FENRIR_CONCEPTS_PRIMARY") {
            config.concepts.primary = PathBuf::from(path);
        }
        if let Ok(path) = std::env::var("FENRIR_CONCEPTS_SECONDARY") {
            config.concepts.secondary = PathBuf::from(path);
        }

        // Server
        if let Ok(host) = std::env::var("FENRIR_HOST") {
            config.server.host = host;
        }
        if let Ok(port) = std::env::var("FENRIR_PORT") {
            if let Ok(p) = port.parse() {
                config.server.port = p;
            }
        }

        // Logging (RUST_LOG is read directly by the subscriber's EnvFilter)
        if let Ok(level) = std::env::var("FENRIR_LOG_LEVEL") {
            config.logging.level = level;
        }

        Self::normalize(config)
    }

    /// Canonical spelling for case-insensitive settings
    fn normalize(mut config: FenrirConfig) -> FenrirConfig {
        config.llm.provider = config.llm.provider.trim().to_lowercase();
        config.logging.level = config.logging.level.trim().to_lowercase();
        config.logging.format = config.logging.format.trim().to_lowercase();
        config
    }

    /// Validate configuration
    fn validate_config(config: &FenrirConfig) -> Result<(), ConfigError> {
        match config.llm.provider.as_str() {
            "vertex" => {
                if config.llm.project_id.is_none() || config.llm.endpoint_id.is_none() {
                    return Err(ConfigError::ValidationError(
                        "vertex provider requires project_id and endpoint_id \
                         (GCP_PROJECT_ID / GCP_ENDPOINT_ID)"
                            .to_string(),
                    ));
                }
            }
            "openai-compatible" => {
                if config.llm.base_url.is_none() || config.llm.model.is_none() {
                    return Err(ConfigError::ValidationError(
                        "openai-compatible provider requires base_url and model \
                         (FENRIR_BASE_URL / FENRIR_MODEL)"
                            .to_string(),
                    ));
                }
            }
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid LLM provider: {}. Must be one of: vertex, openai-compatible",
                    other
                )))
            }
        }

        if config.llm.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }

        match config.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                    other
                )))
            }
        }

        match config.logging.format.as_str() {
            "pretty" | "json" | "compact" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid log format: {}. Must be one of: pretty, json, compact",
                    other
                )))
            }
        }

        Ok(())
    }

    /// Get the loaded configuration
    pub fn config(&self) -> &FenrirConfig {
        &self.config
    }

    /// Get the path to the config file that was loaded, if any
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vertex_config() -> FenrirConfig {
        let mut config = FenrirConfig::default();
        config.llm.project_id = Some("tutor-project".to_string());
        config.llm.endpoint_id = Some("1234".to_string());
        config
    }

    #[test]
    fn defaults_point_at_the_two_concept_documents() {
        let config = FenrirConfig::default();
        assert_eq!(config.concepts.primary, PathBuf::from("concepts_su1.json"));
        assert_eq!(config.concepts.secondary, PathBuf::from("concepts_su2.json"));
        assert_eq!(config.llm.provider, "vertex");
        assert_eq!(config.server.bind_address(), "127.0.0.1:8080");
    }

    #[test]
    fn vertex_requires_endpoint_coordinates() {
        let result = ConfigManager::from_config(FenrirConfig::default());
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
        assert!(ConfigManager::from_config(vertex_config()).is_ok());
    }

    #[test]
    fn rejects_unknown_provider_and_log_level() {
        let mut config = vertex_config();
        config.llm.provider = "carrier-pigeon".to_string();
        assert!(ConfigManager::from_config(config).is_err());

        let mut config = vertex_config();
        config.logging.level = "loud".to_string();
        assert!(ConfigManager::from_config(config).is_err());
    }

    #[test]
    fn provider_name_is_case_insensitive() {
        let mut config = vertex_config();
        config.llm.provider = " Vertex ".to_string();
        config.logging.level = "INFO".to_string();
        let manager = ConfigManager::from_config(config).expect("mixed case accepted");
        assert_eq!(manager.config().llm.provider, "vertex");
        assert_eq!(manager.config().logging.level, "info");
    }

    #[test]
    fn local_inference_provider_is_rejected() {
        let mut config = vertex_config();
        config.llm.provider = "ollama".to_string();
        config.llm.model = Some("qwen2.5:14b".to_string());
        assert!(matches!(
            ConfigManager::from_config(config),
            Err(ConfigError::ValidationError(m)) if m.contains("ollama")
        ));
    }

    #[test]
    fn openai_compatible_needs_an_explicit_endpoint() {
        let mut config = FenrirConfig::default();
        config.llm.provider = "openai-compatible".to_string();
        config.llm.model = Some("qwen2.5-72b-instruct".to_string());
        assert!(ConfigManager::from_config(config.clone()).is_err());

        config.llm.base_url = Some("https://gateway.example.com/v1".to_string());
        assert!(ConfigManager::from_config(config).is_ok());
    }

    #[test]
    fn rejects_zero_timeout() {
        let mut config = vertex_config();
        config.llm.timeout_secs = 0;
        assert!(ConfigManager::from_config(config).is_err());
    }

    #[test]
    fn secrets_are_not_serialized() {
        let mut config = vertex_config();
        config.llm.access_token = Some(SecretString::from("ya29.secret".to_string()));
        let rendered = toml::to_string(&config).expect("serialize");
        assert!(!rendered.contains("ya29.secret"));
        assert!(!rendered.contains("access_token"));
    }
}
