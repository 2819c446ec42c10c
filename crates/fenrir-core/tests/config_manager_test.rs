use fenrir_core::{ConfigError, ConfigManager};
use secrecy::ExposeSecret;
use serial_test::serial;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

const ENV_KEYS: &[&str] = &[
    "FENRIR_LLM_PROVIDER",
    "FENRIR_MODEL",
    "FENRIR_BASE_URL",
    "GCP_PROJECT_ID",
    "GCP_ENDPOINT_ID",
    "GOOGLE_ACCESS_TOKEN",
    "FENRIR_CONCEPTS_SECONDARY",
    "FENRIR_PORT",
    "FENRIR_LOG_LEVEL",
];

fn clear_env() {
    for key in ENV_KEYS {
        std::env::remove_var(key);
    }
}

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(content.as_bytes()).expect("write");
    file
}

#[test]
#[serial]
fn reads_explicit_toml_file() {
    clear_env();
    let file = write_config(
        r#"
[llm]
provider = "openai-compatible"
base_url = "https://gateway.example.com/v1"
model = "qwen2.5-72b-instruct"
timeout_secs = 30

[concepts]
primary = "data/su1.json"
secondary = "data/su2.json"

[server]
port = 9000
"#,
    );

    let manager = ConfigManager::load_from(file.path()).expect("config");
    let config = manager.config();
    assert_eq!(config.llm.provider, "openai-compatible");
    assert_eq!(config.llm.timeout_secs, 30);
    assert_eq!(config.concepts.secondary, PathBuf::from("data/su2.json"));
    assert_eq!(config.server.port, 9000);
    assert_eq!(manager.config_path(), Some(file.path()));
}

#[test]
#[serial]
fn environment_overrides_file_values() {
    clear_env();
    let file = write_config(
        r#"
[llm]
provider = "openai-compatible"

[concepts]
secondary = "from-file.json"
"#,
    );

    std::env::set_var("FENRIR_LLM_PROVIDER", "vertex");
    std::env::set_var("GCP_PROJECT_ID", "tutor-project");
    std::env::set_var("GCP_ENDPOINT_ID", "5973");
    std::env::set_var("GOOGLE_ACCESS_TOKEN", "ya29.token");
    std::env::set_var("FENRIR_CONCEPTS_SECONDARY", "from-env.json");
    std::env::set_var("FENRIR_PORT", "9100");

    let manager = ConfigManager::load_from(file.path()).expect("config");
    let config = manager.config();
    assert_eq!(config.llm.provider, "vertex");
    assert_eq!(config.llm.project_id.as_deref(), Some("tutor-project"));
    assert_eq!(
        config
            .llm
            .access_token
            .as_ref()
            .map(|t| t.expose_secret().to_string()),
        Some("ya29.token".to_string())
    );
    assert_eq!(config.concepts.secondary, PathBuf::from("from-env.json"));
    assert_eq!(config.server.port, 9100);

    clear_env();
}

#[test]
#[serial]
fn missing_explicit_file_is_an_error() {
    clear_env();
    let result = ConfigManager::load_from(std::path::Path::new("/nonexistent/fenrir.toml"));
    assert!(matches!(result, Err(ConfigError::NotFound(_))));
}

#[test]
#[serial]
fn malformed_toml_is_a_parse_error() {
    clear_env();
    let file = write_config("[llm\nprovider = ");
    let result = ConfigManager::load_from(file.path());
    assert!(matches!(result, Err(ConfigError::ParseError(_))));
}

#[test]
#[serial]
fn provider_from_environment_ignores_case() {
    clear_env();
    let file = write_config("[llm]\nprovider = \"openai-compatible\"\n");

    std::env::set_var("FENRIR_LLM_PROVIDER", "Vertex");
    std::env::set_var("GCP_PROJECT_ID", "tutor-project");
    std::env::set_var("GCP_ENDPOINT_ID", "5973");

    let manager = ConfigManager::load_from(file.path()).expect("mixed-case provider accepted");
    assert_eq!(manager.config().llm.provider, "vertex");

    clear_env();
}
