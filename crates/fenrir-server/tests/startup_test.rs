use fenrir_core::{ConfigManager, FenrirConfig, FenrirError};
use fenrir_server::AppState;
use serial_test::serial;
use std::io::Write;
use std::path::Path;
use tempfile::{NamedTempFile, TempDir};

fn concept_file(dir: &Path, name: &str, body: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).expect("write concept file");
    path
}

fn gateway_config(dir: &TempDir) -> FenrirConfig {
    let mut config = FenrirConfig::default();
    config.llm.provider = "openai-compatible".to_string();
    config.llm.base_url = Some("https://gateway.example.com/v1".to_string());
    config.llm.model = Some("qwen2.5-72b-instruct".to_string());
    config.concepts.primary = concept_file(
        dir.path(),
        "concepts_su1.json",
        r#"{"limits": {"definition": "value approached"}, "series": {"definition": "old"}}"#,
    );
    config.concepts.secondary = concept_file(
        dir.path(),
        "concepts_su2.json",
        r#"{"series": {"definition": "sum of a sequence"}}"#,
    );
    config
}

#[test]
fn builds_state_from_valid_configuration() {
    let dir = TempDir::new().expect("tempdir");
    let state = AppState::from_config(gateway_config(&dir)).expect("state");

    let store = state.pipeline.store();
    assert_eq!(store.len(), 2);
    assert_eq!(
        store.get("series").and_then(|v| v["definition"].as_str()),
        Some("sum of a sequence")
    );
    assert_eq!(state.pipeline.provider().provider_name(), "openai-compatible");
    assert!(state.sessions.is_empty());
}

#[test]
fn missing_concept_document_is_fatal() {
    let dir = TempDir::new().expect("tempdir");
    let mut config = gateway_config(&dir);
    config.concepts.secondary = dir.path().join("absent.json");

    let err = AppState::from_config(config).err().expect("must fail");
    assert!(matches!(err, FenrirError::ConceptLoad { .. }));
    assert!(err.is_fatal_startup());
}

#[test]
fn unusable_model_endpoint_is_fatal() {
    let dir = TempDir::new().expect("tempdir");
    let mut config = gateway_config(&dir);
    config.llm.provider = "vertex".to_string();
    config.llm.project_id = Some("demo".to_string());
    config.llm.endpoint_id = Some("42".to_string());

    let err = AppState::from_config(config).err().expect("must fail");
    assert!(matches!(err, FenrirError::ModelInit(_)));
    assert!(err.is_fatal_startup());
}

#[test]
fn local_inference_provider_does_not_start() {
    let dir = TempDir::new().expect("tempdir");
    let mut config = gateway_config(&dir);
    config.llm.provider = "ollama".to_string();

    let err = AppState::from_config(config).err().expect("must fail");
    assert!(matches!(err, FenrirError::ModelInit(_)));
}

#[test]
#[serial]
fn config_file_drives_startup() {
    for key in [
        "FENRIR_LLM_PROVIDER",
        "FENRIR_MODEL",
        "FENRIR_BASE_URL",
        "FENRIR_CONCEPTS_PRIMARY",
        "FENRIR_CONCEPTS_SECONDARY",
        "FENRIR_HOST",
        "FENRIR_PORT",
    ] {
        std::env::remove_var(key);
    }

    let dir = TempDir::new().expect("tempdir");
    let base = gateway_config(&dir);

    let mut file = NamedTempFile::new().expect("config file");
    write!(
        file,
        r#"
[llm]
provider = "openai-compatible"
base_url = "https://gateway.example.com/v1"
model = "llama3.1-8b-instruct"

[concepts]
primary = "{}"
secondary = "{}"

[server]
port = 9191
"#,
        base.concepts.primary.display(),
        base.concepts.secondary.display()
    )
    .expect("write config");

    let manager = ConfigManager::load_from(file.path()).expect("config");
    assert_eq!(manager.config().server.bind_address(), "127.0.0.1:9191");

    let state = AppState::from_config(manager.config().clone()).expect("state");
    assert_eq!(state.pipeline.provider().model_name(), "llama3.1-8b-instruct");
    assert_eq!(state.config.server.port, 9191);
}
