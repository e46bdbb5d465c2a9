use cube_gateway::{Error, config::load_from_path};
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use tokio::fs;

const FULL_CONFIG_YAML: &str = r#"
server:
  host: "127.0.0.1"
  port: 8080
  logs:
    level: "debug"
  cors_allowed_origins:
    - "http://localhost:3000"

llm:
  base_url: "https://llm.internal/v1"
  api_key: "sk-test"
  model: "gpt-4o-mini"
  system_prompt: "You explain Rubik's cube algorithms."
  default_max_tokens: 250
  timeout_secs: 15

analysis:
  command: "python3"
  args: ["scripts/rubiks_cube_color_detector.py", "--quiet"]
  upload_dir: "/tmp/cube-uploads"
  max_upload_bytes: 1048576
  timeout_secs: 30
"#;

async fn write_config(dir: &TempDir, content: &str) -> String {
    let config_path = dir.path().join("config.yaml");
    fs::write(&config_path, content).await.unwrap();
    config_path.to_string_lossy().to_string()
}

#[tokio::test]
async fn test_full_config_is_parsed() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, FULL_CONFIG_YAML).await;

    let config = load_from_path(&path).await.unwrap();

    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.server.logs.level, "debug");
    assert_eq!(config.server.cors_allowed_origins, vec!["http://localhost:3000"]);
    assert_eq!(config.llm.base_url, "https://llm.internal/v1");
    assert_eq!(config.llm.api_key(), Some("sk-test"));
    assert_eq!(config.llm.model, "gpt-4o-mini");
    assert_eq!(config.llm.default_max_tokens, 250);
    assert_eq!(config.llm.timeout_secs, 15);
    assert_eq!(
        config.analysis.args,
        vec!["scripts/rubiks_cube_color_detector.py", "--quiet"]
    );
    assert_eq!(config.analysis.upload_dir, "/tmp/cube-uploads");
    assert_eq!(config.analysis.max_upload_bytes, 1_048_576);
    assert_eq!(config.analysis.timeout_secs, Some(30));
}

#[tokio::test]
async fn test_partial_config_fills_defaults() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "llm:\n  model: \"gpt-4o\"\n").await;

    let config = load_from_path(&path).await.unwrap();

    assert_eq!(config.llm.model, "gpt-4o");
    assert_eq!(config.llm.api_key(), None);
    assert_eq!(config.llm.base_url, "https://api.openai.com/v1");
    assert_eq!(config.llm.system_prompt, "You are a helpful assistant.");
    assert_eq!(config.llm.default_max_tokens, 100);
    assert_eq!(config.server.port, 5000);
    assert_eq!(config.server.logs.level, "info");
    assert_eq!(config.analysis.command, "python3");
    assert_eq!(config.analysis.upload_dir, "uploads");
    assert_eq!(config.analysis.timeout_secs, Some(120));
}

#[tokio::test]
async fn test_missing_file_yields_defaults() {
    let dir = TempDir::new().unwrap();

    let config = load_from_path(dir.path().join("absent.yaml")).await.unwrap();

    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.llm.model, "gpt-3.5-turbo");
    assert_eq!(config.analysis.args, vec!["scripts/rubiks_cube_color_detector.py"]);
}

#[tokio::test]
async fn test_null_timeout_disables_it() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "analysis:\n  timeout_secs: null\n").await;

    let config = load_from_path(&path).await.unwrap();

    assert_eq!(config.analysis.timeout_secs, None);
}

#[tokio::test]
async fn test_empty_api_key_counts_as_missing() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "llm:\n  api_key: \"\"\n").await;

    let config = load_from_path(&path).await.unwrap();

    assert_eq!(config.llm.api_key(), None);
}

#[tokio::test]
async fn test_malformed_yaml_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "server:\n  port: \"not-a-number\"\n").await;

    let result = load_from_path(&path).await;

    assert!(matches!(result, Err(Error::Yaml(_))));
}
