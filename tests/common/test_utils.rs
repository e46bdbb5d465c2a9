use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, Response},
};
use cube_gateway::{
    analysis::{ColorAnalyzer, ProcessRunner, UploadStore},
    config::{AnalysisConfig, Config, LlmConfig},
    llm::{LlmClient, PromptRelay},
    server::{self, handlers::AppState},
};
use serde_json::Value;
use std::{path::Path, sync::Arc};

pub const BOUNDARY: &str = "cube-gateway-test-boundary";

/// Create a test configuration whose analyzer is `sh -c <script>`.
///
/// Inside the script the three image paths are `$1`, `$2` and `$3`.
pub fn create_test_config(upload_dir: &Path, script: &str) -> Config {
    Config {
        llm: LlmConfig {
            api_key: Some("test-key".to_string()),
            ..LlmConfig::default()
        },
        analysis: AnalysisConfig {
            command: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string(), "analyzer".to_string()],
            upload_dir: upload_dir.to_string_lossy().to_string(),
            timeout_secs: Some(10),
            ..AnalysisConfig::default()
        },
        ..Config::default()
    }
}

/// Build the router around an arbitrary LLM client, as `server::run` would.
pub fn build_test_app(config: &Config, llm: Arc<dyn LlmClient>) -> Router {
    let state = AppState {
        relay: PromptRelay::new(
            llm,
            config.llm.system_prompt.clone(),
            config.llm.default_max_tokens,
        ),
        uploads: Arc::new(UploadStore::new(&config.analysis.upload_dir)),
        analyzer: Arc::new(ColorAnalyzer::new(ProcessRunner::from_config(
            &config.analysis,
        ))),
    };

    server::router(state, config).expect("test router should build")
}

pub fn json_request(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Encode `parts` as a multipart/form-data body with file parts.
pub fn multipart_body(parts: &[(&str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, data) in parts {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{name}.png\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn upload_request(parts: &[(&str, &[u8])]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/detect-colors")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

/// The standard three-image upload.
pub fn three_images() -> Vec<(&'static str, &'static [u8])> {
    vec![
        ("image1", b"red".as_slice()),
        ("image2", b"green".as_slice()),
        ("image3", b"blue".as_slice()),
    ]
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Number of entries left in the upload directory.
pub fn remaining_uploads(dir: &Path) -> usize {
    std::fs::read_dir(dir).unwrap().count()
}
