use axum::{
    Json,
    body::{Body, Bytes},
    extract::multipart::MultipartError,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

pub type Result<T> = std::result::Result<T, Error>;

/// Returned when the three image fields are not all present.
pub const MISSING_IMAGES_MESSAGE: &str = "Please upload 3 images.";
/// Returned when the analyzer exits non-zero, times out or cannot be spawned.
pub const PROCESS_FAILED_MESSAGE: &str = "Python script failed.";
/// Returned when the analyzer exits cleanly but its stdout is not JSON.
pub const INVALID_OUTPUT_MESSAGE: &str = "Invalid JSON from Python script.";

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Upstream API responded with status {status}")]
    Upstream { status: u16, body: Bytes },

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("External process error: {message}")]
    ExternalProcess { message: String, stderr: String },

    #[error("Invalid output from external process: {0}")]
    InvalidOutput(String),

    #[error("Request body too large: {0}")]
    PayloadTooLarge(String),

    #[error("Multipart error: {0}")]
    Multipart(#[from] MultipartError),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Address parse error: {0}")]
    AddrParse(#[from] std::net::AddrParseError),

    #[error("OpenAI error: {0}")]
    OpenAi(#[from] async_openai::error::OpenAIError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn payload_too_large(msg: impl Into<String>) -> Self {
        Self::PayloadTooLarge(msg.into())
    }

    pub fn llm(msg: impl Into<String>) -> Self {
        Self::Llm(msg.into())
    }

    pub fn external_process(msg: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self::ExternalProcess {
            message: msg.into(),
            stderr: stderr.into(),
        }
    }

    pub fn invalid_output(msg: impl Into<String>) -> Self {
        Self::InvalidOutput(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// HTTP status the error is reported with.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            // 413 when the body limit was hit, 400 for a malformed stream.
            Self::Multipart(e) => e.status(),
            Self::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn client_message(&self) -> String {
        match self {
            Self::Config(msg)
            | Self::Validation(msg)
            | Self::PayloadTooLarge(msg)
            | Self::Llm(msg) => msg.clone(),
            Self::Multipart(e) => e.body_text(),
            Self::Network(e) => format!("Failed to reach the completion API: {}", e),
            Self::ExternalProcess { .. } => PROCESS_FAILED_MESSAGE.to_string(),
            Self::InvalidOutput(_) => INVALID_OUTPUT_MESSAGE.to_string(),
            _ => "Internal server error".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();

        match &self {
            Self::ExternalProcess { stderr, .. } => {
                error!(status = %status, stderr = %stderr, "{}", self)
            }
            _ if status.is_server_error() => error!(status = %status, "{}", self),
            _ => warn!(status = %status, "{}", self),
        }

        if let Self::Upstream { body, .. } = self {
            // Structured upstream errors go back to the caller untouched.
            if serde_json::from_slice::<serde::de::IgnoredAny>(&body).is_ok() {
                return (
                    status,
                    [(header::CONTENT_TYPE, "application/json")],
                    Body::from(body),
                )
                    .into_response();
            }
            let error = String::from_utf8_lossy(&body).trim().to_string();
            return (status, Json(ErrorResponse { error })).into_response();
        }

        let error = self.client_message();
        (status, Json(ErrorResponse { error })).into_response()
    }
}
