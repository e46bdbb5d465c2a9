use super::types::{ErrorResponse, PromptRequest};
use crate::{
    Error, Result,
    analysis::{ColorAnalyzer, UploadStore},
    error::MISSING_IMAGES_MESSAGE,
    llm::PromptRelay,
};
use axum::{
    Json,
    body::Body,
    extract::{Multipart, State, multipart::MultipartRejection, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Clone)]
pub struct AppState {
    pub relay: PromptRelay,
    pub uploads: Arc<UploadStore>,
    pub analyzer: Arc<ColorAnalyzer>,
}

/// `POST /api/openai`
pub async fn openai(
    State(state): State<AppState>,
    payload: std::result::Result<Json<PromptRequest>, JsonRejection>,
) -> Result<Response> {
    // The credential is checked before anything about the request.
    state.relay.ensure_configured()?;

    let Json(request) = payload.map_err(|rejection| {
        debug!("Rejected prompt body: {}", rejection.body_text());
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Error::payload_too_large(rejection.body_text())
        } else {
            Error::validation(rejection.body_text())
        }
    })?;
    let (prompt, max_tokens) = request.validate()?;

    let completion = state.relay.relay(prompt, max_tokens).await?;

    info!("Prompt relayed successfully");
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        Body::from(completion.body),
    )
        .into_response())
}

/// `POST /api/detect-colors`
pub async fn detect_colors(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>> {
    let multipart = multipart.map_err(|rejection| {
        debug!("Rejected upload body: {}", rejection.body_text());
        Error::validation(MISSING_IMAGES_MESSAGE)
    })?;

    let images = state.uploads.receive(multipart).await?;
    info!("Received image set, starting analysis");

    let result = state.analyzer.analyze(images).await?;
    Ok(Json(result))
}

pub async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: "Not found".to_string(),
        }),
    )
}
