use super::types::*;
use crate::{Error, Result, config::LlmConfig};
use async_openai::types::{CreateChatCompletionRequest, CreateChatCompletionRequestArgs};
use async_trait::async_trait;
use serde::de::IgnoredAny;
use std::time::Duration;
use tracing::{debug, warn};

pub const MISSING_API_KEY_MESSAGE: &str = "OpenAI API key is not configured.";

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Whether a credential is available for upstream calls.
    fn is_configured(&self) -> bool;

    async fn create_chat_completion(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse>;
}

/// Talks to an OpenAI-compatible `/chat/completions` endpoint and hands the
/// response body back untouched.
pub struct OpenAiClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
}

impl OpenAiClient {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key: config.api_key().map(str::to_string),
            model: config.model.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    #[allow(deprecated)]
    fn build_request(&self, request: ChatCompletionRequest) -> Result<CreateChatCompletionRequest> {
        let mut messages = Vec::with_capacity(request.messages.len());
        for msg in &request.messages {
            messages.push(msg.to_openai_message()?);
        }

        let openai_request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .max_tokens(request.max_tokens)
            .build()?;

        Ok(openai_request)
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn create_chat_completion(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| Error::config(MISSING_API_KEY_MESSAGE))?;

        debug!(
            "Creating chat completion with {} messages, max_tokens {}",
            request.messages.len(),
            request.max_tokens
        );

        let payload = self.build_request(request)?;

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            warn!("Completion API responded with {}", status);
            return Err(Error::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        if serde_json::from_slice::<IgnoredAny>(&body).is_err() {
            return Err(Error::llm("Completion API returned a body that is not JSON"));
        }

        debug!("Received chat completion response ({} bytes)", body.len());

        Ok(ChatCompletionResponse { body })
    }
}
