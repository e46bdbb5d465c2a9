use async_trait::async_trait;
use axum::body::Bytes;
use cube_gateway::{
    Error, Result,
    llm::{ChatCompletionRequest, ChatCompletionResponse, LlmClient},
};
use std::sync::{Arc, Mutex};

/// What the mock answers with.
#[derive(Debug, Clone)]
pub enum MockOutcome {
    Body(Bytes),
    Upstream { status: u16, body: Bytes },
    Failure(String),
}

/// Mock LLM client for testing
#[derive(Debug, Clone)]
pub struct MockLlmClient {
    pub configured: bool,
    pub outcome: MockOutcome,
    pub requests: Arc<Mutex<Vec<ChatCompletionRequest>>>,
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self {
            configured: true,
            outcome: MockOutcome::Body(Bytes::from_static(
                br#"{"id":"chatcmpl-mock","object":"chat.completion","choices":[]}"#,
            )),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Self::new()
        }
    }

    pub fn with_body(mut self, body: &'static str) -> Self {
        self.outcome = MockOutcome::Body(Bytes::from_static(body.as_bytes()));
        self
    }

    pub fn with_upstream_error(mut self, status: u16, body: &'static str) -> Self {
        self.outcome = MockOutcome::Upstream {
            status,
            body: Bytes::from_static(body.as_bytes()),
        };
        self
    }

    pub fn with_failure(mut self, message: &str) -> Self {
        self.outcome = MockOutcome::Failure(message.to_string());
        self
    }

    pub fn get_requests(&self) -> Vec<ChatCompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Default for MockLlmClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn create_chat_completion(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse> {
        self.requests.lock().unwrap().push(request);

        match &self.outcome {
            MockOutcome::Body(body) => Ok(ChatCompletionResponse { body: body.clone() }),
            MockOutcome::Upstream { status, body } => Err(Error::Upstream {
                status: *status,
                body: body.clone(),
            }),
            MockOutcome::Failure(message) => Err(Error::llm(message.clone())),
        }
    }
}
