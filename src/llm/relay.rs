use super::{
    client::{LlmClient, MISSING_API_KEY_MESSAGE},
    types::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage},
};
use crate::{Error, Result};
use std::sync::Arc;
use tracing::info;

/// Forwards a single user prompt, prefixed by a fixed system instruction.
#[derive(Clone)]
pub struct PromptRelay {
    client: Arc<dyn LlmClient>,
    system_prompt: String,
    default_max_tokens: u32,
}

impl PromptRelay {
    pub fn new(
        client: Arc<dyn LlmClient>,
        system_prompt: impl Into<String>,
        default_max_tokens: u32,
    ) -> Self {
        Self {
            client,
            system_prompt: system_prompt.into(),
            default_max_tokens,
        }
    }

    pub fn ensure_configured(&self) -> Result<()> {
        if self.client.is_configured() {
            Ok(())
        } else {
            Err(Error::config(MISSING_API_KEY_MESSAGE))
        }
    }

    pub async fn relay(
        &self,
        prompt: &str,
        max_tokens: Option<u32>,
    ) -> Result<ChatCompletionResponse> {
        self.ensure_configured()?;

        let max_tokens = max_tokens.unwrap_or(self.default_max_tokens);
        info!(
            "Relaying prompt ({} chars, max_tokens {})",
            prompt.len(),
            max_tokens
        );

        let request = ChatCompletionRequest {
            messages: vec![
                ChatMessage::system(self.system_prompt.clone()),
                ChatMessage::user(prompt),
            ],
            max_tokens,
        };

        self.client.create_chat_completion(request).await
    }
}
