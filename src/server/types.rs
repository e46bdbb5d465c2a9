use crate::{Error, Result};
use serde::Deserialize;

pub use crate::error::ErrorResponse;

pub const MISSING_PROMPT_MESSAGE: &str = "Prompt is required.";
pub const INVALID_MAX_TOKENS_MESSAGE: &str = "max_tokens must be a positive integer.";

#[derive(Debug, Deserialize)]
pub struct PromptRequest {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

impl PromptRequest {
    /// Returns the prompt and the explicit token limit, if any.
    pub fn validate(&self) -> Result<(&str, Option<u32>)> {
        let prompt = self
            .prompt
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| Error::validation(MISSING_PROMPT_MESSAGE))?;

        if self.max_tokens == Some(0) {
            return Err(Error::validation(INVALID_MAX_TOKENS_MESSAGE));
        }

        Ok((prompt, self.max_tokens))
    }
}
