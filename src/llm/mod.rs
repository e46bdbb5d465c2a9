pub mod client;
pub mod relay;
pub mod types;

pub use client::{LlmClient, MISSING_API_KEY_MESSAGE, OpenAiClient};
pub use relay::PromptRelay;
pub use types::*;
