// src/llm/provider.rs
// Text generation seam used by the journaling UI and analyzer scheduler

use async_trait::async_trait;

use super::client::{GenerationRequest, OpenAIClient};
use super::error::Result;

/// Anything that turns a prompt into reply text
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Provider name for logging/debugging
    fn name(&self) -> &'static str;

    async fn generate(&self, request: &GenerationRequest) -> Result<String>;
}

#[async_trait]
impl TextGenerator for OpenAIClient {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        OpenAIClient::generate(self, request).await
    }
}
