use async_trait::async_trait;

use super::types::ChatRequest;
use crate::core::errors::ServiceError;

#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// return the provider name (e.g. "huggingface", "ollama")
    fn name(&self) -> &str;

    /// model identifier sent with every request
    fn model(&self) -> &str;

    /// chat completion (non-streaming), returns the assistant text
    async fn chat(&self, request: ChatRequest) -> Result<String, ServiceError>;
}
