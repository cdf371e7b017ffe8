pub mod huggingface;
pub mod ollama;
pub mod provider;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

use crate::core::config::{LlmProviderKind, Settings};

pub use huggingface::HuggingFaceProvider;
pub use ollama::OllamaProvider;
pub use provider::LlmProvider;
pub use types::{ChatMessage, ChatRequest};

/// Builds the configured provider.
pub fn build_provider(settings: &Settings) -> Arc<dyn LlmProvider> {
    let llm = &settings.llm;
    let timeout = Duration::from_secs(llm.timeout_secs);
    let provider: Arc<dyn LlmProvider> = match llm.provider {
        LlmProviderKind::Huggingface => Arc::new(HuggingFaceProvider::new(
            &llm.base_url,
            &llm.model,
            settings.huggingface_api_token.clone(),
            timeout,
        )),
        LlmProviderKind::Ollama => {
            Arc::new(OllamaProvider::new(&llm.base_url, &llm.model, timeout))
        }
    };
    tracing::info!(
        "LLM provider: {} (model {}, temperature {})",
        provider.name(),
        provider.model(),
        llm.temperature
    );
    provider
}
