//! Request-time retrieval-augmented answering.
//!
//! One question flows embed → top-k query → prompt → LLM. The pipeline holds
//! no per-request state, so a single instance is shared by every handler.

use std::sync::Arc;

use anyhow::Context;
use serde::Serialize;

use super::pinecone::PineconeIndex;
use super::prompt::{join_context, PromptTemplate};
use super::store::{IndexSpec, ScoredChunk, VectorIndex};
use crate::core::config::{PromptStyle, Settings};
use crate::core::errors::ServiceError;
use crate::embeddings::{Embedder, LocalEmbedder};
use crate::llm::{build_provider, ChatRequest, LlmProvider};

#[derive(Debug, Clone, Serialize)]
pub struct RagAnswer {
    pub answer: String,
    /// Retrieved chunks the answer was conditioned on, best first.
    pub context: Vec<ScoredChunk>,
}

pub struct RagPipeline {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    llm: Arc<dyn LlmProvider>,
    prompt: PromptTemplate,
    style: PromptStyle,
    top_k: usize,
    temperature: Option<f64>,
    max_tokens: Option<u32>,
}

impl RagPipeline {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        llm: Arc<dyn LlmProvider>,
    ) -> Self {
        Self {
            embedder,
            index,
            llm,
            prompt: PromptTemplate::default(),
            style: PromptStyle::Chat,
            top_k: 3,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_prompt(mut self, prompt: PromptTemplate, style: PromptStyle) -> Self {
        self.prompt = prompt;
        self.style = style;
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub async fn answer(&self, question: &str) -> Result<RagAnswer, ServiceError> {
        let vector = self.embedder.embed_query(question).await?;
        let hits = self.index.query(&vector, self.top_k).await?;
        tracing::debug!(
            "Retrieved {} chunk(s), best score {:?}",
            hits.len(),
            hits.first().map(|hit| hit.score)
        );

        let context = join_context(hits.iter().map(|hit| hit.text.as_str()));
        let messages = self.prompt.messages(self.style, &context, question);

        let mut request = ChatRequest::new(messages);
        if let Some(t) = self.temperature {
            request = request.with_temperature(t);
        }
        if let Some(n) = self.max_tokens {
            request = request.with_max_tokens(n);
        }
        let answer = self.llm.chat(request).await?;

        Ok(RagAnswer {
            answer,
            context: hits,
        })
    }
}

/// Builds the pipeline described by `settings`: local embedder, remote index,
/// configured LLM, default prompt with the configured style and k.
///
/// Loading the embedding model happens here, so a bad model fails startup.
pub async fn build_pipeline(settings: &Settings) -> anyhow::Result<RagPipeline> {
    let embedding = settings.embedding.clone();
    let embedder = tokio::task::spawn_blocking(move || LocalEmbedder::new(&embedding))
        .await
        .context("embedding model loader panicked")??;
    tracing::info!(
        "Embedding model {} loaded on {} ({} dimensions)",
        embedder.model_name(),
        embedder.device(),
        embedder.dimension()
    );

    let spec = IndexSpec::from_settings(settings);
    if embedder.dimension() != spec.dimension {
        return Err(ServiceError::DimensionMismatch {
            expected: spec.dimension,
            actual: embedder.dimension(),
        }
        .into());
    }

    let index = PineconeIndex::new(settings);
    Ok(assemble(
        settings,
        Arc::new(embedder),
        Arc::new(index),
        build_provider(settings),
    ))
}

/// Applies the configured prompt style, k, temperature and answer length cap
/// to the given parts.
pub fn assemble(
    settings: &Settings,
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    llm: Arc<dyn LlmProvider>,
) -> RagPipeline {
    RagPipeline::new(embedder, index, llm)
        .with_prompt(PromptTemplate::default(), settings.llm.prompt_style)
        .with_top_k(settings.retrieval.top_k)
        .with_temperature(settings.llm.temperature)
        .with_max_tokens(settings.llm.max_tokens)
}
