//! Sentence embeddings.
//!
//! `Embedder` is the capability the ingestion job and the request pipeline
//! share; both must use the same model so stored and query vectors live in
//! the same space.

mod device;
mod local;

use async_trait::async_trait;

use crate::core::errors::ServiceError;

pub use device::ComputeDevice;
pub use local::LocalEmbedder;

#[async_trait]
pub trait Embedder: Send + Sync {
    /// Length of every vector this embedder produces.
    fn dimension(&self) -> usize;

    fn model_name(&self) -> &str;

    /// Embed a batch of passages, preserving order.
    async fn embed_documents(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, ServiceError>;

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, ServiceError> {
        let mut vectors = self.embed_documents(vec![text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| ServiceError::Embedding("model returned no vector".to_string()))
    }
}

/// Rejects any vector whose length differs from `expected`.
pub fn check_dimensions(vectors: &[Vec<f32>], expected: usize) -> Result<(), ServiceError> {
    match vectors.iter().find(|v| v.len() != expected) {
        Some(bad) => Err(ServiceError::DimensionMismatch {
            expected,
            actual: bad.len(),
        }),
        None => Ok(()),
    }
}
