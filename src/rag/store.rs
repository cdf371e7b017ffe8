//! VectorIndex trait: abstract interface over the vector database.
//!
//! The deployed backend is Pinecone (`pinecone` module); `memory` provides an
//! in-process stand-in with the same contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::core::config::{Metric, Settings};
use crate::core::errors::ServiceError;
use crate::documents::Document;

/// Desired shape of the remote index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
    pub name: String,
    pub dimension: usize,
    pub metric: Metric,
    pub cloud: String,
    pub region: String,
}

impl IndexSpec {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            name: settings.index.name.clone(),
            dimension: settings.index.dimension,
            metric: settings.index.metric,
            cloud: settings.index.cloud.clone(),
            region: settings.pinecone_environment.clone(),
        }
    }
}

/// One chunk ready to be written: vector plus the text it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedChunk {
    /// Content-derived identifier, stable across ingestion runs.
    pub id: String,
    pub values: Vec<f32>,
    pub text: String,
    pub source: Option<String>,
}

impl IndexedChunk {
    pub fn new(chunk: &Document, values: Vec<f32>) -> Self {
        let source = chunk.source().map(str::to_string);
        Self {
            id: content_id(source.as_deref(), &chunk.page_content),
            values,
            text: chunk.page_content.clone(),
            source,
        }
    }
}

/// Result of a similarity search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub id: String,
    pub text: String,
    pub source: Option<String>,
    /// Similarity score (higher = better).
    pub score: f32,
}

/// SHA-256 over source and text, so re-ingesting unchanged data overwrites
/// the same entries.
pub fn content_id(source: Option<&str>, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.unwrap_or_default().as_bytes());
    hasher.update([0u8]);
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Create the index when absent. Returns `true` only if this call created it.
    ///
    /// An existing index with a different dimension is an error.
    async fn ensure_index(&self, spec: &IndexSpec) -> Result<bool, ServiceError>;

    /// Insert or replace entries by id. Returns the number written.
    async fn upsert(&self, entries: Vec<IndexedChunk>) -> Result<usize, ServiceError>;

    /// The `top_k` entries most similar to `vector`, best first.
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<ScoredChunk>, ServiceError>;
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    let denom = norm_a * norm_b;

    if denom <= f32::EPSILON {
        0.0
    } else {
        dot / denom
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_id_is_stable_and_source_sensitive() {
        let a = content_id(Some("/data/a.pdf"), "fever");
        assert_eq!(a, content_id(Some("/data/a.pdf"), "fever"));
        assert_ne!(a, content_id(Some("/data/b.pdf"), "fever"));
        assert_ne!(a, content_id(Some("/data/a.pdf"), "fever."));
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn content_id_separates_source_from_text() {
        assert_ne!(content_id(Some("ab"), "c"), content_id(Some("a"), "bc"));
    }

    #[test]
    fn indexed_chunk_carries_source_and_text() {
        let doc = Document::with_source("Rest helps.", "/data/a.pdf");
        let entry = IndexedChunk::new(&doc, vec![0.5; 4]);
        assert_eq!(entry.text, "Rest helps.");
        assert_eq!(entry.source.as_deref(), Some("/data/a.pdf"));
        assert_eq!(entry.id, content_id(Some("/data/a.pdf"), "Rest helps."));
    }

    #[test]
    fn cosine_similarity_basics() {
        assert!((cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 3.0]).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
    }
}
