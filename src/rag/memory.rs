//! In-process vector index.
//!
//! Brute-force cosine search over a `Vec`, guarded by a `RwLock`. Holds a
//! single index; used for offline runs and as the test double for the
//! remote service.

use std::cmp::Ordering;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::store::{cosine_similarity, IndexSpec, IndexedChunk, ScoredChunk, VectorIndex};
use crate::core::errors::ServiceError;

#[derive(Default)]
pub struct InMemoryIndex {
    spec: RwLock<Option<IndexSpec>>,
    entries: RwLock<Vec<IndexedChunk>>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    async fn dimension(&self) -> Result<usize, ServiceError> {
        self.spec
            .read()
            .await
            .as_ref()
            .map(|spec| spec.dimension)
            .ok_or_else(|| ServiceError::VectorIndex("index does not exist".to_string()))
    }
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    async fn ensure_index(&self, spec: &IndexSpec) -> Result<bool, ServiceError> {
        let mut current = self.spec.write().await;
        match current.as_ref() {
            Some(existing) if existing.dimension != spec.dimension => {
                Err(ServiceError::DimensionMismatch {
                    expected: spec.dimension,
                    actual: existing.dimension,
                })
            }
            Some(_) => Ok(false),
            None => {
                *current = Some(spec.clone());
                Ok(true)
            }
        }
    }

    async fn upsert(&self, entries: Vec<IndexedChunk>) -> Result<usize, ServiceError> {
        let dimension = self.dimension().await?;
        if let Some(bad) = entries.iter().find(|e| e.values.len() != dimension) {
            return Err(ServiceError::DimensionMismatch {
                expected: dimension,
                actual: bad.values.len(),
            });
        }

        let written = entries.len();
        let mut stored = self.entries.write().await;
        for entry in entries {
            match stored.iter_mut().find(|existing| existing.id == entry.id) {
                Some(existing) => *existing = entry,
                None => stored.push(entry),
            }
        }
        Ok(written)
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<ScoredChunk>, ServiceError> {
        let dimension = self.dimension().await?;
        if vector.len() != dimension {
            return Err(ServiceError::DimensionMismatch {
                expected: dimension,
                actual: vector.len(),
            });
        }

        let stored = self.entries.read().await;
        let mut scored: Vec<ScoredChunk> = stored
            .iter()
            .map(|entry| ScoredChunk {
                id: entry.id.clone(),
                text: entry.text.clone(),
                source: entry.source.clone(),
                score: cosine_similarity(vector, &entry.values),
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        scored.truncate(top_k);
        Ok(scored)
    }
}
