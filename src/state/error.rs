use thiserror::Error;

#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("Failed to build RAG pipeline: {0}")]
    Pipeline(#[source] anyhow::Error),
}
