//! Retrieval-augmented generation.
//!
//! - `store`: the `VectorIndex` capability and its entry types
//! - `pinecone` / `memory`: remote and in-process index implementations
//! - `ingest`: offline PDF → index job
//! - `prompt` / `pipeline`: request-time answering

pub mod ingest;
pub mod memory;
pub mod pinecone;
pub mod pipeline;
pub mod prompt;
pub mod store;

pub use ingest::{run_ingest, IngestReport};
pub use memory::InMemoryIndex;
pub use pinecone::PineconeIndex;
pub use pipeline::{assemble, build_pipeline, RagAnswer, RagPipeline};
pub use prompt::{PromptTemplate, FALLBACK_ANSWER, SYSTEM_PROMPT};
pub use store::{IndexSpec, IndexedChunk, ScoredChunk, VectorIndex};
