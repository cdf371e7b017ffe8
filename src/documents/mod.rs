//! Document model and the ingestion-side text preparation.
//!
//! - `loader`: reads every PDF page in a directory into a `Document`
//! - `filter`: strips loader metadata down to `source`
//! - `chunker`: splits documents into overlapping, bounded-length chunks

mod chunker;
mod filter;
pub(crate) mod loader;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use chunker::TextChunker;
pub use filter::filter_documents;
pub use loader::load_pdf_directory;

pub const SOURCE_KEY: &str = "source";

/// A unit of text with free-form metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub page_content: String,
    pub metadata: Map<String, Value>,
}

impl Document {
    pub fn new(page_content: impl Into<String>, metadata: Map<String, Value>) -> Self {
        Self {
            page_content: page_content.into(),
            metadata,
        }
    }

    /// Document whose only metadata is its source path.
    pub fn with_source(page_content: impl Into<String>, source: impl Into<String>) -> Self {
        let mut metadata = Map::new();
        metadata.insert(SOURCE_KEY.to_string(), Value::String(source.into()));
        Self::new(page_content, metadata)
    }

    pub fn source(&self) -> Option<&str> {
        self.metadata.get(SOURCE_KEY).and_then(Value::as_str)
    }
}
