use text_splitter::{Characters, ChunkConfig, TextSplitter};

use super::Document;
use crate::core::errors::IngestError;

/// Splits documents into windows of at most `chunk_size` characters.
///
/// Boundaries are chosen at the highest semantic level that fits
/// (paragraph, sentence, word, then grapheme). Consecutive chunks share up to
/// `chunk_overlap` characters. Trimming is off, so the chunk spans cover the
/// source text without gaps.
pub struct TextChunker {
    splitter: TextSplitter<Characters>,
}

impl TextChunker {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, IngestError> {
        let config = ChunkConfig::new(chunk_size)
            .with_overlap(chunk_overlap)
            .map_err(|err| IngestError::Chunking(err.to_string()))?
            .with_trim(false);
        Ok(Self {
            splitter: TextSplitter::new(config),
        })
    }

    pub fn split_text<'text>(&self, text: &'text str) -> Vec<&'text str> {
        self.splitter.chunks(text).collect()
    }

    /// Each chunk inherits its parent's metadata; chunk position is not kept.
    /// Whitespace-only chunks (blank PDF pages) are dropped.
    pub fn split_documents(&self, docs: &[Document]) -> Vec<Document> {
        docs.iter()
            .flat_map(|doc| {
                self.split_text(&doc.page_content)
                    .into_iter()
                    .filter(|chunk| !chunk.trim().is_empty())
                    .map(|chunk| Document::new(chunk, doc.metadata.clone()))
            })
            .collect()
    }
}
