//! Offline ingestion: PDF directory → chunks → vectors → index.
//!
//! One-shot and not transactional. A failure part-way leaves earlier batches
//! in the index; re-running overwrites them because ids are content hashes.

use std::path::{Path, PathBuf};

use serde::Serialize;

use super::store::{IndexSpec, IndexedChunk, VectorIndex};
use crate::core::config::Settings;
use crate::core::errors::{IngestError, ServiceError};
use crate::documents::{filter_documents, load_pdf_directory, Document, TextChunker};
use crate::embeddings::Embedder;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// Embedding model the vectors came from.
    pub model: String,
    /// Pages read from the PDFs.
    pub documents: usize,
    pub chunks: usize,
    pub upserted: usize,
    pub index_created: bool,
}

/// Loads, filters and chunks every PDF in `dir`.
pub fn prepare_chunks(
    dir: &Path,
    chunk_size: usize,
    chunk_overlap: usize,
) -> Result<(usize, Vec<Document>), IngestError> {
    let chunker = TextChunker::new(chunk_size, chunk_overlap)?;
    let documents = filter_documents(load_pdf_directory(dir)?);
    let chunks = chunker.split_documents(&documents);
    Ok((documents.len(), chunks))
}

pub async fn run_ingest(
    settings: &Settings,
    data_dir: &Path,
    embedder: &dyn Embedder,
    index: &dyn VectorIndex,
) -> Result<IngestReport, IngestError> {
    let spec = IndexSpec::from_settings(settings);
    if embedder.dimension() != spec.dimension {
        return Err(ServiceError::DimensionMismatch {
            expected: spec.dimension,
            actual: embedder.dimension(),
        }
        .into());
    }

    tracing::info!("Loading PDFs from {}", data_dir.display());
    let dir: PathBuf = data_dir.to_path_buf();
    let (chunk_size, chunk_overlap) = (settings.ingest.chunk_size, settings.ingest.chunk_overlap);
    let (documents, chunks) =
        tokio::task::spawn_blocking(move || prepare_chunks(&dir, chunk_size, chunk_overlap))
            .await
            .map_err(|err| IngestError::Task(err.to_string()))??;

    if documents == 0 {
        tracing::warn!("No PDF pages found in {}", data_dir.display());
    }
    tracing::info!(
        "Prepared {} chunk(s) from {} page(s); embedding with {}",
        chunks.len(),
        documents,
        embedder.model_name()
    );

    let index_created = index.ensure_index(&spec).await?;
    if index_created {
        tracing::info!("Created index '{}'", spec.name);
    }

    let total = chunks.len();
    let mut upserted = 0;
    for batch in chunks.chunks(settings.ingest.embed_batch_size) {
        let texts = batch.iter().map(|doc| doc.page_content.clone()).collect();
        let vectors = embedder.embed_documents(texts).await?;
        let entries: Vec<IndexedChunk> = batch
            .iter()
            .zip(vectors)
            .map(|(doc, values)| IndexedChunk::new(doc, values))
            .collect();
        upserted += index.upsert(entries).await?;
        tracing::info!("Upserted {}/{} chunk(s)", upserted, total);
    }

    Ok(IngestReport {
        model: embedder.model_name().to_string(),
        documents,
        chunks: total,
        upserted,
        index_created,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::settings::{FileConfig, HUGGINGFACEHUB_API_TOKEN, PINECONE_API_KEY};
    use crate::documents::loader::tests::write_pdf;
    use crate::rag::memory::InMemoryIndex;
    use crate::rag::pipeline::tests::KeywordEmbedder;
    use tempfile::TempDir;

    fn settings() -> Settings {
        let mut settings = Settings::from_sources(FileConfig::default(), |key| match key {
            PINECONE_API_KEY | HUGGINGFACEHUB_API_TOKEN => Some("x".to_string()),
            _ => None,
        })
        .unwrap();
        settings.index.dimension = 3;
        settings.ingest.embed_batch_size = 2;
        settings
    }

    fn pdf_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        write_pdf(
            &dir.path().join("flu.pdf"),
            &["Flu brings fever and aches", "Rest and fluids help"],
        );
        write_pdf(&dir.path().join("bones.pdf"), &["A broken arm needs a cast"]);
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        dir
    }

    #[tokio::test]
    async fn ingests_every_page_and_creates_the_index() {
        let dir = pdf_dir();
        let index = InMemoryIndex::new();

        let report = run_ingest(&settings(), dir.path(), &KeywordEmbedder, &index)
            .await
            .unwrap();

        assert_eq!(report.model, "keyword");
        assert_eq!(report.documents, 3);
        assert!(report.chunks >= report.documents);
        assert_eq!(report.upserted, report.chunks);
        assert!(report.index_created);
        assert_eq!(index.len().await, report.chunks);
    }

    #[tokio::test]
    async fn rerun_reuses_index_and_overwrites_entries() {
        let dir = pdf_dir();
        let index = InMemoryIndex::new();
        let first = run_ingest(&settings(), dir.path(), &KeywordEmbedder, &index)
            .await
            .unwrap();

        let second = run_ingest(&settings(), dir.path(), &KeywordEmbedder, &index)
            .await
            .unwrap();

        assert!(!second.index_created);
        assert_eq!(second.upserted, first.upserted);
        assert_eq!(index.len().await, first.chunks);
    }

    #[tokio::test]
    async fn chunks_keep_only_the_source() {
        let dir = pdf_dir();
        let (pages, chunks) = prepare_chunks(dir.path(), 500, 20).unwrap();

        assert_eq!(pages, 3);
        for chunk in &chunks {
            assert_eq!(chunk.metadata.len(), 1);
            assert!(chunk.source().unwrap().ends_with(".pdf"));
        }
    }

    #[tokio::test]
    async fn blank_pages_are_not_indexed() {
        let dir = TempDir::new().unwrap();
        write_pdf(&dir.path().join("blank.pdf"), &[""]);
        let (pages, chunks) = prepare_chunks(dir.path(), 500, 20).unwrap();
        assert_eq!(pages, 1);
        assert!(chunks.is_empty());

        write_pdf(&dir.path().join("mixed.pdf"), &["", "Flu brings fever", ""]);
        let index = InMemoryIndex::new();
        let report = run_ingest(&settings(), dir.path(), &KeywordEmbedder, &index)
            .await
            .unwrap();

        assert_eq!(report.documents, 4);
        assert_eq!(report.chunks, 1);
        assert_eq!(report.upserted, 1);
        assert_eq!(index.len().await, 1);
    }

    #[tokio::test]
    async fn missing_directory_aborts() {
        let dir = TempDir::new().unwrap();
        let index = InMemoryIndex::new();
        let err = run_ingest(&settings(), &dir.path().join("absent"), &KeywordEmbedder, &index)
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::Io { .. }));
        assert!(index.is_empty().await);
    }

    #[tokio::test]
    async fn embedder_dimension_must_match_index() {
        let dir = pdf_dir();
        let mut settings = settings();
        settings.index.dimension = 384;
        let err = run_ingest(&settings, dir.path(), &KeywordEmbedder, &InMemoryIndex::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            IngestError::Service(ServiceError::DimensionMismatch { .. })
        ));
    }
}
