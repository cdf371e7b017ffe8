use std::sync::{Arc, Mutex};

use anyhow::Context;
use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

use super::device::ComputeDevice;
use super::{check_dimensions, Embedder};
use crate::core::config::settings::EmbeddingConfig;
use crate::core::errors::ServiceError;

/// Models this embedder knows how to load, keyed by their Hub name.
const SUPPORTED_MODELS: [(&str, EmbeddingModel, usize); 3] = [
    (
        "sentence-transformers/all-MiniLM-L6-v2",
        EmbeddingModel::AllMiniLML6V2,
        384,
    ),
    ("BAAI/bge-small-en-v1.5", EmbeddingModel::BGESmallENV15, 384),
    (
        "sentence-transformers/paraphrase-MiniLM-L12-v2",
        EmbeddingModel::ParaphraseMLMiniLML12V2,
        384,
    ),
];

fn resolve_model(name: &str) -> Option<(EmbeddingModel, usize)> {
    SUPPORTED_MODELS
        .iter()
        .find(|(known, _, _)| known.eq_ignore_ascii_case(name))
        .map(|(_, model, dim)| (model.clone(), *dim))
}

/// In-process sentence-transformer running on ONNX Runtime.
///
/// Inference is deterministic: the same text with the same model files
/// always yields the same vector.
pub struct LocalEmbedder {
    model: Arc<Mutex<TextEmbedding>>,
    model_name: String,
    dimension: usize,
    device: ComputeDevice,
}

impl LocalEmbedder {
    /// Loads the model, downloading it into `cache_dir` on first use.
    /// Fails if the model name is unknown or the files cannot be loaded.
    pub fn new(config: &EmbeddingConfig) -> anyhow::Result<Self> {
        let (model, dimension) = resolve_model(&config.model)
            .with_context(|| format!("Unsupported embedding model '{}'", config.model))?;

        let device = ComputeDevice::select(config.device);
        let options = InitOptions::new(model)
            .with_cache_dir(config.cache_dir.clone())
            .with_show_download_progress(false);
        let options = with_device(options, device);

        let embedding = TextEmbedding::try_new(options)
            .with_context(|| format!("Failed to load embedding model '{}'", config.model))?;

        Ok(Self {
            model: Arc::new(Mutex::new(embedding)),
            model_name: config.model.clone(),
            dimension,
            device,
        })
    }

    /// Device the model was loaded for; a CUDA request falls back to CPU
    /// in builds without the `cuda` feature.
    pub fn device(&self) -> ComputeDevice {
        self.device
    }
}

#[cfg(feature = "cuda")]
fn with_device(options: InitOptions, device: ComputeDevice) -> InitOptions {
    use ort::ep::CUDA as CUDAExecutionProvider;

    match device {
        ComputeDevice::Cuda => {
            options.with_execution_providers(vec![CUDAExecutionProvider::default().build()])
        }
        ComputeDevice::Cpu => options,
    }
}

#[cfg(not(feature = "cuda"))]
fn with_device(options: InitOptions, device: ComputeDevice) -> InitOptions {
    if device == ComputeDevice::Cuda {
        tracing::warn!("Accelerator requested but this build has no CUDA support; using cpu");
    }
    options
}

#[async_trait]
impl Embedder for LocalEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn embed_documents(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, ServiceError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let model = Arc::clone(&self.model);
        let vectors = tokio::task::spawn_blocking(move || {
            let mut model = model
                .lock()
                .map_err(|_| ServiceError::Embedding("embedding model lock poisoned".into()))?;
            model.embed(texts, None).map_err(ServiceError::embedding)
        })
        .await
        .map_err(ServiceError::embedding)??;

        check_dimensions(&vectors, self.dimension)?;
        Ok(vectors)
    }
}
