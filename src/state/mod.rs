use std::sync::Arc;

use crate::core::config::Settings;
use crate::rag::{build_pipeline, RagPipeline};

pub mod error;

use error::InitializationError;

/// Shared by every handler. Both fields are read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub pipeline: Arc<RagPipeline>,
}

impl AppState {
    pub fn new(settings: Settings, pipeline: RagPipeline) -> Arc<Self> {
        Arc::new(Self {
            settings: Arc::new(settings),
            pipeline: Arc::new(pipeline),
        })
    }

    /// Loads the embedding model and wires the remote index and LLM.
    pub async fn initialize(settings: Settings) -> Result<Arc<Self>, InitializationError> {
        let pipeline = build_pipeline(&settings)
            .await
            .map_err(InitializationError::Pipeline)?;
        Ok(Self::new(settings, pipeline))
    }
}
