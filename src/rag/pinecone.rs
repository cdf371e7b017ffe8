//! Pinecone-backed vector index.
//!
//! Control plane (`/indexes`) lives on the global API host; upserts and
//! queries go to the per-index data-plane host reported by `describe`.
//! Chunk text and source are stored as metadata under `text` / `source`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::OnceCell;

use super::store::{IndexSpec, IndexedChunk, ScoredChunk, VectorIndex};
use crate::core::config::{Secret, Settings};
use crate::core::errors::ServiceError;

const API_VERSION: &str = "2024-07";
const TEXT_KEY: &str = "text";
const SOURCE_KEY: &str = "source";

#[derive(Debug, Clone, Deserialize)]
struct IndexDescription {
    dimension: usize,
    host: String,
    #[serde(default)]
    status: IndexStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct IndexStatus {
    #[serde(default)]
    ready: bool,
    #[serde(default)]
    state: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertResponse {
    #[serde(default)]
    upserted_count: usize,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Debug, Deserialize)]
struct QueryMatch {
    id: String,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: Option<serde_json::Map<String, Value>>,
}

/// Client bound to one named index.
pub struct PineconeIndex {
    client: Client,
    api_key: Secret,
    control_plane_url: String,
    index_name: String,
    namespace: String,
    upsert_batch_size: usize,
    ready_attempts: u32,
    ready_interval: Duration,
    host: OnceCell<String>,
}

impl PineconeIndex {
    pub fn new(settings: &Settings) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_default();
        Self {
            client,
            api_key: settings.pinecone_api_key.clone(),
            control_plane_url: settings
                .index
                .control_plane_url
                .trim_end_matches('/')
                .to_string(),
            index_name: settings.index.name.clone(),
            namespace: settings.index.namespace.clone(),
            upsert_batch_size: settings.index.upsert_batch_size,
            ready_attempts: 60,
            ready_interval: Duration::from_secs(2),
            host: OnceCell::new(),
        }
    }

    /// How long `ensure_index` waits for a freshly created index.
    pub fn with_ready_polling(mut self, attempts: u32, interval: Duration) -> Self {
        self.ready_attempts = attempts.max(1);
        self.ready_interval = interval;
        self
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("Api-Key", self.api_key.expose())
            .header("X-Pinecone-API-Version", API_VERSION)
    }

    async fn describe(&self, name: &str) -> Result<Option<IndexDescription>, ServiceError> {
        let url = format!("{}/indexes/{}", self.control_plane_url, name);
        let res = self
            .authorized(self.client.get(&url))
            .send()
            .await
            .map_err(ServiceError::index)?;

        if res.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let res = ensure_success(res, "describe index").await?;
        let description = res.json().await.map_err(ServiceError::index)?;
        Ok(Some(description))
    }

    async fn create(&self, spec: &IndexSpec) -> Result<bool, ServiceError> {
        let url = format!("{}/indexes", self.control_plane_url);
        let body = json!({
            "name": spec.name,
            "dimension": spec.dimension,
            "metric": spec.metric.as_str(),
            "spec": {
                "serverless": {
                    "cloud": spec.cloud,
                    "region": spec.region,
                }
            }
        });

        let res = self
            .authorized(self.client.post(&url))
            .json(&body)
            .send()
            .await
            .map_err(ServiceError::index)?;

        // Someone else created it between our check and this call.
        if res.status() == StatusCode::CONFLICT {
            return Ok(false);
        }
        ensure_success(res, "create index").await?;
        Ok(true)
    }

    async fn wait_until_ready(&self, name: &str) -> Result<IndexDescription, ServiceError> {
        let mut last_state = String::new();
        for attempt in 0..self.ready_attempts {
            if let Some(description) = self.describe(name).await? {
                if description.status.ready {
                    return Ok(description);
                }
                last_state = description.status.state.clone();
            }
            if attempt + 1 < self.ready_attempts {
                tokio::time::sleep(self.ready_interval).await;
            }
        }
        Err(ServiceError::VectorIndex(format!(
            "index '{}' not ready after {} checks (state: {})",
            name,
            self.ready_attempts,
            if last_state.is_empty() { "unknown" } else { last_state.as_str() }
        )))
    }

    async fn data_plane_url(&self, path: &str) -> Result<String, ServiceError> {
        let host = self
            .host
            .get_or_try_init(|| async {
                self.describe(&self.index_name)
                    .await?
                    .map(|description| normalize_host(&description.host))
                    .ok_or_else(|| {
                        ServiceError::VectorIndex(format!(
                            "index '{}' does not exist",
                            self.index_name
                        ))
                    })
            })
            .await?;
        Ok(format!("{}{}", host, path))
    }
}

fn normalize_host(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}

async fn ensure_success(res: Response, action: &str) -> Result<Response, ServiceError> {
    if res.status().is_success() {
        return Ok(res);
    }
    let status = res.status();
    let text = res.text().await.unwrap_or_default();
    Err(ServiceError::VectorIndex(format!(
        "{} failed with {}: {}",
        action, status, text
    )))
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    async fn ensure_index(&self, spec: &IndexSpec) -> Result<bool, ServiceError> {
        if spec.name != self.index_name {
            return Err(ServiceError::VectorIndex(format!(
                "client is bound to index '{}', not '{}'",
                self.index_name, spec.name
            )));
        }

        let (created, description) = match self.describe(&spec.name).await? {
            Some(existing) if existing.status.ready => {
                tracing::info!("Index '{}' already exists", spec.name);
                (false, existing)
            }
            Some(_) => {
                // Left behind by a run that gave up waiting.
                tracing::info!("Index '{}' exists but is not ready yet", spec.name);
                (false, self.wait_until_ready(&spec.name).await?)
            }
            None => {
                tracing::info!(
                    "Creating index '{}' ({} dims, {}, {}/{})",
                    spec.name,
                    spec.dimension,
                    spec.metric.as_str(),
                    spec.cloud,
                    spec.region
                );
                let created = self.create(spec).await?;
                (created, self.wait_until_ready(&spec.name).await?)
            }
        };

        if description.dimension != spec.dimension {
            return Err(ServiceError::DimensionMismatch {
                expected: spec.dimension,
                actual: description.dimension,
            });
        }

        let _ = self.host.set(normalize_host(&description.host));
        Ok(created)
    }

    async fn upsert(&self, entries: Vec<IndexedChunk>) -> Result<usize, ServiceError> {
        let url = self.data_plane_url("/vectors/upsert").await?;
        let mut written = 0;

        for batch in entries.chunks(self.upsert_batch_size) {
            let vectors: Vec<Value> = batch
                .iter()
                .map(|entry| {
                    json!({
                        "id": entry.id,
                        "values": entry.values,
                        "metadata": {
                            TEXT_KEY: entry.text,
                            SOURCE_KEY: entry.source,
                        },
                    })
                })
                .collect();

            let res = self
                .authorized(self.client.post(&url))
                .json(&json!({ "vectors": vectors, "namespace": self.namespace }))
                .send()
                .await
                .map_err(ServiceError::index)?;
            let res = ensure_success(res, "upsert").await?;
            let payload: UpsertResponse = res.json().await.map_err(ServiceError::index)?;
            written += payload.upserted_count;
            tracing::debug!("Upserted batch of {} ({} total)", batch.len(), written);
        }

        Ok(written)
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<ScoredChunk>, ServiceError> {
        let url = self.data_plane_url("/query").await?;
        let body = json!({
            "vector": vector,
            "topK": top_k,
            "includeMetadata": true,
            "includeValues": false,
            "namespace": self.namespace,
        });

        let res = self
            .authorized(self.client.post(&url))
            .json(&body)
            .send()
            .await
            .map_err(ServiceError::index)?;
        let res = ensure_success(res, "query").await?;
        let payload: QueryResponse = res.json().await.map_err(ServiceError::index)?;

        Ok(payload
            .matches
            .into_iter()
            .map(|m| {
                let metadata = m.metadata.unwrap_or_default();
                ScoredChunk {
                    id: m.id,
                    text: metadata
                        .get(TEXT_KEY)
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                    source: metadata
                        .get(SOURCE_KEY)
                        .and_then(Value::as_str)
                        .map(str::to_string),
                    score: m.score,
                }
            })
            .collect())
    }
}
