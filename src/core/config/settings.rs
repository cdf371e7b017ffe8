use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::validation::validate_settings;
use crate::core::errors::ConfigError;
use crate::embeddings::ComputeDevice;

const REDACT_PLACEHOLDER: &str = "****";

pub const PINECONE_API_KEY: &str = "PINECONE_API_KEY";
pub const HUGGINGFACEHUB_API_TOKEN: &str = "HUGGINGFACEHUB_API_TOKEN";
pub const PINECONE_ENVIRONMENT: &str = "PINECONE_ENVIRONMENT";
pub const PORT: &str = "PORT";
pub const BACKEND_URL: &str = "BACKEND_URL";
pub const CONFIG_PATH: &str = "MEDBOT_CONFIG_PATH";
pub const EMBEDDING_DEVICE: &str = "MEDBOT_EMBEDDING_DEVICE";

const DEFAULT_REGION: &str = "us-east-1";

/// Credential wrapper that never prints its value.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACT_PLACEHOLDER)
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACT_PLACEHOLDER)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    pub max_question_length: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            cors_allowed_origins: Vec::new(),
            max_question_length: 4000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Cosine,
    Euclidean,
    Dotproduct,
}

impl Metric {
    pub fn as_str(self) -> &'static str {
        match self {
            Metric::Cosine => "cosine",
            Metric::Euclidean => "euclidean",
            Metric::Dotproduct => "dotproduct",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub name: String,
    pub dimension: usize,
    pub metric: Metric,
    pub cloud: String,
    pub control_plane_url: String,
    pub namespace: String,
    pub upsert_batch_size: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            name: "medical-chatbot".to_string(),
            dimension: 384,
            metric: Metric::Cosine,
            cloud: "aws".to_string(),
            control_plane_url: "https://api.pinecone.io".to_string(),
            namespace: String::new(),
            upsert_batch_size: 100,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 3 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub data_dir: PathBuf,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub embed_batch_size: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            chunk_size: 500,
            chunk_overlap: 20,
            embed_batch_size: 32,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub model: String,
    pub cache_dir: PathBuf,
    pub device: Option<ComputeDevice>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
            cache_dir: PathBuf::from(".fastembed_cache"),
            device: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProviderKind {
    Huggingface,
    Ollama,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptStyle {
    /// System message carries the rendered template, the question goes in a user message.
    Chat,
    /// The rendered template is sent as a single user message.
    Completion,
}

/// LLM section as written in the YAML file; unset fields take provider defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct LlmFileConfig {
    provider: Option<LlmProviderKind>,
    model: Option<String>,
    temperature: Option<f64>,
    base_url: Option<String>,
    prompt_style: Option<PromptStyle>,
    timeout_secs: Option<u64>,
    max_tokens: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub provider: LlmProviderKind,
    pub model: String,
    pub temperature: f64,
    pub base_url: String,
    pub prompt_style: PromptStyle,
    pub timeout_secs: u64,
    /// Answer length cap; unset leaves it to the provider.
    pub max_tokens: Option<u32>,
}

impl LlmFileConfig {
    fn resolve(self) -> LlmConfig {
        let provider = self.provider.unwrap_or(LlmProviderKind::Huggingface);
        let (model, temperature, base_url, prompt_style) = match provider {
            LlmProviderKind::Huggingface => (
                "openai/gpt-oss-120b",
                0.7,
                "https://router.huggingface.co",
                PromptStyle::Chat,
            ),
            LlmProviderKind::Ollama => (
                "tinyllama",
                0.3,
                "http://localhost:11434",
                PromptStyle::Completion,
            ),
        };
        LlmConfig {
            provider,
            model: self.model.unwrap_or_else(|| model.to_string()),
            temperature: self.temperature.unwrap_or(temperature),
            base_url: self.base_url.unwrap_or_else(|| base_url.to_string()),
            prompt_style: self.prompt_style.unwrap_or(prompt_style),
            timeout_secs: self.timeout_secs.unwrap_or(120),
            max_tokens: self.max_tokens,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub dir: PathBuf,
    pub file: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("logs"),
            file: "medbot.log".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    server: ServerConfig,
    index: IndexConfig,
    retrieval: RetrievalConfig,
    ingest: IngestConfig,
    embedding: EmbeddingConfig,
    llm: LlmFileConfig,
    logging: LoggingConfig,
}

impl FileConfig {
    /// Reads the optional YAML file. A missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&contents, path)
    }

    fn parse(contents: &str, path: &Path) -> Result<Self, ConfigError> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }
}

/// Process-wide configuration, built once at startup and passed into every
/// component constructor.
#[derive(Debug, Clone)]
pub struct Settings {
    pub pinecone_api_key: Secret,
    pub huggingface_api_token: Secret,
    pub pinecone_environment: String,
    pub version: &'static str,
    pub server: ServerConfig,
    pub index: IndexConfig,
    pub retrieval: RetrievalConfig,
    pub ingest: IngestConfig,
    pub embedding: EmbeddingConfig,
    pub llm: LlmConfig,
    pub logging: LoggingConfig,
}

impl Settings {
    /// Loads `.env`, the optional YAML file and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        load_dotenv();
        let file = FileConfig::load(&config_path())?;
        Self::from_sources(file, |key| env::var(key).ok())
    }

    pub fn from_sources<F>(file: FileConfig, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .map(Secret::new)
                .ok_or(ConfigError::MissingEnv(key))
        };

        let pinecone_api_key = required(PINECONE_API_KEY)?;
        let huggingface_api_token = required(HUGGINGFACEHUB_API_TOKEN)?;
        let pinecone_environment = lookup(PINECONE_ENVIRONMENT)
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_REGION.to_string());

        let mut server = file.server;
        if let Some(raw) = lookup(PORT) {
            server.port = raw.trim().parse::<u16>().map_err(|_| ConfigError::Invalid {
                field: "PORT",
                reason: format!("'{}' is not a valid port", raw),
            })?;
        }

        let mut embedding = file.embedding;
        if let Some(raw) = lookup(EMBEDDING_DEVICE) {
            embedding.device = Some(raw.parse().map_err(|reason| ConfigError::Invalid {
                field: EMBEDDING_DEVICE,
                reason,
            })?);
        }

        let settings = Settings {
            pinecone_api_key,
            huggingface_api_token,
            pinecone_environment,
            version: "1.0",
            server,
            index: file.index,
            retrieval: file.retrieval,
            ingest: file.ingest,
            embedding,
            llm: file.llm.resolve(),
            logging: file.logging,
        };

        validate_settings(&settings)?;
        Ok(settings)
    }
}

/// Loads `.env` from the working directory, overriding existing variables.
pub fn load_dotenv() {
    match dotenvy::dotenv_override() {
        Ok(path) => tracing::debug!("Loaded environment from {}", path.display()),
        Err(err) if err.not_found() => {}
        Err(err) => tracing::warn!("Failed to load .env: {}", err),
    }
}

pub fn config_path() -> PathBuf {
    if let Ok(path) = env::var(CONFIG_PATH) {
        return PathBuf::from(path);
    }
    PathBuf::from("config.yml")
}
