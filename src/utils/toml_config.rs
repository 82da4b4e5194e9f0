//! TOML-based configuration for rag-search
//!
//! Everything the CLI needs is declared in one file (`ragsearch.toml`).
//! Every field has a default, so a missing file or a partial file is valid.
//! Secrets are never stored in the file; it names the environment variable
//! that holds them instead.

use crate::llm::client::{DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE, GROQ_API_BASE, GROQ_DEFAULT_MODEL};
use crate::llm::Provider;
use crate::rag::embeddings::{canonical_model_id, Embedder, OpenAIEmbedder};
use crate::rag::search::SearchConfig;
use crate::rag::store::{StoreConfig, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
use crate::types::{AppError, Result as AppResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub const DEFAULT_CONFIG_FILE: &str = "ragsearch.toml";

/// Root configuration structure loaded from ragsearch.toml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagSearchConfig {
    /// Directory scanned by `build` for plain-text documents
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default)]
    pub store: StoreSection,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub retrieval: RetrievalConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

impl Default for RagSearchConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            store: StoreSection::default(),
            embedding: EmbeddingConfig::default(),
            retrieval: RetrievalConfig::default(),
            llm: LlmConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

// ============= Store Configuration =============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSection {
    #[serde(default = "default_persist_dir")]
    pub persist_dir: PathBuf,

    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// File extensions read from `data_dir`
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

fn default_persist_dir() -> PathBuf {
    PathBuf::from("faiss_store")
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_chunk_overlap() -> usize {
    DEFAULT_CHUNK_OVERLAP
}

fn default_extensions() -> Vec<String> {
    crate::rag::loader::DEFAULT_EXTENSIONS
        .iter()
        .map(|e| e.to_string())
        .collect()
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            persist_dir: default_persist_dir(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            extensions: default_extensions(),
        }
    }
}

// ============= Embedding Configuration =============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// In-process ONNX model via fastembed
    Local,
    /// OpenAI-compatible `/embeddings` endpoint
    OpenAI,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_backend")]
    pub backend: EmbeddingBackend,

    #[serde(default = "default_embedding_model")]
    pub model: String,

    #[serde(default = "default_embedding_timeout")]
    pub timeout_secs: u64,

    /// Base URL for the `openai` backend
    #[serde(default = "default_openai_base")]
    pub api_base: String,

    /// Environment variable containing the API key for the `openai` backend
    pub api_key_env: Option<String>,
}

fn default_embedding_backend() -> EmbeddingBackend {
    EmbeddingBackend::Local
}

fn default_embedding_model() -> String {
    "sentence-transformers/all-MiniLM-L6-v2".to_string()
}

fn default_embedding_timeout() -> u64 {
    120
}

fn default_openai_base() -> String {
    "https://api.openai.com/v1".to_string()
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: default_embedding_backend(),
            model: default_embedding_model(),
            timeout_secs: default_embedding_timeout(),
            api_base: default_openai_base(),
            api_key_env: None,
        }
    }
}

// ============= Retrieval Configuration =============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    #[serde(default = "default_llm_timeout")]
    pub llm_timeout_secs: u64,
}

fn default_top_k() -> usize {
    crate::rag::search::DEFAULT_TOP_K
}

fn default_llm_timeout() -> u64 {
    crate::rag::search::DEFAULT_LLM_TIMEOUT.as_secs()
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            llm_timeout_secs: default_llm_timeout(),
        }
    }
}

// ============= LLM Configuration =============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LlmConfig {
    OpenAI {
        /// Environment variable containing API key
        #[serde(default = "default_llm_key_env")]
        api_key_env: String,
        #[serde(default = "default_llm_base")]
        api_base: String,
        #[serde(default = "default_llm_model")]
        model: String,
        #[serde(default = "default_temperature")]
        temperature: f32,
        #[serde(default = "default_max_tokens")]
        max_tokens: u32,
    },
    Ollama {
        #[serde(default = "default_ollama_url")]
        base_url: String,
        model: String,
        #[serde(default = "default_temperature")]
        temperature: f32,
    },
}

fn default_llm_key_env() -> String {
    "GROQ_API".to_string()
}

fn default_llm_base() -> String {
    GROQ_API_BASE.to_string()
}

fn default_llm_model() -> String {
    GROQ_DEFAULT_MODEL.to_string()
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

impl Default for LlmConfig {
    fn default() -> Self {
        LlmConfig::OpenAI {
            api_key_env: default_llm_key_env(),
            api_base: default_llm_base(),
            model: default_llm_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

// ============= Logging Configuration =============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ============= Configuration Loading & Validation =============

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Environment variable '{0}' referenced in config is not set")]
    MissingEnvVar(String),
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Configuration(err.to_string())
    }
}

impl RagSearchConfig {
    /// Load configuration from a TOML file
    ///
    /// Only the structure is checked here. Environment variables are
    /// resolved lazily so that commands which never call the LLM work
    /// without its key.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let config: RagSearchConfig = toml::from_str(&content)?;
        config.validate_structure()?;

        Ok(config)
    }

    /// Like [`load`](Self::load), but a missing file yields the defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        match Self::load(path.as_ref()) {
            Err(ConfigError::FileNotFound(p)) => {
                info!(path = ?p, "No configuration file, using defaults");
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Full validation: structure plus every referenced env var.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_structure()?;

        if let LlmConfig::OpenAI { api_key_env, .. } = &self.llm {
            self.validate_env_var(api_key_env)?;
        }
        if self.embedding.backend == EmbeddingBackend::OpenAI {
            if let Some(ref env) = self.embedding.api_key_env {
                self.validate_env_var(env)?;
            }
        }
        Ok(())
    }

    fn validate_structure(&self) -> Result<(), ConfigError> {
        if self.store.chunk_size == 0 {
            return Err(ConfigError::ValidationError(
                "store.chunk_size must be greater than 0".to_string(),
            ));
        }
        if self.store.chunk_overlap >= self.store.chunk_size {
            return Err(ConfigError::ValidationError(format!(
                "store.chunk_overlap ({}) must be smaller than store.chunk_size ({})",
                self.store.chunk_overlap, self.store.chunk_size
            )));
        }
        if self.retrieval.top_k == 0 {
            return Err(ConfigError::ValidationError(
                "retrieval.top_k must be greater than 0".to_string(),
            ));
        }
        if self.embedding.timeout_secs == 0 || self.retrieval.llm_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "timeouts must be at least one second".to_string(),
            ));
        }
        if self.embedding.model.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "embedding.model must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    fn validate_env_var(&self, name: &str) -> Result<(), ConfigError> {
        std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))?;
        Ok(())
    }

    /// Get a resolved value from an env var reference
    pub fn resolve_env(&self, env_name: &str) -> Option<String> {
        std::env::var(env_name).ok()
    }

    /// Model identifier recorded in, and checked against, the store.
    pub fn embedding_model_id(&self) -> String {
        match self.embedding.backend {
            EmbeddingBackend::Local => canonical_model_id(&self.embedding.model),
            EmbeddingBackend::OpenAI => self.embedding.model.clone(),
        }
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig::new(self.store.persist_dir.clone(), self.embedding_model_id())
            .with_chunking(self.store.chunk_size, self.store.chunk_overlap)
    }

    pub fn search_config(&self) -> SearchConfig {
        SearchConfig {
            top_k: self.retrieval.top_k,
            llm_timeout: Duration::from_secs(self.retrieval.llm_timeout_secs),
        }
    }

    pub fn embed_timeout(&self) -> Duration {
        Duration::from_secs(self.embedding.timeout_secs)
    }

    /// Resolve the `[llm]` section into a provider, reading its API key.
    pub fn llm_provider(&self) -> Result<Provider, ConfigError> {
        match &self.llm {
            LlmConfig::OpenAI {
                api_key_env,
                api_base,
                model,
                temperature,
                max_tokens,
            } => Ok(Provider::OpenAI {
                api_key: self
                    .resolve_env(api_key_env)
                    .ok_or_else(|| ConfigError::MissingEnvVar(api_key_env.clone()))?,
                api_base: api_base.clone(),
                model: model.clone(),
                temperature: *temperature,
                max_tokens: *max_tokens,
            }),
            LlmConfig::Ollama {
                base_url,
                model,
                temperature,
            } => Ok(Provider::Ollama {
                base_url: base_url.clone(),
                model: model.clone(),
                temperature: *temperature,
            }),
        }
    }

    /// Construct the configured embedding backend.
    ///
    /// Loading a local model downloads it on first use.
    pub fn create_embedder(&self) -> AppResult<Arc<dyn Embedder>> {
        match self.embedding.backend {
            EmbeddingBackend::Local => {
                #[cfg(feature = "local-embeddings")]
                {
                    let embedder = crate::rag::embeddings::FastEmbedder::new(&self.embedding.model)?;
                    Ok(Arc::new(embedder))
                }
                #[cfg(not(feature = "local-embeddings"))]
                {
                    Err(AppError::Configuration(
                        "embedding.backend = \"local\" requires the 'local-embeddings' feature"
                            .to_string(),
                    ))
                }
            }
            EmbeddingBackend::OpenAI => {
                let api_key = match self.embedding.api_key_env {
                    Some(ref env) => Some(
                        self.resolve_env(env)
                            .ok_or_else(|| ConfigError::MissingEnvVar(env.clone()))?,
                    ),
                    None => None,
                };
                Ok(Arc::new(OpenAIEmbedder::new(
                    self.embedding.api_base.clone(),
                    api_key,
                    self.embedding.model.clone(),
                )))
            }
        }
    }
}
