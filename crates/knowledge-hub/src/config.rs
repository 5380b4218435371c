//! Configuration for the knowledge hub

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Main knowledge hub configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HubConfig {
    /// On-disk layout of collections
    #[serde(default)]
    pub storage: StorageConfig,
    /// Text chunking configuration
    #[serde(default)]
    pub chunking: ChunkingConfig,
    /// Retrieval policy defaults
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    /// Ollama embedding service
    #[serde(default)]
    pub ollama: OllamaConfig,
}

impl HubConfig {
    /// Load configuration from a TOML file and validate it
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Cannot read config {}: {}", path.display(), e))
        })?;
        let config: HubConfig = toml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the given file, or the default location when it exists, or defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => match Self::default_path() {
                Some(path) if path.is_file() => Self::load(path),
                _ => Ok(Self::default()),
            },
        }
    }

    /// `<config dir>/knowledge-hub/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("knowledge-hub").join("config.toml"))
    }

    /// Reject settings the pipeline cannot honor
    pub fn validate(&self) -> Result<()> {
        self.chunking.validate()?;

        if self.retrieval.num_retrieve == 0 {
            return Err(Error::config("retrieval.num_retrieve must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.retrieval.score_threshold) {
            return Err(Error::config(format!(
                "retrieval.score_threshold must be within [0, 1], got {}",
                self.retrieval.score_threshold
            )));
        }
        if self.storage.content_prefix.is_empty() {
            return Err(Error::config("storage.content_prefix must not be empty"));
        }
        Ok(())
    }
}

/// Storage layout configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory holding one subdirectory per client
    #[serde(default = "default_base_directory")]
    pub base_directory: PathBuf,
    /// Prefix of every persisted vector index directory
    #[serde(default = "default_content_prefix")]
    pub content_prefix: String,
    /// File name of the per-client record log
    #[serde(default = "default_record_file")]
    pub record_file: String,
}

fn default_base_directory() -> PathBuf {
    PathBuf::from("./resources")
}

fn default_content_prefix() -> String {
    "chroma_db_".to_string()
}

fn default_record_file() -> String {
    "injest_records.json".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_directory: default_base_directory(),
            content_prefix: default_content_prefix(),
            record_file: default_record_file(),
        }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkingConfig {
    /// Maximum chunk size in characters; 0 disables splitting
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Characters shared between consecutive chunks
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

fn default_chunk_size() -> usize {
    2048
}

fn default_chunk_overlap() -> usize {
    64
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

impl ChunkingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size > 0 && self.chunk_overlap >= self.chunk_size {
            return Err(Error::config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

/// Retrieval policy defaults
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Number of chunks requested from similarity search
    #[serde(default = "default_num_retrieve")]
    pub num_retrieve: usize,
    /// Minimum relevance score a match must reach
    #[serde(default = "default_score_threshold")]
    pub score_threshold: f32,
}

fn default_num_retrieve() -> usize {
    30
}

fn default_score_threshold() -> f32 {
    0.3
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            num_retrieve: default_num_retrieve(),
            score_threshold: default_score_threshold(),
        }
    }
}

/// Ollama embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Ollama base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Embedding model name
    #[serde(default = "default_embed_model")]
    pub embed_model: String,
    /// Embedding dimensions (768 for nomic-embed-text)
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Number of retries for failed requests
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_embed_model() -> String {
    "nomic-embed-text".to_string()
}

fn default_dimensions() -> usize {
    768
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_max_retries() -> u32 {
    2
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            embed_model: default_embed_model(),
            dimensions: default_dimensions(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

/// Identifier of the local client namespace, `user@host`.
///
/// Falls back to `local` when the host name cannot be read.
pub fn client_id() -> String {
    match whoami::fallible::hostname() {
        Ok(host) if !host.trim().is_empty() => format!("{}@{}", whoami::username(), host),
        Ok(_) => "local".to_string(),
        Err(e) => {
            tracing::warn!("Cannot read host name, using 'local' client id: {}", e);
            "local".to_string()
        }
    }
}
