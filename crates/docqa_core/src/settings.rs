use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::chunker::ChunkerConfig;
use crate::error::AppError;

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    200
}

fn default_min_chunk_len() -> usize {
    50
}

fn default_top_k() -> usize {
    5
}

fn default_embedding_model() -> String {
    "nomic-embed-text".to_string()
}

fn default_generative_model() -> String {
    "llama3.2".to_string()
}

fn default_ollama_url() -> String {
    "http://127.0.0.1:11434".to_string()
}

fn default_domain_label() -> String {
    "the documentation corpus".to_string()
}

/// Runtime configuration. Every field has a default so an empty TOML file
/// (or none at all) yields a working setup; the CLI layers flag overrides on
/// top.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
    #[serde(default = "default_min_chunk_len")]
    pub min_chunk_len: usize,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default = "default_generative_model")]
    pub generative_model: String,
    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,
    /// Names the corpus inside the grounding prompt ("Context about <label>:").
    #[serde(default = "default_domain_label")]
    pub domain_label: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            min_chunk_len: default_min_chunk_len(),
            top_k: default_top_k(),
            embedding_model: default_embedding_model(),
            generative_model: default_generative_model(),
            ollama_url: default_ollama_url(),
            domain_label: default_domain_label(),
        }
    }
}

impl Settings {
    pub fn load_from_toml(path: &Path) -> Result<Self, AppError> {
        let raw = fs::read_to_string(path).map_err(|e| {
            AppError::new("SETTINGS_READ_FAILED", "Failed to read settings file")
                .with_details(format!("path={}; err={}", path.display(), e))
        })?;
        toml::from_str(&raw).map_err(|e| {
            AppError::new("SETTINGS_PARSE_FAILED", "Failed to parse settings file")
                .with_details(format!("path={}; err={}", path.display(), e))
        })
    }

    /// Where acquisition drops raw documents.
    pub fn docs_dir(&self) -> PathBuf {
        self.data_dir.join("docs")
    }

    pub fn chunker_config(&self) -> Result<ChunkerConfig, AppError> {
        ChunkerConfig::new(self.chunk_size, self.chunk_overlap, self.min_chunk_len)
    }
}
