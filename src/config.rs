use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::models::GLOBAL_SCOPE;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub db: DbConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct DbConfig {
    /// Connection string; falls back to the `POSTGRES_URL` environment
    /// variable when unset.
    #[serde(default)]
    pub url: Option<String>,
}

impl DbConfig {
    pub fn connection_string(&self) -> Result<String> {
        if let Some(url) = &self.url {
            return Ok(url.clone());
        }
        std::env::var("POSTGRES_URL")
            .map_err(|_| anyhow::anyhow!("Database connection string is not set ([db] url or POSTGRES_URL)"))
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

fn default_chunk_size() -> usize {
    500
}
fn default_chunk_overlap() -> usize {
    50
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: i64,
    #[serde(default = "default_max_context_chars")]
    pub max_context_chars: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            max_context_chars: default_max_context_chars(),
        }
    }
}

fn default_top_k() -> i64 {
    5
}
fn default_max_context_chars() -> usize {
    1800
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_dims")]
    pub dims: usize,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            dims: default_dims(),
            batch_size: default_batch_size(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_provider() -> String {
    "openai".to_string()
}
fn default_model() -> String {
    "text-embedding-3-small".to_string()
}
fn default_dims() -> usize {
    1536
}
fn default_batch_size() -> usize {
    64
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SourcesConfig {
    #[serde(default)]
    pub roots: Vec<SourceRoot>,
}

/// One document tree to ingest, with the persona scope its chunks belong to.
#[derive(Debug, Deserialize, Clone)]
pub struct SourceRoot {
    pub path: PathBuf,
    /// Persona ids that own this tree, or `["ALL"]` for global knowledge.
    #[serde(default = "default_personas")]
    pub personas: Vec<String>,
}

fn default_personas() -> Vec<String> {
    vec![GLOBAL_SCOPE.to_string()]
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // Validate chunking
    if config.chunking.chunk_size == 0 {
        anyhow::bail!("chunking.chunk_size must be > 0");
    }
    if config.chunking.chunk_overlap >= config.chunking.chunk_size {
        anyhow::bail!("chunking.chunk_overlap must be < chunking.chunk_size");
    }

    // Validate retrieval
    if config.retrieval.top_k < 1 {
        anyhow::bail!("retrieval.top_k must be >= 1");
    }
    if config.retrieval.max_context_chars == 0 {
        anyhow::bail!("retrieval.max_context_chars must be > 0");
    }

    // Validate embedding
    if config.embedding.dims == 0 {
        anyhow::bail!("embedding.dims must be > 0");
    }
    match config.embedding.provider.as_str() {
        "disabled" | "openai" => {}
        other => anyhow::bail!(
            "Unknown embedding provider: '{}'. Must be disabled or openai.",
            other
        ),
    }

    // Validate sources
    for root in &config.sources.roots {
        if root.personas.is_empty() {
            anyhow::bail!(
                "sources root '{}' must name at least one persona (or \"{}\")",
                root.path.display(),
                GLOBAL_SCOPE
            );
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(body: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(body.as_bytes()).unwrap();
        f
    }

    #[test]
    fn test_defaults() {
        let f = write_config("");
        let cfg = load_config(f.path()).unwrap();
        assert_eq!(cfg.chunking.chunk_size, 500);
        assert_eq!(cfg.chunking.chunk_overlap, 50);
        assert_eq!(cfg.retrieval.top_k, 5);
        assert_eq!(cfg.retrieval.max_context_chars, 1800);
        assert_eq!(cfg.embedding.dims, 1536);
        assert!(cfg.sources.roots.is_empty());
    }

    #[test]
    fn test_overlap_must_be_below_chunk_size() {
        let f = write_config("[chunking]\nchunk_size = 100\nchunk_overlap = 100\n");
        assert!(load_config(f.path()).is_err());
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let f = write_config("[embedding]\nprovider = \"cohere\"\n");
        assert!(load_config(f.path()).is_err());
    }

    #[test]
    fn test_source_root_defaults_to_global_scope() {
        let f = write_config("[[sources.roots]]\npath = \"data/global\"\n");
        let cfg = load_config(f.path()).unwrap();
        assert_eq!(cfg.sources.roots[0].personas, vec![GLOBAL_SCOPE.to_string()]);
    }

    #[test]
    fn test_source_root_with_personas() {
        let f = write_config(
            "[[sources.roots]]\npath = \"data/personas/nutri\"\npersonas = [\"nutri\"]\n",
        );
        let cfg = load_config(f.path()).unwrap();
        assert_eq!(cfg.sources.roots[0].personas, vec!["nutri".to_string()]);
    }
}
