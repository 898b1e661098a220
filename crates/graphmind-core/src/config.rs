use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{GraphMindError, Result};

/// Top-level GraphMind configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub model: ModelConfig,
    #[serde(default)]
    pub fallback_models: Vec<ModelConfig>,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub tasks: TaskConfig,
    #[serde(default)]
    pub gateway: Option<GatewayConfig>,
}

/// LLM model configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    pub model_id: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Request timeout at the collaborator boundary.
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub retry: Option<RetryConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_ms: u64,
    #[serde(default = "default_max_backoff")]
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff(),
            max_backoff_ms: default_max_backoff(),
        }
    }
}

/// Embedding provider configuration (any OpenAI-compatible API).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Provider name: "openai", "ollama", or any OpenAI-compatible API.
    #[serde(default = "default_embedding_provider")]
    pub provider: String,
    /// Model name (e.g., "text-embedding-3-small", "nomic-embed-text").
    #[serde(default = "default_embedding_model")]
    pub model: String,
    /// Base URL for the embedding API (e.g., "http://localhost:11434/v1").
    #[serde(default)]
    pub base_url: Option<String>,
    /// API key (optional, for cloud providers).
    #[serde(default)]
    pub api_key: Option<String>,
    /// Embedding dimensions (default: 1536).
    #[serde(default = "default_embedding_dims")]
    pub dimensions: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            model: default_embedding_model(),
            base_url: None,
            api_key: None,
            dimensions: default_embedding_dims(),
        }
    }
}

/// Document ingestion configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
    /// Maximum file size in bytes (default: 50 MB).
    #[serde(default = "default_max_file_size")]
    pub max_file_size: usize,
    /// Directory for the vector index database and blob storage.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            max_file_size: default_max_file_size(),
            data_dir: default_data_dir(),
        }
    }
}

/// Knowledge graph extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Maximum characters of context sent to extraction prompts.
    #[serde(default = "default_max_text_length")]
    pub max_text_length: usize,
    /// Number of chunks retrieved per query.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            max_text_length: default_max_text_length(),
            top_k: default_top_k(),
        }
    }
}

/// Background task lifecycle configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskConfig {
    /// TTL for task records in seconds (default: 1 hour).
    #[serde(default = "default_task_ttl")]
    pub ttl_secs: u64,
    /// Interval between cleanup sweeps in seconds (default: 30 min).
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
    /// Completed/failed tasks older than this many hours are swept.
    #[serde(default = "default_cleanup_after")]
    pub cleanup_after_hours: i64,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_task_ttl(),
            sweep_interval_secs: default_sweep_interval(),
            cleanup_after_hours: default_cleanup_after(),
        }
    }
}

/// HTTP gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_provider() -> String {
    "gemini".to_string()
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_temperature() -> f32 {
    0.0
}

fn default_llm_timeout() -> u64 {
    120
}

fn default_max_retries() -> u32 {
    3
}

fn default_initial_backoff() -> u64 {
    1000
}

fn default_max_backoff() -> u64 {
    30_000
}

fn default_embedding_provider() -> String {
    "openai".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_embedding_dims() -> usize {
    1536
}

fn default_chunk_size() -> usize {
    500
}

fn default_chunk_overlap() -> usize {
    200
}

fn default_max_file_size() -> usize {
    50 * 1024 * 1024
}

fn default_data_dir() -> String {
    "./data".to_string()
}

fn default_max_text_length() -> usize {
    4000
}

fn default_top_k() -> usize {
    5
}

fn default_task_ttl() -> u64 {
    3600
}

fn default_sweep_interval() -> u64 {
    1800
}

fn default_cleanup_after() -> i64 {
    24
}

fn default_bind() -> String {
    "127.0.0.1:8000".to_string()
}

impl AppConfig {
    /// Load config from a TOML file, with env var expansion.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|_| GraphMindError::ConfigNotFound(path.display().to_string()))?;

        // Expand ${ENV_VAR} references
        let expanded = expand_env_vars(&content);

        toml::from_str(&expanded).map_err(|e| GraphMindError::Config(e.to_string()))
    }

    /// Resolve the data directory (expand ~).
    pub fn data_dir(&self) -> PathBuf {
        let dir = &self.ingest.data_dir;
        if let Some(rest) = dir.strip_prefix("~/") {
            if let Some(home) = std::env::var_os("HOME") {
                return PathBuf::from(home).join(rest);
            }
        }
        PathBuf::from(dir)
    }
}

/// Expand `${ENV_VAR}` references in a config string. Unset vars are left as-is.
fn expand_env_vars(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '$' && chars.peek() == Some(&'{') {
            chars.next(); // consume '{'
            let mut var_name = String::new();
            for c in chars.by_ref() {
                if c == '}' {
                    break;
                }
                var_name.push(c);
            }
            match std::env::var(&var_name) {
                Ok(val) => result.push_str(&val),
                Err(_) => {
                    result.push_str(&format!("${{{}}}", var_name));
                }
            }
        } else {
            result.push(c);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config() {
        let toml = r#"
            [model]
            model_id = "gemini-2.0-flash"
        "#;
        let config: AppConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.model.provider, "gemini");
        assert_eq!(config.model.max_tokens, 4096);
        assert_eq!(config.ingest.chunk_size, 500);
        assert_eq!(config.ingest.chunk_overlap, 200);
        assert_eq!(config.graph.top_k, 5);
        assert_eq!(config.tasks.ttl_secs, 3600);
        assert!(config.gateway.is_none());
    }

    #[test]
    fn test_expand_env_vars() {
        std::env::set_var("GRAPHMIND_TEST_KEY", "secret123");
        let expanded = expand_env_vars("api_key = \"${GRAPHMIND_TEST_KEY}\"");
        assert_eq!(expanded, "api_key = \"secret123\"");

        // Unset vars stay as-is
        let expanded = expand_env_vars("api_key = \"${GRAPHMIND_UNSET_VAR}\"");
        assert_eq!(expanded, "api_key = \"${GRAPHMIND_UNSET_VAR}\"");
    }

    #[test]
    fn test_gateway_defaults() {
        let toml = r#"
            [model]
            model_id = "gpt-4o-mini"
            provider = "openai"

            [gateway]
        "#;
        let config: AppConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.gateway.unwrap().bind, "127.0.0.1:8000");
    }
}
