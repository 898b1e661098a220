use futures::future::BoxFuture;

use crate::config::ModelConfig;
use crate::error::Result;
use crate::types::{Chunk, Task};

/// LLM completion service — prompt in, raw text out.
///
/// The returned text may be malformed JSON; callers must tolerate this.
pub trait CompletionClient: Send + Sync + 'static {
    /// Send a system prompt + user prompt and receive the completion text.
    fn complete(
        &self,
        config: &ModelConfig,
        system_prompt: &str,
        user_prompt: &str,
    ) -> BoxFuture<'_, Result<String>>;
}

/// Embedding provider (OpenAI-compatible APIs).
pub trait EmbeddingProvider: Send + Sync + 'static {
    /// Embed a batch of texts into vectors.
    fn embed(&self, texts: &[String]) -> BoxFuture<'_, Result<Vec<Vec<f32>>>>;

    /// Number of dimensions in the embedding vectors.
    fn dimensions(&self) -> usize;
}

/// Vector index — stores chunks and retrieves the nearest ones for a query.
///
/// Safe for concurrent use by independent workflow instances; instances
/// never share a key so no cross-instance locking is required.
pub trait VectorIndex: Send + Sync + 'static {
    /// Add chunks to the index.
    fn add(&self, chunks: &[Chunk]) -> BoxFuture<'_, Result<()>>;

    /// Return the `top_k` chunks most relevant to `text`, ranked.
    fn query(&self, text: &str, top_k: usize) -> BoxFuture<'_, Result<Vec<Chunk>>>;

    /// Number of chunks currently indexed.
    fn count(&self) -> BoxFuture<'_, Result<usize>>;
}

/// Object storage — byte blobs by key.
pub trait BlobStore: Send + Sync + 'static {
    /// Fetch a blob by key.
    fn get(&self, key: &str) -> BoxFuture<'_, Result<Vec<u8>>>;

    /// Store a blob under a key, returning its locator.
    fn put(&self, key: &str, bytes: &[u8]) -> BoxFuture<'_, Result<String>>;
}

/// Durable task store with per-task TTL.
///
/// Expired entries become unreadable rather than actively deleted; `get`
/// and `list` filter them on read.
pub trait TaskStore: Send + Sync + 'static {
    /// Write a task with a TTL in seconds (insert or replace).
    fn put(&self, task: &Task, ttl_secs: u64) -> BoxFuture<'_, Result<()>>;

    /// Read a task by id. Returns `None` for unknown or expired ids.
    fn get(&self, task_id: &str) -> BoxFuture<'_, Result<Option<Task>>>;

    /// Delete a task, returning whether a row was removed.
    fn delete(&self, task_id: &str) -> BoxFuture<'_, Result<bool>>;

    /// List all unexpired tasks.
    fn list(&self) -> BoxFuture<'_, Result<Vec<Task>>>;
}
