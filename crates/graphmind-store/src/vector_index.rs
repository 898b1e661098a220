use std::path::Path;
use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;
use rusqlite::{params, Connection};
use tracing::debug;

use graphmind_core::error::{GraphMindError, Result};
use graphmind_core::traits::{EmbeddingProvider, VectorIndex};
use graphmind_core::types::{Chunk, Metadata};

use crate::embeddings::cosine_similarity;

/// SQLite-backed vector index.
///
/// Chunks are embedded on insert and ranked by cosine similarity on query.
/// Writes by independent workflow instances are serialized by the
/// connection mutex; no cross-instance coordination is needed beyond that.
pub struct SqliteVectorIndex {
    conn: Mutex<Connection>,
    embedder: Arc<dyn EmbeddingProvider>,
}

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS chunks (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        text TEXT NOT NULL,
        metadata TEXT NOT NULL,
        embedding BLOB NOT NULL
    );";

impl SqliteVectorIndex {
    /// Open or create a SQLite database at the given path.
    pub fn open(path: &Path, embedder: Arc<dyn EmbeddingProvider>) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                GraphMindError::Database(format!("Failed to create db directory: {}", e))
            })?;
        }

        let conn =
            Connection::open(path).map_err(|e| GraphMindError::Database(e.to_string()))?;

        // WAL mode for better concurrent read performance
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")
            .map_err(|e| GraphMindError::Database(e.to_string()))?;

        conn.execute_batch(SCHEMA)
            .map_err(|e| GraphMindError::Database(e.to_string()))?;

        debug!(path = %path.display(), "Vector index opened");
        Ok(Self {
            conn: Mutex::new(conn),
            embedder,
        })
    }

    /// Open an in-memory index (for testing).
    pub fn in_memory(embedder: Arc<dyn EmbeddingProvider>) -> Result<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| GraphMindError::Database(e.to_string()))?;
        conn.execute_batch(SCHEMA)
            .map_err(|e| GraphMindError::Database(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
            embedder,
        })
    }
}

fn to_blob(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

fn from_blob(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

impl VectorIndex for SqliteVectorIndex {
    fn add(&self, chunks: &[Chunk]) -> BoxFuture<'_, Result<()>> {
        let chunks = chunks.to_vec();
        Box::pin(async move {
            if chunks.is_empty() {
                return Ok(());
            }

            let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
            let embeddings = self.embedder.embed(&texts).await?;

            if embeddings.len() != chunks.len() {
                return Err(GraphMindError::Index(format!(
                    "Embedder returned {} vectors for {} chunks",
                    embeddings.len(),
                    chunks.len()
                )));
            }

            let conn = self
                .conn
                .lock()
                .map_err(|e| GraphMindError::Database(e.to_string()))?;

            for (chunk, embedding) in chunks.iter().zip(embeddings.iter()) {
                let metadata = serde_json::to_string(&chunk.metadata)?;
                conn.execute(
                    "INSERT INTO chunks (text, metadata, embedding) VALUES (?1, ?2, ?3)",
                    params![chunk.text, metadata, to_blob(embedding)],
                )
                .map_err(|e| GraphMindError::Database(e.to_string()))?;
            }

            debug!(count = chunks.len(), "Chunks indexed");
            Ok(())
        })
    }

    fn query(&self, text: &str, top_k: usize) -> BoxFuture<'_, Result<Vec<Chunk>>> {
        let text = text.to_string();
        Box::pin(async move {
            let query_vec = self
                .embedder
                .embed(std::slice::from_ref(&text))
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| GraphMindError::Embedding("Empty embedding response".into()))?;

            let conn = self
                .conn
                .lock()
                .map_err(|e| GraphMindError::Database(e.to_string()))?;

            let mut stmt = conn
                .prepare("SELECT text, metadata, embedding FROM chunks")
                .map_err(|e| GraphMindError::Database(e.to_string()))?;

            let rows = stmt
                .query_map([], |row| {
                    let text: String = row.get(0)?;
                    let metadata: String = row.get(1)?;
                    let blob: Vec<u8> = row.get(2)?;
                    Ok((text, metadata, blob))
                })
                .map_err(|e| GraphMindError::Database(e.to_string()))?;

            let mut scored: Vec<(f32, Chunk)> = Vec::new();
            for row in rows {
                let (text, metadata, blob) =
                    row.map_err(|e| GraphMindError::Database(e.to_string()))?;
                let sim = cosine_similarity(&query_vec, &from_blob(&blob));
                let metadata: Metadata = serde_json::from_str(&metadata).unwrap_or_default();
                scored.push((sim, Chunk { text, metadata }));
            }

            // Rank by similarity descending
            scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
            scored.truncate(top_k);

            Ok(scored.into_iter().map(|(_, c)| c).collect())
        })
    }

    fn count(&self) -> BoxFuture<'_, Result<usize>> {
        Box::pin(async move {
            let conn = self
                .conn
                .lock()
                .map_err(|e| GraphMindError::Database(e.to_string()))?;
            let count: i64 = conn
                .query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))
                .map_err(|e| GraphMindError::Database(e.to_string()))?;
            Ok(count as usize)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic embedder: maps each text to a 4-dim vector derived from
    /// its first byte, so distinct prefixes land in distinct directions.
    struct StubEmbedder;

    impl EmbeddingProvider for StubEmbedder {
        fn embed(&self, texts: &[String]) -> BoxFuture<'_, Result<Vec<Vec<f32>>>> {
            let vecs = texts
                .iter()
                .map(|t| {
                    let b = t.bytes().next().unwrap_or(0) as f32;
                    vec![b, 1.0, 0.0, 0.0]
                })
                .collect();
            Box::pin(async move { Ok(vecs) })
        }

        fn dimensions(&self) -> usize {
            4
        }
    }

    #[tokio::test]
    async fn test_add_and_query() {
        let index = SqliteVectorIndex::in_memory(Arc::new(StubEmbedder)).unwrap();

        let chunks = vec![Chunk::new("alpha"), Chunk::new("beta")];
        index.add(&chunks).await.unwrap();
        assert_eq!(index.count().await.unwrap(), 2);

        let results = index.query("alpha", 1).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].text, "alpha");
    }

    #[tokio::test]
    async fn test_query_respects_top_k() {
        let index = SqliteVectorIndex::in_memory(Arc::new(StubEmbedder)).unwrap();
        let chunks: Vec<Chunk> = (0..10).map(|i| Chunk::new(format!("chunk {}", i))).collect();
        index.add(&chunks).await.unwrap();

        let results = index.query("chunk", 3).await.unwrap();
        assert_eq!(results.len(), 3);
    }

    #[tokio::test]
    async fn test_metadata_roundtrip() {
        let index = SqliteVectorIndex::in_memory(Arc::new(StubEmbedder)).unwrap();

        let mut chunk = Chunk::new("tagged");
        chunk
            .metadata
            .insert("file_name".into(), serde_json::json!("doc.txt"));
        index.add(std::slice::from_ref(&chunk)).await.unwrap();

        let results = index.query("tagged", 1).await.unwrap();
        assert_eq!(results[0].metadata["file_name"], "doc.txt");
    }
}
