use std::path::Path;
use std::sync::Arc;

use tracing::info;

use graphmind_core::error::{GraphMindError, Result};
use graphmind_core::traits::BlobStore;
use graphmind_core::types::{Metadata, SourceDocument};

/// Extensions read as UTF-8 text.
const SUPPORTED_EXTENSIONS: &[&str] = &["txt", "md", "markdown"];

/// Loads documents from a blob store and stamps provenance metadata.
pub struct DocumentLoader {
    blob: Arc<dyn BlobStore>,
    max_file_size: usize,
}

impl DocumentLoader {
    pub fn new(blob: Arc<dyn BlobStore>, max_file_size: usize) -> Self {
        Self {
            blob,
            max_file_size,
        }
    }

    /// Load a document by its reference (path or storage key).
    ///
    /// Every returned document carries file metadata: name, source
    /// reference, size in bytes, and extension.
    pub async fn load(&self, file_reference: &str) -> Result<Vec<SourceDocument>> {
        let file_type = extension_of(file_reference);
        if !SUPPORTED_EXTENSIONS.contains(&file_type.as_str()) {
            return Err(GraphMindError::Ingest(format!(
                "Unsupported file type: '{}' (supported: {})",
                file_type,
                SUPPORTED_EXTENSIONS.join(", ")
            )));
        }

        let bytes = self.blob.get(file_reference).await?;

        if bytes.len() > self.max_file_size {
            return Err(GraphMindError::Ingest(format!(
                "File too large: {} bytes (max: {})",
                bytes.len(),
                self.max_file_size
            )));
        }

        let text = String::from_utf8_lossy(&bytes).into_owned();
        let metadata = file_metadata(file_reference, bytes.len());

        info!(file_reference, size = bytes.len(), "Document loaded");
        Ok(vec![SourceDocument::with_metadata(text, metadata)])
    }
}

fn extension_of(file_reference: &str) -> String {
    Path::new(file_reference)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

fn file_metadata(file_reference: &str, size: usize) -> Metadata {
    let file_name = Path::new(file_reference)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_reference.to_string());
    let file_type = extension_of(file_reference);

    let mut metadata = Metadata::new();
    metadata.insert("file_name".into(), serde_json::json!(file_name));
    metadata.insert("source".into(), serde_json::json!(file_reference));
    metadata.insert("file_size".into(), serde_json::json!(size));
    metadata.insert("file_type".into(), serde_json::json!(file_type));
    metadata
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphmind_store::FsBlobStore;

    #[tokio::test]
    async fn test_load_stamps_metadata() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("doc.txt"), "some content").unwrap();

        let loader = DocumentLoader::new(Arc::new(FsBlobStore::new(dir.path())), 1024);
        let docs = loader.load("doc.txt").await.unwrap();

        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].text, "some content");
        assert_eq!(docs[0].metadata["file_name"], "doc.txt");
        assert_eq!(docs[0].metadata["file_type"], "txt");
        assert_eq!(docs[0].metadata["file_size"], 12);
    }

    #[tokio::test]
    async fn test_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let loader = DocumentLoader::new(Arc::new(FsBlobStore::new(dir.path())), 1024);

        let err = loader.load("missing.txt").await.unwrap_err();
        assert!(err.to_string().contains("File not found"));
    }

    #[tokio::test]
    async fn test_unsupported_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("report.pdf"), "binary").unwrap();

        let loader = DocumentLoader::new(Arc::new(FsBlobStore::new(dir.path())), 1024);
        let err = loader.load("report.pdf").await.unwrap_err();
        assert!(err.to_string().contains("Unsupported file type"));
    }

    #[tokio::test]
    async fn test_oversized_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("big.txt"), "x".repeat(100)).unwrap();

        let loader = DocumentLoader::new(Arc::new(FsBlobStore::new(dir.path())), 10);
        let err = loader.load("big.txt").await.unwrap_err();
        assert!(err.to_string().contains("File too large"));
    }
}
