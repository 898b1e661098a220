use std::path::{Path, PathBuf};

use futures::future::BoxFuture;
use tracing::debug;

use graphmind_core::error::{GraphMindError, Result};
use graphmind_core::traits::BlobStore;

/// Filesystem-backed blob store.
///
/// Keys are paths: absolute keys are used verbatim, relative keys resolve
/// under the store root.
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, key: &str) -> PathBuf {
        let path = Path::new(key);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

impl BlobStore for FsBlobStore {
    fn get(&self, key: &str) -> BoxFuture<'_, Result<Vec<u8>>> {
        let path = self.resolve(key);
        Box::pin(async move {
            if !path.is_file() {
                return Err(GraphMindError::Storage(format!(
                    "File not found: {}",
                    path.display()
                )));
            }
            tokio::fs::read(&path)
                .await
                .map_err(|e| GraphMindError::Storage(format!("{}: {}", path.display(), e)))
        })
    }

    fn put(&self, key: &str, bytes: &[u8]) -> BoxFuture<'_, Result<String>> {
        let path = self.resolve(key);
        let bytes = bytes.to_vec();
        Box::pin(async move {
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| GraphMindError::Storage(e.to_string()))?;
            }
            tokio::fs::write(&path, &bytes)
                .await
                .map_err(|e| GraphMindError::Storage(format!("{}: {}", path.display(), e)))?;
            debug!(path = %path.display(), size = bytes.len(), "Blob stored");
            Ok(path.display().to_string())
        })
    }
}
