pub mod blob;
pub mod embeddings;
pub mod task_store;
pub mod vector_index;

pub use blob::FsBlobStore;
pub use embeddings::{cosine_similarity, HttpEmbeddingProvider};
pub use task_store::SqliteTaskStore;
pub use vector_index::SqliteVectorIndex;
