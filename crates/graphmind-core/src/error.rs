use thiserror::Error;

#[derive(Debug, Error)]
pub enum GraphMindError {
    // LLM errors
    #[error("Completion request failed: {0}")]
    Completion(String),

    #[error("Embedding request failed: {0}")]
    Embedding(String),

    // Retrieval errors
    #[error("Vector index error: {0}")]
    Index(String),

    // Storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Database error: {0}")]
    Database(String),

    // Task errors
    #[error("Task error: {0}")]
    Task(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    // Ingestion errors
    #[error("Ingest error: {0}")]
    Ingest(String),

    // Workflow errors
    #[error("Workflow failed: {0}")]
    Workflow(String),

    // Input validation
    #[error("Validation error: {0}")]
    Validation(String),

    // Config errors
    #[error("Config error: {0}")]
    Config(String),

    #[error("Config file not found: {0}")]
    ConfigNotFound(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GraphMindError>;
