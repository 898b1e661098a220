use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use tracing::{info, warn};

use graphmind_workflow::IngestRequest;

use crate::state::AppState;

// GET /api/health
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[derive(Deserialize)]
pub struct QueryBody {
    pub query: String,
    #[serde(default)]
    pub file_reference: Option<String>,
}

// POST /api/query — run the full pipeline and answer synchronously;
// a failed run is a 500
pub async fn run_query(
    State(state): State<Arc<AppState>>,
    Json(body): Json<QueryBody>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    if body.query.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let started = std::time::Instant::now();
    match state
        .flow
        .process_query(&body.query, body.file_reference.as_deref())
        .await
    {
        Ok(outcome) => Ok(Json(serde_json::json!({
            "summary": outcome.summary,
            "knowledge_graph": outcome.knowledge_graph,
            "entities": outcome.entities,
            "relationships": outcome.relationships,
            "final_step": outcome.final_step,
            "processing_time_secs": started.elapsed().as_secs_f64(),
        }))),
        Err(e) => {
            warn!(error = %e, "Query workflow failed");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

#[derive(Deserialize)]
pub struct ProcessDocumentBody {
    pub file_reference: String,
    #[serde(default)]
    pub chunk_size: Option<usize>,
    #[serde(default)]
    pub chunk_overlap: Option<usize>,
    #[serde(default = "default_background")]
    pub process_in_background: bool,
}

fn default_background() -> bool {
    true
}

// POST /api/documents/process — ingest a document, by default as a
// background task whose id is returned immediately
pub async fn process_document(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ProcessDocumentBody>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    if body.file_reference.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    if body.process_in_background {
        let request = IngestRequest {
            file_reference: body.file_reference,
            chunk_size: body.chunk_size,
            chunk_overlap: body.chunk_overlap,
        };
        match state.executor.submit_ingest(request).await {
            Ok(task_id) => {
                info!(task_id = %task_id, "Background ingestion submitted");
                Ok(Json(serde_json::json!({
                    "task_id": task_id,
                    "status": "pending",
                })))
            }
            Err(e) => {
                warn!(error = %e, "Failed to submit ingestion task");
                Err(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    } else {
        match state.flow.process_document(&body.file_reference).await {
            Ok(outcome) => Ok(Json(serde_json::json!({
                "documents_processed": outcome.documents_processed,
                "chunks_created": outcome.chunks_created,
                "final_step": outcome.final_step,
            }))),
            Err(e) => {
                warn!(error = %e, "Ingestion workflow failed");
                Err(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }
}

// GET /api/tasks
pub async fn list_tasks(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    match state.tasks.list_all().await {
        Ok(tasks) => Ok(Json(serde_json::json!({
            "total": tasks.len(),
            "tasks": tasks,
        }))),
        Err(e) => {
            warn!(error = %e, "Failed to list tasks");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

// GET /api/tasks/:id — 404 for unknown or expired ids
pub async fn get_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    match state.tasks.get(&id).await {
        Ok(Some(task)) => Ok(Json(serde_json::to_value(task).map_err(|_| {
            StatusCode::INTERNAL_SERVER_ERROR
        })?)),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            warn!(error = %e, "Failed to fetch task");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

#[derive(Deserialize)]
pub struct CleanupBody {
    #[serde(default = "default_cleanup_hours")]
    pub older_than_hours: i64,
}

fn default_cleanup_hours() -> i64 {
    24
}

// POST /api/tasks/cleanup
pub async fn cleanup_tasks(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CleanupBody>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    match state.tasks.cleanup(body.older_than_hours).await {
        Ok(removed) => Ok(Json(serde_json::json!({ "removed": removed }))),
        Err(e) => {
            warn!(error = %e, "Task cleanup failed");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
