use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use graphmind_core::error::Result;

use crate::flow::FlowManager;
use crate::tasks::TaskManager;

/// Request payload for a background ingestion task.
///
/// Chunking overrides are recorded with the task for traceability; the
/// pipeline itself chunks with the configured splitter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestRequest {
    pub file_reference: String,
    #[serde(default)]
    pub chunk_size: Option<usize>,
    #[serde(default)]
    pub chunk_overlap: Option<usize>,
}

/// Runs ingestion workflows as background tasks with tracked lifecycle.
pub struct BackgroundExecutor {
    flow: Arc<FlowManager>,
    tasks: Arc<TaskManager>,
}

impl BackgroundExecutor {
    pub fn new(flow: Arc<FlowManager>, tasks: Arc<TaskManager>) -> Self {
        Self { flow, tasks }
    }

    /// Create a task for the request and run the ingestion workflow in the
    /// background, returning the task id immediately.
    pub async fn submit_ingest(&self, request: IngestRequest) -> Result<String> {
        let task_id = self.tasks.create(serde_json::to_value(&request)?).await?;

        let flow = self.flow.clone();
        let tasks = self.tasks.clone();
        let id = task_id.clone();
        tokio::spawn(async move {
            if let Err(e) = tasks.start(&id).await {
                warn!(task_id = %id, error = %e, "Failed to mark task as started");
            }

            match flow.process_document(&request.file_reference).await {
                Ok(outcome) => {
                    let result = serde_json::to_value(&outcome).unwrap_or_default();
                    if let Err(e) = tasks.complete(&id, result).await {
                        error!(task_id = %id, error = %e, "Failed to record task completion");
                    }
                }
                Err(e) => {
                    if let Err(store_err) = tasks.fail(&id, &e.to_string()).await {
                        error!(task_id = %id, error = %store_err, "Failed to record task failure");
                    }
                }
            }
        });

        Ok(task_id)
    }
}

/// Periodically removes stale finished tasks until cancelled.
pub struct TaskSweeper {
    tasks: Arc<TaskManager>,
    interval: Duration,
    older_than_hours: i64,
}

impl TaskSweeper {
    pub fn new(tasks: Arc<TaskManager>, interval: Duration, older_than_hours: i64) -> Self {
        Self {
            tasks,
            interval,
            older_than_hours,
        }
    }

    pub async fn run(self, cancel: CancellationToken) {
        info!(interval_secs = self.interval.as_secs(), "Task sweeper started");
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Task sweeper stopping");
                    return;
                }
                _ = tokio::time::sleep(self.interval) => {
                    match self.tasks.cleanup(self.older_than_hours).await {
                        Ok(removed) if removed > 0 => {
                            info!(removed, "Swept stale tasks");
                        }
                        Ok(_) => {}
                        Err(e) => warn!(error = %e, "Task sweep failed"),
                    }
                }
            }
        }
    }
}
