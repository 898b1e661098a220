use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::Value;
use tracing::{debug, info};

use graphmind_core::error::{GraphMindError, Result};
use graphmind_core::traits::TaskStore;
use graphmind_core::types::{Task, TaskStatus};

/// Task lifecycle over a TTL-backed store.
///
/// Updates are read-modify-write; concurrent writers to the same task are
/// last-write-wins, which matches how the store behaves. Every write
/// refreshes the TTL.
pub struct TaskManager {
    store: Arc<dyn TaskStore>,
    ttl_secs: u64,
}

impl TaskManager {
    pub fn new(store: Arc<dyn TaskStore>, ttl_secs: u64) -> Self {
        Self { store, ttl_secs }
    }

    /// Create a pending task, returning its id.
    pub async fn create(&self, request: Value) -> Result<String> {
        let task = Task::new(request);
        self.store.put(&task, self.ttl_secs).await?;
        info!(task_id = %task.task_id, "Task created");
        Ok(task.task_id)
    }

    /// Mark a task as processing with progress reset to zero.
    pub async fn start(&self, task_id: &str) -> Result<()> {
        self.modify(task_id, |task| {
            task.status = TaskStatus::Processing;
            task.progress = 0.0;
            task.message = Some("Processing started".into());
        })
        .await
    }

    /// Record progress on a running task.
    pub async fn update_progress(&self, task_id: &str, progress: f32, note: &str) -> Result<()> {
        self.modify(task_id, |task| {
            task.status = TaskStatus::Processing;
            task.progress = progress.clamp(0.0, 100.0);
            task.message = Some(note.to_string());
        })
        .await
    }

    /// Mark a task as completed with its result payload.
    pub async fn complete(&self, task_id: &str, result: Value) -> Result<()> {
        info!(task_id = %task_id, "Task completed");
        self.modify(task_id, |task| {
            task.status = TaskStatus::Completed;
            task.progress = 100.0;
            task.result = Some(result);
            task.message = Some("Completed".into());
        })
        .await
    }

    /// Mark a task as failed.
    pub async fn fail(&self, task_id: &str, error: &str) -> Result<()> {
        info!(task_id = %task_id, error = %error, "Task failed");
        self.modify(task_id, |task| {
            task.status = TaskStatus::Failed;
            task.error = Some(error.to_string());
            task.message = Some("Failed".into());
        })
        .await
    }

    /// Fetch a task by id.
    pub async fn get(&self, task_id: &str) -> Result<Option<Task>> {
        self.store.get(task_id).await
    }

    /// List all live tasks.
    pub async fn list_all(&self) -> Result<Vec<Task>> {
        self.store.list().await
    }

    /// Delete finished tasks not updated within the last `older_than_hours`.
    /// Returns the number of tasks removed.
    pub async fn cleanup(&self, older_than_hours: i64) -> Result<usize> {
        let cutoff = Utc::now() - Duration::hours(older_than_hours);
        let mut removed = 0;

        for task in self.store.list().await? {
            if task.is_finished() && task.updated_at < cutoff {
                if self.store.delete(&task.task_id).await? {
                    debug!(task_id = %task.task_id, "Cleaned up task");
                    removed += 1;
                }
            }
        }

        if removed > 0 {
            info!(removed, "Task cleanup pass finished");
        }
        Ok(removed)
    }

    async fn modify<F>(&self, task_id: &str, apply: F) -> Result<()>
    where
        F: FnOnce(&mut Task),
    {
        let mut task = self
            .store
            .get(task_id)
            .await?
            .ok_or_else(|| GraphMindError::TaskNotFound(task_id.to_string()))?;
        apply(&mut task);
        task.updated_at = Utc::now();
        self.store.put(&task, self.ttl_secs).await
    }
}
