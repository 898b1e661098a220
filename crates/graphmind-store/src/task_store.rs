use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use futures::future::BoxFuture;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use graphmind_core::error::{GraphMindError, Result};
use graphmind_core::traits::TaskStore;
use graphmind_core::types::Task;

/// SQLite-backed task store with per-task TTL.
///
/// Rows are not actively deleted on expiry; `get` and `list` filter expired
/// rows on read, mirroring a KV store's TTL semantics.
pub struct SqliteTaskStore {
    conn: Mutex<Connection>,
}

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS tasks (
        task_id TEXT PRIMARY KEY,
        payload TEXT NOT NULL,
        expires_at TEXT NOT NULL
    );";

impl SqliteTaskStore {
    /// Open or create a SQLite database at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                GraphMindError::Database(format!("Failed to create db directory: {}", e))
            })?;
        }

        let conn =
            Connection::open(path).map_err(|e| GraphMindError::Database(e.to_string()))?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")
            .map_err(|e| GraphMindError::Database(e.to_string()))?;

        conn.execute_batch(SCHEMA)
            .map_err(|e| GraphMindError::Database(e.to_string()))?;

        debug!(path = %path.display(), "Task store opened");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory store (for testing).
    pub fn in_memory() -> Result<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| GraphMindError::Database(e.to_string()))?;
        conn.execute_batch(SCHEMA)
            .map_err(|e| GraphMindError::Database(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

fn parse_expiry(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

impl TaskStore for SqliteTaskStore {
    fn put(&self, task: &Task, ttl_secs: u64) -> BoxFuture<'_, Result<()>> {
        let task_id = task.task_id.clone();
        let payload = serde_json::to_string(task);
        Box::pin(async move {
            let payload = payload?;
            let expires_at = (Utc::now() + Duration::seconds(ttl_secs as i64)).to_rfc3339();

            let conn = self
                .conn
                .lock()
                .map_err(|e| GraphMindError::Database(e.to_string()))?;
            conn.execute(
                "INSERT OR REPLACE INTO tasks (task_id, payload, expires_at) VALUES (?1, ?2, ?3)",
                params![task_id, payload, expires_at],
            )
            .map_err(|e| GraphMindError::Database(e.to_string()))?;
            Ok(())
        })
    }

    fn get(&self, task_id: &str) -> BoxFuture<'_, Result<Option<Task>>> {
        let task_id = task_id.to_string();
        Box::pin(async move {
            let conn = self
                .conn
                .lock()
                .map_err(|e| GraphMindError::Database(e.to_string()))?;

            let row: Option<(String, String)> = conn
                .query_row(
                    "SELECT payload, expires_at FROM tasks WHERE task_id = ?1",
                    params![task_id],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()
                .map_err(|e| GraphMindError::Database(e.to_string()))?;

            let Some((payload, expires_at)) = row else {
                return Ok(None);
            };

            // Expired rows are unreadable, not deleted
            if parse_expiry(&expires_at) < Utc::now() {
                return Ok(None);
            }

            let task: Task = serde_json::from_str(&payload)?;
            Ok(Some(task))
        })
    }

    fn delete(&self, task_id: &str) -> BoxFuture<'_, Result<bool>> {
        let task_id = task_id.to_string();
        Box::pin(async move {
            let conn = self
                .conn
                .lock()
                .map_err(|e| GraphMindError::Database(e.to_string()))?;
            let removed = conn
                .execute("DELETE FROM tasks WHERE task_id = ?1", params![task_id])
                .map_err(|e| GraphMindError::Database(e.to_string()))?;
            Ok(removed > 0)
        })
    }

    fn list(&self) -> BoxFuture<'_, Result<Vec<Task>>> {
        Box::pin(async move {
            let conn = self
                .conn
                .lock()
                .map_err(|e| GraphMindError::Database(e.to_string()))?;

            let mut stmt = conn
                .prepare("SELECT payload, expires_at FROM tasks")
                .map_err(|e| GraphMindError::Database(e.to_string()))?;

            let rows = stmt
                .query_map([], |row| {
                    let payload: String = row.get(0)?;
                    let expires_at: String = row.get(1)?;
                    Ok((payload, expires_at))
                })
                .map_err(|e| GraphMindError::Database(e.to_string()))?;

            let now = Utc::now();
            let mut tasks = Vec::new();
            for row in rows {
                let (payload, expires_at) =
                    row.map_err(|e| GraphMindError::Database(e.to_string()))?;
                if parse_expiry(&expires_at) < now {
                    continue;
                }
                tasks.push(serde_json::from_str(&payload)?);
            }

            Ok(tasks)
        })
    }
}
