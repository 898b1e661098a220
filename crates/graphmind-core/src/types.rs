use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Free-form metadata attached to documents and chunks.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// A raw loaded document: text plus provenance metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDocument {
    pub text: String,
    #[serde(default)]
    pub metadata: Metadata,
}

impl SourceDocument {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: Metadata::new(),
        }
    }

    pub fn with_metadata(text: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            text: text.into(),
            metadata,
        }
    }
}

/// A contiguous slice of a document, sized for retrieval and embedding.
/// Inherits its parent document's metadata plus a chunk index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Chunk {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: Metadata::new(),
        }
    }
}

fn default_confidence() -> f64 {
    0.5
}

/// An LLM-extracted entity. Name uniqueness is not enforced at this layer;
/// duplicates from the model pass through.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Entity {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
}

impl Entity {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            description: String::new(),
            confidence: default_confidence(),
        }
    }

    /// Derived node id: `lowercase(type) + ":" + lowercase(name)` with
    /// spaces replaced by underscores.
    pub fn node_id(&self) -> String {
        format!(
            "{}:{}",
            self.kind.to_lowercase(),
            self.name.to_lowercase().replace(' ', "_")
        )
    }
}

/// An LLM-extracted relationship. Source and target reference entity names
/// by string, not by id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Relationship {
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
}

/// Basic structural metrics over the built graph.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GraphMetrics {
    pub num_nodes: usize,
    pub num_edges: usize,
    pub density: f64,
    pub connected_entities: usize,
    pub isolated_entities: usize,
}

/// A node in the visualization payload, keyed by derived node id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VisNode {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub confidence: f64,
}

/// An edge in the visualization payload, endpoints are derived node ids.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VisEdge {
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub confidence: f64,
}

/// Frontend-facing visualization payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GraphVisualization {
    pub nodes: Vec<VisNode>,
    pub edges: Vec<VisEdge>,
}

/// Consolidated output of graph building.
///
/// `relationships` holds only the kept edges: a relationship whose source or
/// target name has no matching entity is dropped during building.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct KnowledgeGraph {
    pub entities: Vec<Entity>,
    pub relationships: Vec<Relationship>,
    pub metrics: GraphMetrics,
    pub visualization: GraphVisualization,
}

// ── Tasks ────────────────────────────────────────────────────────

/// Lifecycle status of a background task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Processing => "processing",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// A durable record tracking one asynchronous workflow invocation.
///
/// Each task has exactly one producer; concurrent writers to the same
/// `task_id` are not part of the design and last write wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub task_id: String,
    pub status: TaskStatus,
    pub progress: f32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub request: serde_json::Value,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Task {
    /// Create a fresh pending task with a v4 uuid id.
    pub fn new(request: serde_json::Value) -> Self {
        let now = Utc::now();
        Self {
            task_id: uuid::Uuid::new_v4().to_string(),
            status: TaskStatus::Pending,
            progress: 0.0,
            created_at: now,
            updated_at: now,
            request,
            result: None,
            error: None,
            message: None,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.status, TaskStatus::Completed | TaskStatus::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_derivation() {
        let e = Entity::new("Marie Curie", "PERSON");
        assert_eq!(e.node_id(), "person:marie_curie");
    }

    #[test]
    fn test_entity_defaults_from_json() {
        let e: Entity = serde_json::from_str(r#"{"name": "Rust", "type": "TECHNOLOGY"}"#).unwrap();
        assert_eq!(e.description, "");
        assert!((e.confidence - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_task_starts_pending() {
        let task = Task::new(serde_json::json!({"file_reference": "doc.txt"}));
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.progress, 0.0);
        assert!(!task.is_finished());
    }

    #[test]
    fn test_task_status_serialization() {
        let json = serde_json::to_string(&TaskStatus::Processing).unwrap();
        assert_eq!(json, r#""processing""#);
    }
}
