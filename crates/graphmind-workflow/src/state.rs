use std::fmt;

use serde::{Deserialize, Serialize};

use graphmind_core::types::{Chunk, Entity, KnowledgeGraph, Relationship, SourceDocument};

/// Pipeline phase recorded in the workflow state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStep {
    Initializing,
    DocumentsProcessed,
    ContextRetrieved,
    KnowledgeGraphGenerated,
    SummaryGenerated,
    Error,
}

impl fmt::Display for WorkflowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkflowStep::Initializing => "initializing",
            WorkflowStep::DocumentsProcessed => "documents_processed",
            WorkflowStep::ContextRetrieved => "context_retrieved",
            WorkflowStep::KnowledgeGraphGenerated => "knowledge_graph_generated",
            WorkflowStep::SummaryGenerated => "summary_generated",
            WorkflowStep::Error => "error",
        };
        f.write_str(name)
    }
}

/// Accumulated state threaded through the workflow stages.
///
/// Stages take the state by value and return an updated copy; they only
/// ever add fields and advance `current_step`, or set `error` and move to
/// [`WorkflowStep::Error`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowState {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub file_reference: Option<String>,
    #[serde(default)]
    pub documents: Option<Vec<SourceDocument>>,
    #[serde(default)]
    pub chunks: Option<Vec<Chunk>>,
    #[serde(default)]
    pub relevant_chunks: Option<Vec<Chunk>>,
    #[serde(default)]
    pub combined_context: Option<String>,
    #[serde(default)]
    pub entities: Option<Vec<Entity>>,
    #[serde(default)]
    pub relationships: Option<Vec<Relationship>>,
    #[serde(default)]
    pub knowledge_graph: Option<KnowledgeGraph>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default = "initial_step")]
    pub current_step: WorkflowStep,
}

fn initial_step() -> WorkflowStep {
    WorkflowStep::Initializing
}

impl Default for WorkflowState {
    fn default() -> Self {
        Self {
            query: None,
            file_reference: None,
            documents: None,
            chunks: None,
            relevant_chunks: None,
            combined_context: None,
            entities: None,
            relationships: None,
            knowledge_graph: None,
            summary: None,
            error: None,
            current_step: WorkflowStep::Initializing,
        }
    }
}

impl WorkflowState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_query(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
            ..Self::default()
        }
    }

    pub fn for_document(file_reference: impl Into<String>) -> Self {
        Self {
            file_reference: Some(file_reference.into()),
            ..Self::default()
        }
    }

    /// Record a stage failure and switch to the error step.
    pub fn failed(self, message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            current_step: WorkflowStep::Error,
            ..self
        }
    }
}
