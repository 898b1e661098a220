use serde::Serialize;
use tracing::info;

use graphmind_core::error::{GraphMindError, Result};
use graphmind_core::types::{Entity, KnowledgeGraph, Relationship};

use crate::engine::WorkflowEngine;
use crate::state::WorkflowState;

/// Result of a query run.
#[derive(Debug, Serialize)]
pub struct QueryOutcome {
    pub summary: Option<String>,
    pub knowledge_graph: Option<KnowledgeGraph>,
    pub entities: Vec<Entity>,
    pub relationships: Vec<Relationship>,
    pub final_step: String,
}

/// Result of an ingestion-only run.
#[derive(Debug, Serialize)]
pub struct IngestOutcome {
    pub documents_processed: usize,
    pub chunks_created: usize,
    pub final_step: String,
}

/// High-level entry points over the workflow engine.
///
/// Validates inputs, builds the initial state, runs the engine, and turns
/// an error-terminated run into a `Workflow` error.
pub struct FlowManager {
    engine: WorkflowEngine,
}

impl FlowManager {
    pub fn new(engine: WorkflowEngine) -> Self {
        Self { engine }
    }

    /// Answer a query, optionally ingesting a document first.
    pub async fn process_query(
        &self,
        query: &str,
        file_reference: Option<&str>,
    ) -> Result<QueryOutcome> {
        if query.trim().is_empty() {
            return Err(GraphMindError::Validation("Query cannot be empty".into()));
        }

        let mut initial = WorkflowState::for_query(query);
        initial.file_reference = file_reference.map(String::from);

        info!(query = %query, has_file = file_reference.is_some(), "Starting query workflow");
        let final_state = self.engine.run(initial).await;

        if let Some(error) = final_state.error {
            return Err(GraphMindError::Workflow(error));
        }

        Ok(QueryOutcome {
            summary: final_state.summary,
            knowledge_graph: final_state.knowledge_graph,
            entities: final_state.entities.unwrap_or_default(),
            relationships: final_state.relationships.unwrap_or_default(),
            final_step: final_state.current_step.to_string(),
        })
    }

    /// Ingest a document into the index without answering anything.
    pub async fn process_document(&self, file_reference: &str) -> Result<IngestOutcome> {
        if file_reference.trim().is_empty() {
            return Err(GraphMindError::Validation(
                "File reference cannot be empty".into(),
            ));
        }

        info!(file_reference = %file_reference, "Starting ingestion workflow");
        let final_state = self.engine.run(WorkflowState::for_document(file_reference)).await;

        if let Some(error) = final_state.error {
            return Err(GraphMindError::Workflow(error));
        }

        Ok(IngestOutcome {
            documents_processed: final_state.documents.map_or(0, |d| d.len()),
            chunks_created: final_state.chunks.map_or(0, |c| c.len()),
            final_step: final_state.current_step.to_string(),
        })
    }

    /// Run an arbitrary pre-built state to completion.
    pub async fn run(&self, initial: WorkflowState) -> WorkflowState {
        self.engine.run(initial).await
    }
}
