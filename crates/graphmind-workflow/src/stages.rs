use std::sync::Arc;

use tracing::{debug, info};

use graphmind_core::config::ModelConfig;
use graphmind_core::error::Result;
use graphmind_core::traits::{CompletionClient, VectorIndex};
use graphmind_core::types::{Chunk, KnowledgeGraph, SourceDocument};
use graphmind_graph::GraphOrchestrator;
use graphmind_ingest::{DocumentLoader, RecursiveCharacterSplitter};

use crate::state::{WorkflowState, WorkflowStep};

const SUMMARY_SYSTEM_PROMPT: &str = "You are a helpful research assistant. Create a comprehensive summary that directly answers the user's query using the provided context.";

/// The four pipeline stages and their shared collaborators.
///
/// Each stage consumes the state and returns an updated copy; collaborator
/// failures are folded into the state as a stage-labelled error message
/// instead of propagating.
pub struct StageSet {
    loader: DocumentLoader,
    splitter: RecursiveCharacterSplitter,
    index: Arc<dyn VectorIndex>,
    llm: Arc<dyn CompletionClient>,
    model: ModelConfig,
    orchestrator: GraphOrchestrator,
    top_k: usize,
}

impl StageSet {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        loader: DocumentLoader,
        splitter: RecursiveCharacterSplitter,
        index: Arc<dyn VectorIndex>,
        llm: Arc<dyn CompletionClient>,
        model: ModelConfig,
        orchestrator: GraphOrchestrator,
        top_k: usize,
    ) -> Self {
        Self {
            loader,
            splitter,
            index,
            llm,
            model,
            orchestrator,
            top_k,
        }
    }

    /// Load (if needed), chunk, and index the input documents.
    ///
    /// Pre-loaded `documents` skip the loader but are still chunked and
    /// indexed, so the stage always advances the step when it has input.
    pub async fn process_documents(&self, state: WorkflowState) -> WorkflowState {
        match self.ingest(&state).await {
            Ok(Some((documents, chunks))) => {
                info!(
                    documents = documents.len(),
                    chunks = chunks.len(),
                    "Documents processed"
                );
                WorkflowState {
                    documents: Some(documents),
                    chunks: Some(chunks),
                    current_step: WorkflowStep::DocumentsProcessed,
                    ..state
                }
            }
            Ok(None) => state,
            Err(e) => state.failed(format!("Document processing failed: {}", e)),
        }
    }

    async fn ingest(
        &self,
        state: &WorkflowState,
    ) -> Result<Option<(Vec<SourceDocument>, Vec<Chunk>)>> {
        let documents = if let Some(file_reference) = &state.file_reference {
            debug!(file_reference = %file_reference, "Loading document");
            self.loader.load(file_reference).await?
        } else if let Some(documents) = &state.documents {
            documents.clone()
        } else {
            return Ok(None);
        };

        let chunks = self.splitter.split_documents(&documents);
        self.index.add(&chunks).await?;
        Ok(Some((documents, chunks)))
    }

    /// Retrieve the chunks most relevant to the query and join them into
    /// a single context string.
    pub async fn retrieve_context(&self, state: WorkflowState) -> WorkflowState {
        let Some(query) = state.query.clone() else {
            return state;
        };

        match self.index.query(&query, self.top_k).await {
            Ok(relevant) => {
                let combined = relevant
                    .iter()
                    .map(|c| c.text.as_str())
                    .collect::<Vec<_>>()
                    .join("\n\n");
                info!(chunks = relevant.len(), "Context retrieved");
                WorkflowState {
                    relevant_chunks: Some(relevant),
                    combined_context: Some(combined),
                    current_step: WorkflowStep::ContextRetrieved,
                    ..state
                }
            }
            Err(e) => state.failed(format!("Context retrieval failed: {}", e)),
        }
    }

    /// Extract entities and relationships from the retrieved context and
    /// assemble the knowledge graph.
    pub async fn generate_graph(&self, state: WorkflowState) -> WorkflowState {
        let context = state.combined_context.clone().unwrap_or_default();
        if context.trim().is_empty() {
            // Nothing retrieved: the step still completes, with an empty graph.
            info!("No context available, producing empty knowledge graph");
            return WorkflowState {
                entities: Some(Vec::new()),
                relationships: Some(Vec::new()),
                knowledge_graph: Some(KnowledgeGraph::default()),
                current_step: WorkflowStep::KnowledgeGraphGenerated,
                ..state
            };
        }

        match self.orchestrator.build_from_text(&context).await {
            Ok(graph) => {
                info!(
                    entities = graph.entities.len(),
                    relationships = graph.relationships.len(),
                    "Knowledge graph generated"
                );
                WorkflowState {
                    entities: Some(graph.entities.clone()),
                    relationships: Some(graph.relationships.clone()),
                    knowledge_graph: Some(graph),
                    current_step: WorkflowStep::KnowledgeGraphGenerated,
                    ..state
                }
            }
            Err(e) => state.failed(format!("Knowledge graph generation failed: {}", e)),
        }
    }

    /// Produce the final summary answering the query from the context.
    pub async fn generate_summary(&self, state: WorkflowState) -> WorkflowState {
        let (Some(query), Some(context)) = (state.query.clone(), state.combined_context.clone())
        else {
            return state;
        };

        let user_prompt = format!(
            "Query: {}\n\nContext: {}\n\nPlease provide a detailed summary that addresses the query:",
            query, context
        );

        match self
            .llm
            .complete(&self.model, SUMMARY_SYSTEM_PROMPT, &user_prompt)
            .await
        {
            Ok(summary) => {
                info!(chars = summary.len(), "Summary generated");
                WorkflowState {
                    summary: Some(summary),
                    current_step: WorkflowStep::SummaryGenerated,
                    ..state
                }
            }
            Err(e) => state.failed(format!("Summary generation failed: {}", e)),
        }
    }
}
