use std::fmt;

use crate::state::{WorkflowState, WorkflowStep};

/// A runnable pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ProcessDocuments,
    RetrieveContext,
    GenerateGraph,
    GenerateSummary,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::ProcessDocuments => "process_documents",
            Stage::RetrieveContext => "retrieve_context",
            Stage::GenerateGraph => "generate_knowledge_graph",
            Stage::GenerateSummary => "generate_summary",
        };
        f.write_str(name)
    }
}

/// Routing decision for the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Routing {
    Stage(Stage),
    Error,
    End,
}

/// Decide the next stage from the current state.
///
/// Rules are checked in order; an error short-circuits everything else.
/// For a fresh state, ingestion inputs take precedence over the query so
/// that a combined run indexes the document before retrieval.
pub fn decide_next_step(state: &WorkflowState) -> Routing {
    if state.error.is_some() {
        return Routing::Error;
    }

    match state.current_step {
        WorkflowStep::Initializing => {
            if state.file_reference.is_some() || state.documents.is_some() {
                Routing::Stage(Stage::ProcessDocuments)
            } else if state.query.is_some() {
                Routing::Stage(Stage::RetrieveContext)
            } else {
                Routing::End
            }
        }
        WorkflowStep::DocumentsProcessed => {
            if state.query.is_some() {
                Routing::Stage(Stage::RetrieveContext)
            } else {
                Routing::End
            }
        }
        WorkflowStep::ContextRetrieved => Routing::Stage(Stage::GenerateGraph),
        WorkflowStep::KnowledgeGraphGenerated => Routing::Stage(Stage::GenerateSummary),
        WorkflowStep::SummaryGenerated | WorkflowStep::Error => Routing::End,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_state_ends() {
        assert_eq!(decide_next_step(&WorkflowState::new()), Routing::End);
    }

    #[test]
    fn test_error_takes_precedence() {
        let state = WorkflowState::for_query("q").failed("boom");
        assert_eq!(decide_next_step(&state), Routing::Error);

        // error set but step not yet advanced still routes to error
        let state = WorkflowState {
            error: Some("boom".into()),
            query: Some("q".into()),
            ..WorkflowState::default()
        };
        assert_eq!(decide_next_step(&state), Routing::Error);
    }

    #[test]
    fn test_ingestion_before_retrieval() {
        let state = WorkflowState {
            query: Some("q".into()),
            file_reference: Some("doc.txt".into()),
            ..WorkflowState::default()
        };
        assert_eq!(
            decide_next_step(&state),
            Routing::Stage(Stage::ProcessDocuments)
        );
    }

    #[test]
    fn test_query_only_goes_straight_to_retrieval() {
        let state = WorkflowState::for_query("q");
        assert_eq!(
            decide_next_step(&state),
            Routing::Stage(Stage::RetrieveContext)
        );
    }

    #[test]
    fn test_document_only_ends_after_ingestion() {
        let state = WorkflowState {
            file_reference: Some("doc.txt".into()),
            current_step: WorkflowStep::DocumentsProcessed,
            ..WorkflowState::default()
        };
        assert_eq!(decide_next_step(&state), Routing::End);
    }

    #[test]
    fn test_linear_tail_of_the_pipeline() {
        let mut state = WorkflowState::for_query("q");

        state.current_step = WorkflowStep::ContextRetrieved;
        assert_eq!(
            decide_next_step(&state),
            Routing::Stage(Stage::GenerateGraph)
        );

        state.current_step = WorkflowStep::KnowledgeGraphGenerated;
        assert_eq!(
            decide_next_step(&state),
            Routing::Stage(Stage::GenerateSummary)
        );

        state.current_step = WorkflowStep::SummaryGenerated;
        assert_eq!(decide_next_step(&state), Routing::End);
    }
}
