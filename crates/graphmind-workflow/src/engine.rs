use tracing::{debug, error, info, warn};

use crate::router::{decide_next_step, Routing, Stage};
use crate::stages::StageSet;
use crate::state::WorkflowState;

/// Drives a workflow state to completion.
///
/// Loops route-then-dispatch until the router returns end or error. Stages
/// either advance `current_step` or set `error`, so the loop is finite; a
/// stage that does neither is treated as stuck and the run ends.
pub struct WorkflowEngine {
    stages: StageSet,
}

impl WorkflowEngine {
    pub fn new(stages: StageSet) -> Self {
        Self { stages }
    }

    pub async fn run(&self, initial: WorkflowState) -> WorkflowState {
        let mut state = initial;
        loop {
            match decide_next_step(&state) {
                Routing::End => {
                    debug!(step = %state.current_step, "Workflow complete");
                    return state;
                }
                Routing::Error => {
                    error!(
                        error = state.error.as_deref().unwrap_or("unknown"),
                        "Workflow failed"
                    );
                    return state;
                }
                Routing::Stage(stage) => {
                    info!(stage = %stage, "Executing workflow stage");
                    let before = state.current_step;
                    state = match stage {
                        Stage::ProcessDocuments => self.stages.process_documents(state).await,
                        Stage::RetrieveContext => self.stages.retrieve_context(state).await,
                        Stage::GenerateGraph => self.stages.generate_graph(state).await,
                        Stage::GenerateSummary => self.stages.generate_summary(state).await,
                    };
                    if state.current_step == before && state.error.is_none() {
                        warn!(stage = %stage, "Stage made no progress, ending workflow");
                        return state;
                    }
                }
            }
        }
    }
}
