use std::sync::Arc;

use graphmind_workflow::{BackgroundExecutor, FlowManager, TaskManager};

/// Shared state handed to every route handler.
pub struct AppState {
    pub flow: Arc<FlowManager>,
    pub tasks: Arc<TaskManager>,
    pub executor: Arc<BackgroundExecutor>,
}
