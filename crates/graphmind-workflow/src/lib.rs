//! Workflow orchestration for GraphMind.
//!
//! A run is a loop over a routing function and four stages: document
//! processing, context retrieval, knowledge graph generation, and summary
//! generation. State accumulates across stages; any stage failure parks
//! the run in a terminal error state. Long-running ingestions execute as
//! tracked background tasks with a TTL-backed store.

pub mod background;
pub mod engine;
pub mod flow;
pub mod router;
pub mod stages;
pub mod state;
pub mod tasks;

pub use background::{BackgroundExecutor, IngestRequest, TaskSweeper};
pub use engine::WorkflowEngine;
pub use flow::{FlowManager, IngestOutcome, QueryOutcome};
pub use router::{decide_next_step, Routing, Stage};
pub use stages::StageSet;
pub use state::{WorkflowState, WorkflowStep};
pub use tasks::TaskManager;
