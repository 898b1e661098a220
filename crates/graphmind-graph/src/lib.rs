pub mod builder;
pub mod extract;
pub mod orchestrator;
pub mod parse;

pub use builder::build_graph;
pub use extract::{EntityExtractor, RelationshipExtractor};
pub use orchestrator::GraphOrchestrator;
pub use parse::parse_or_empty;
