use std::sync::Arc;

use tracing::debug;

use graphmind_core::config::ModelConfig;
use graphmind_core::error::{GraphMindError, Result};
use graphmind_core::traits::CompletionClient;
use graphmind_core::types::KnowledgeGraph;

use crate::builder::build_graph;
use crate::extract::{EntityExtractor, RelationshipExtractor};

/// Runs the two sequential extraction calls and builds the graph record.
///
/// Collaborator failures propagate as errors and are converted to a single
/// wrapped error at the workflow stage boundary; malformed model output
/// degrades to empty extraction results inside the extractors.
pub struct GraphOrchestrator {
    entities: EntityExtractor,
    relationships: RelationshipExtractor,
}

impl GraphOrchestrator {
    pub fn new(llm: Arc<dyn CompletionClient>, model: ModelConfig, max_text_len: usize) -> Self {
        Self {
            entities: EntityExtractor::new(llm.clone(), model.clone(), max_text_len),
            relationships: RelationshipExtractor::new(llm, model, max_text_len),
        }
    }

    /// Build a knowledge graph from raw text.
    pub async fn build_from_text(&self, text: &str) -> Result<KnowledgeGraph> {
        if text.trim().is_empty() {
            return Err(GraphMindError::Validation("Text cannot be empty".into()));
        }

        let entities = self.entities.extract(text).await?;
        let relationships = self.relationships.extract(text, &entities).await?;

        debug!(
            entities = entities.len(),
            relationships = relationships.len(),
            "Building knowledge graph"
        );
        Ok(build_graph(entities, relationships))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::BoxFuture;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Completion client that replays a fixed sequence of responses.
    struct ScriptedClient {
        responses: Mutex<VecDeque<String>>,
    }

    impl ScriptedClient {
        fn new(responses: Vec<&str>) -> Self {
            Self {
                responses: Mutex::new(responses.into_iter().map(String::from).collect()),
            }
        }
    }

    impl CompletionClient for ScriptedClient {
        fn complete(
            &self,
            _config: &ModelConfig,
            _system_prompt: &str,
            _user_prompt: &str,
        ) -> BoxFuture<'_, Result<String>> {
            let next = self
                .responses
                .lock()
                .expect("responses lock")
                .pop_front()
                .unwrap_or_default();
            Box::pin(async move { Ok(next) })
        }
    }

    fn model() -> ModelConfig {
        ModelConfig {
            provider: "test".into(),
            model_id: "test-model".into(),
            api_key: None,
            base_url: None,
            max_tokens: 1024,
            temperature: 0.0,
            timeout_secs: 30,
            retry: None,
        }
    }

    #[tokio::test]
    async fn test_build_from_text() {
        let llm = Arc::new(ScriptedClient::new(vec![
            r#"{"entities": [{"name": "A", "type": "CONCEPT"}, {"name": "B", "type": "CONCEPT"}]}"#,
            r#"{"relationships": [{"source": "A", "target": "B", "type": "USES"}]}"#,
        ]));
        let orchestrator = GraphOrchestrator::new(llm, model(), 4000);

        let graph = orchestrator.build_from_text("A uses B").await.unwrap();
        assert_eq!(graph.entities.len(), 2);
        assert_eq!(graph.relationships.len(), 1);
        assert_eq!(graph.metrics.num_nodes, 2);
    }

    #[tokio::test]
    async fn test_empty_text_is_rejected() {
        let llm = Arc::new(ScriptedClient::new(vec![]));
        let orchestrator = GraphOrchestrator::new(llm, model(), 4000);

        let err = orchestrator.build_from_text("   ").await.unwrap_err();
        assert!(matches!(err, GraphMindError::Validation(_)));
    }

    #[tokio::test]
    async fn test_malformed_responses_yield_empty_graph() {
        let llm = Arc::new(ScriptedClient::new(vec!["garbage", "more garbage"]));
        let orchestrator = GraphOrchestrator::new(llm, model(), 4000);

        let graph = orchestrator.build_from_text("some text").await.unwrap();
        assert!(graph.entities.is_empty());
        assert!(graph.relationships.is_empty());
        assert_eq!(graph.metrics.density, 0.0);
    }
}
