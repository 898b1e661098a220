use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex};

use serde::Deserialize;
use tracing::{debug, info};

use graphmind_core::config::ModelConfig;
use graphmind_core::error::Result;
use graphmind_core::traits::CompletionClient;
use graphmind_core::types::{Entity, Relationship};

use crate::parse::parse_or_empty;

const ENTITY_SYSTEM_PROMPT: &str = r#"You are an expert at extracting entities from text. Extract all important entities and categorize them.

Entity Types:
- PERSON: People, characters, individuals
- ORGANIZATION: Companies, institutions, groups
- LOCATION: Places, countries, cities
- CONCEPT: Ideas, theories, concepts
- EVENT: Historical events, occurrences
- TECHNOLOGY: Tools, technologies, systems

Return JSON format:
{
    "entities": [
        {
            "name": "entity name",
            "type": "ENTITY_TYPE",
            "description": "brief description",
            "confidence": 0.9
        }
    ]
}"#;

const RELATIONSHIP_SYSTEM_PROMPT: &str = r#"You are an expert at extracting relationships between entities. Identify how entities are connected.

Common Relationship Types:
- WORKS_FOR: Employment relationships
- LOCATED_IN: Geographical relationships
- PART_OF: Membership or inclusion
- CREATED_BY: Creation relationships
- USES: Utilization relationships
- DEVELOPED: Development relationships
- INFLUENCED_BY: Influence relationships
- RELATED_TO: General connections

Return JSON format:
{
    "relationships": [
        {
            "source": "source entity name",
            "target": "target entity name",
            "type": "RELATIONSHIP_TYPE",
            "description": "how they are related",
            "confidence": 0.9
        }
    ]
}"#;

/// Truncate prompt input to `max_len` characters, marking the cut.
fn truncate_for_prompt(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        let cut: String = text.chars().take(max_len).collect();
        format!("{}...[text truncated]", cut)
    } else {
        text.to_string()
    }
}

fn content_hash(parts: &[&str]) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    for part in parts {
        part.hash(&mut hasher);
    }
    hasher.finish()
}

#[derive(Debug, Default, Deserialize)]
struct EntityEnvelope {
    #[serde(default)]
    entities: Vec<Entity>,
}

#[derive(Debug, Default, Deserialize)]
struct RelationshipEnvelope {
    #[serde(default)]
    relationships: Vec<Relationship>,
}

/// Extracts entities from text via an LLM call.
///
/// Transport failures surface as errors; malformed model output degrades
/// to an empty entity list.
pub struct EntityExtractor {
    llm: Arc<dyn CompletionClient>,
    model: ModelConfig,
    max_text_len: usize,
    cache: Mutex<HashMap<u64, Vec<Entity>>>,
}

impl EntityExtractor {
    pub fn new(llm: Arc<dyn CompletionClient>, model: ModelConfig, max_text_len: usize) -> Self {
        Self {
            llm,
            model,
            max_text_len,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub async fn extract(&self, text: &str) -> Result<Vec<Entity>> {
        let text = truncate_for_prompt(text, self.max_text_len);
        let key = content_hash(&[&text]);
        if let Ok(cache) = self.cache.lock() {
            if let Some(cached) = cache.get(&key) {
                debug!("Entity extraction cache hit");
                return Ok(cached.clone());
            }
        }

        let user_prompt = format!("Extract entities from this text:\n\n{}", text);

        debug!("Calling LLM for entity extraction");
        let response = self
            .llm
            .complete(&self.model, ENTITY_SYSTEM_PROMPT, &user_prompt)
            .await?;

        let envelope: EntityEnvelope = parse_or_empty(&response);
        info!(count = envelope.entities.len(), "Entities extracted");
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(key, envelope.entities.clone());
        }
        Ok(envelope.entities)
    }
}

/// Extracts relationships between known entities via an LLM call.
pub struct RelationshipExtractor {
    llm: Arc<dyn CompletionClient>,
    model: ModelConfig,
    max_text_len: usize,
    cache: Mutex<HashMap<u64, Vec<Relationship>>>,
}

impl RelationshipExtractor {
    pub fn new(llm: Arc<dyn CompletionClient>, model: ModelConfig, max_text_len: usize) -> Self {
        Self {
            llm,
            model,
            max_text_len,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub async fn extract(&self, text: &str, entities: &[Entity]) -> Result<Vec<Relationship>> {
        let text = truncate_for_prompt(text, self.max_text_len);
        let entity_list = entities
            .iter()
            .map(|e| format!("{} ({})", e.name, e.kind))
            .collect::<Vec<_>>()
            .join(", ");

        let key = content_hash(&[&text, &entity_list]);
        if let Ok(cache) = self.cache.lock() {
            if let Some(cached) = cache.get(&key) {
                debug!("Relationship extraction cache hit");
                return Ok(cached.clone());
            }
        }

        let user_prompt = format!(
            "Extract relationships between entities from this text:\n\nEntities: {}\n\nText: {}",
            entity_list, text
        );

        debug!("Calling LLM for relationship extraction");
        let response = self
            .llm
            .complete(&self.model, RELATIONSHIP_SYSTEM_PROMPT, &user_prompt)
            .await?;

        let envelope: RelationshipEnvelope = parse_or_empty(&response);
        info!(count = envelope.relationships.len(), "Relationships extracted");
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(key, envelope.relationships.clone());
        }
        Ok(envelope.relationships)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::BoxFuture;
    use graphmind_core::error::GraphMindError;

    struct FixedResponse(String);

    impl CompletionClient for FixedResponse {
        fn complete(
            &self,
            _config: &ModelConfig,
            _system_prompt: &str,
            _user_prompt: &str,
        ) -> BoxFuture<'_, Result<String>> {
            let response = self.0.clone();
            Box::pin(async move { Ok(response) })
        }
    }

    struct FailingClient;

    impl CompletionClient for FailingClient {
        fn complete(
            &self,
            _config: &ModelConfig,
            _system_prompt: &str,
            _user_prompt: &str,
        ) -> BoxFuture<'_, Result<String>> {
            Box::pin(async { Err(GraphMindError::Completion("connection refused".into())) })
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
    async fn test_extract_entities() {
        let response = r#"{"entities": [{"name": "Rust", "type": "TECHNOLOGY", "description": "a language", "confidence": 0.95}]}"#;
        let extractor =
            EntityExtractor::new(Arc::new(FixedResponse(response.into())), model(), 4000);

        let entities = extractor.extract("Rust is a language").await.unwrap();
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].name, "Rust");
        assert_eq!(entities[0].kind, "TECHNOLOGY");
    }

    #[tokio::test]
    async fn test_malformed_response_yields_empty() {
        let extractor = EntityExtractor::new(
            Arc::new(FixedResponse("no json here at all".into())),
            model(),
            4000,
        );

        let entities = extractor.extract("some text").await.unwrap();
        assert!(entities.is_empty());
    }

    #[tokio::test]
    async fn test_transport_failure_is_an_error() {
        let extractor = EntityExtractor::new(Arc::new(FailingClient), model(), 4000);
        assert!(extractor.extract("some text").await.is_err());
    }

    #[tokio::test]
    async fn test_extract_relationships() {
        let response = r#"{"relationships": [{"source": "A", "target": "B", "type": "USES", "description": "", "confidence": 0.8}]}"#;
        let extractor =
            RelationshipExtractor::new(Arc::new(FixedResponse(response.into())), model(), 4000);

        let entities = vec![Entity::new("A", "CONCEPT"), Entity::new("B", "CONCEPT")];
        let rels = extractor.extract("A uses B", &entities).await.unwrap();
        assert_eq!(rels.len(), 1);
        assert_eq!(rels[0].kind, "USES");
    }

    #[tokio::test]
    async fn test_repeated_extraction_hits_the_cache() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        struct CountingClient(AtomicUsize);

        impl CompletionClient for CountingClient {
            fn complete(
                &self,
                _config: &ModelConfig,
                _system_prompt: &str,
                _user_prompt: &str,
            ) -> BoxFuture<'_, Result<String>> {
                self.0.fetch_add(1, Ordering::SeqCst);
                Box::pin(async {
                    Ok(r#"{"entities": [{"name": "Rust", "type": "TECHNOLOGY"}]}"#.to_string())
                })
            }
        }

        let client = Arc::new(CountingClient(AtomicUsize::new(0)));
        let extractor = EntityExtractor::new(client.clone(), model(), 4000);

        let first = extractor.extract("Rust is fast").await.unwrap();
        let second = extractor.extract("Rust is fast").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(client.0.load(Ordering::SeqCst), 1);

        // different text misses the cache
        extractor.extract("different text").await.unwrap();
        assert_eq!(client.0.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_truncation_marks_the_cut() {
        let out = truncate_for_prompt(&"a".repeat(50), 10);
        assert_eq!(out, format!("{}...[text truncated]", "a".repeat(10)));

        let out = truncate_for_prompt("short", 10);
        assert_eq!(out, "short");
    }
}
