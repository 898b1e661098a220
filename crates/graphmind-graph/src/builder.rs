use std::collections::{HashMap, HashSet};

use graphmind_core::types::{
    Entity, GraphMetrics, GraphVisualization, KnowledgeGraph, Relationship, VisEdge, VisNode,
};

/// Build a knowledge graph from extracted entities and relationships.
///
/// A relationship is kept only when both its source and target names resolve
/// to a known entity; everything else is dropped silently. Output is fully
/// deterministic for a given input.
pub fn build_graph(entities: Vec<Entity>, relationships: Vec<Relationship>) -> KnowledgeGraph {
    // Name -> derived node id. Duplicate names collapse to one mapping.
    let entity_map: HashMap<&str, String> = entities
        .iter()
        .map(|e| (e.name.as_str(), e.node_id()))
        .collect();

    let valid_relationships: Vec<Relationship> = relationships
        .into_iter()
        .filter(|r| {
            entity_map.contains_key(r.source.as_str()) && entity_map.contains_key(r.target.as_str())
        })
        .collect();

    let metrics = compute_metrics(&entities, &valid_relationships);
    let visualization = build_visualization(&entities, &valid_relationships, &entity_map);

    KnowledgeGraph {
        entities,
        relationships: valid_relationships,
        metrics,
        visualization,
    }
}

fn compute_metrics(entities: &[Entity], relationships: &[Relationship]) -> GraphMetrics {
    let num_nodes = entities.len();
    let num_edges = relationships.len();

    // density = edges / max possible directed edges; exactly 0 for <= 1 node
    let density = if num_nodes > 1 {
        let max_edges = (num_nodes * (num_nodes - 1)) as f64;
        round3(num_edges as f64 / max_edges)
    } else {
        0.0
    };

    let connected: HashSet<&str> = relationships
        .iter()
        .flat_map(|r| [r.source.as_str(), r.target.as_str()])
        .collect();

    GraphMetrics {
        num_nodes,
        num_edges,
        density,
        connected_entities: connected.len(),
        isolated_entities: num_nodes.saturating_sub(connected.len()),
    }
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

fn build_visualization(
    entities: &[Entity],
    relationships: &[Relationship],
    entity_map: &HashMap<&str, String>,
) -> GraphVisualization {
    let nodes = entities
        .iter()
        .map(|e| VisNode {
            id: entity_map
                .get(e.name.as_str())
                .cloned()
                .unwrap_or_else(|| e.name.clone()),
            label: e.name.clone(),
            kind: e.kind.to_uppercase(),
            description: e.description.clone(),
            confidence: e.confidence,
        })
        .collect();

    let edges = relationships
        .iter()
        .filter_map(|r| {
            let source = entity_map.get(r.source.as_str())?;
            let target = entity_map.get(r.target.as_str())?;
            Some(VisEdge {
                source: source.clone(),
                target: target.clone(),
                kind: r.kind.to_uppercase(),
                description: r.description.clone(),
                confidence: r.confidence,
            })
        })
        .collect();

    GraphVisualization { nodes, edges }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(name: &str, kind: &str) -> Entity {
        Entity::new(name, kind)
    }

    fn rel(source: &str, target: &str) -> Relationship {
        Relationship {
            source: source.into(),
            target: target.into(),
            kind: "RELATED_TO".into(),
            description: String::new(),
            confidence: 0.9,
        }
    }

    #[test]
    fn test_node_ids_in_visualization() {
        let graph = build_graph(
            vec![entity("Marie Curie", "PERSON"), entity("Paris", "LOCATION")],
            vec![rel("Marie Curie", "Paris")],
        );

        assert_eq!(graph.visualization.nodes[0].id, "person:marie_curie");
        assert_eq!(graph.visualization.edges[0].source, "person:marie_curie");
        assert_eq!(graph.visualization.edges[0].target, "location:paris");
    }

    #[test]
    fn test_unknown_endpoints_are_dropped() {
        let graph = build_graph(
            vec![entity("A", "CONCEPT"), entity("B", "CONCEPT")],
            vec![rel("A", "B"), rel("A", "Ghost"), rel("Ghost", "B")],
        );

        assert_eq!(graph.relationships.len(), 1);
        assert_eq!(graph.metrics.num_edges, 1);
        // Ghost never counts toward connectivity
        assert_eq!(graph.metrics.connected_entities, 2);
        assert_eq!(graph.metrics.isolated_entities, 0);
    }

    #[test]
    fn test_density_boundary() {
        let empty = build_graph(vec![], vec![]);
        assert_eq!(empty.metrics.density, 0.0);

        let single = build_graph(vec![entity("A", "CONCEPT")], vec![]);
        assert_eq!(single.metrics.num_nodes, 1);
        assert_eq!(single.metrics.density, 0.0);
    }

    #[test]
    fn test_density_rounded_to_three_places() {
        // 1 edge over 3*2 = 6 possible => 0.16666... => 0.167
        let graph = build_graph(
            vec![
                entity("A", "CONCEPT"),
                entity("B", "CONCEPT"),
                entity("C", "CONCEPT"),
            ],
            vec![rel("A", "B")],
        );
        assert_eq!(graph.metrics.density, 0.167);
    }

    #[test]
    fn test_isolated_entities_counted() {
        let graph = build_graph(
            vec![
                entity("A", "CONCEPT"),
                entity("B", "CONCEPT"),
                entity("Loner", "PERSON"),
            ],
            vec![rel("A", "B")],
        );
        assert_eq!(graph.metrics.connected_entities, 2);
        assert_eq!(graph.metrics.isolated_entities, 1);
    }

    #[test]
    fn test_builder_is_deterministic() {
        let entities = vec![entity("A", "CONCEPT"), entity("B", "TECHNOLOGY")];
        let relationships = vec![rel("A", "B")];

        let first = build_graph(entities.clone(), relationships.clone());
        let second = build_graph(entities, relationships);

        assert_eq!(first.metrics, second.metrics);
        assert_eq!(first.visualization, second.visualization);
        assert_eq!(first.relationships, second.relationships);
    }
}
