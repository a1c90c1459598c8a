use std::collections::HashMap;
use std::collections::hash_map::Entry;

use thiserror::Error;
use tracing::trace;

use super::document::GraphElement;
use super::graph::{Edge, Graph, Node};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("edge `{edge}` references undeclared node `{name}`")]
    UndeclaredNode { edge: String, name: String },
}

/// Normalizes an ordered element list into a [`Graph`].
///
/// Nodes keep their first-seen order and start with degree 1. Every edge
/// endpoint adds one to the degree of the node it names. An edge naming a
/// node that was never declared fails the whole snapshot.
pub fn parse_document(elements: &[GraphElement]) -> Result<Graph, SnapshotError> {
    let mut nodes = Vec::new();
    let mut index_by_name = HashMap::new();

    for element in elements {
        match element {
            GraphElement::Node { name, .. } if name.is_empty() => {}
            GraphElement::Node { name, package } => {
                if let Entry::Vacant(slot) = index_by_name.entry(name.clone()) {
                    slot.insert(nodes.len());
                    nodes.push(Node {
                        name: name.clone(),
                        package: package.clone(),
                        degree: 1,
                    });
                }
            }
            GraphElement::Edge { .. } => {}
            GraphElement::Other(entry) => trace!(%entry, "skipping graph entry"),
        }
    }

    let mut edges = Vec::new();
    for element in elements {
        let GraphElement::Edge {
            id,
            source_name,
            target_name,
        } = element
        else {
            continue;
        };

        let resolve = |name: &String| {
            index_by_name
                .get(name)
                .copied()
                .ok_or_else(|| SnapshotError::UndeclaredNode {
                    edge: id.clone(),
                    name: name.clone(),
                })
        };
        let source = resolve(source_name)?;
        let target = resolve(target_name)?;

        nodes[source].degree += 1;
        nodes[target].degree += 1;
        edges.push(Edge { source, target });
    }

    Ok(Graph { nodes, edges })
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn lamp() -> Vec<GraphElement> {
        vec![
            GraphElement::node("web"),
            GraphElement::node("db"),
            GraphElement::edge("e1", "web", "db"),
        ]
    }

    #[test]
    fn lamp_snapshot_has_two_nodes_of_degree_two() {
        let graph = parse_document(&lamp()).expect("lamp parses");

        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.nodes[0].name, "web");
        assert_eq!(graph.nodes[1].name, "db");
        assert!(graph.nodes.iter().all(|node| node.degree == 2));

        assert_eq!(graph.edges[0].source, 0);
        assert_eq!(graph.edges[0].target, 1);
    }

    #[test]
    fn edge_to_undeclared_node_is_malformed() {
        let document = vec![
            GraphElement::node("web"),
            GraphElement::edge("e7", "web", "cache"),
        ];

        assert_eq!(
            parse_document(&document).unwrap_err(),
            SnapshotError::UndeclaredNode {
                edge: "e7".to_owned(),
                name: "cache".to_owned(),
            }
        );
    }

    #[test]
    fn edges_may_precede_their_node_declarations() {
        let document = vec![
            GraphElement::edge("e1", "a", "b"),
            GraphElement::node("a"),
            GraphElement::node("b"),
        ];

        let graph = parse_document(&document).expect("nodes are collected before edges");
        assert_eq!(graph.edges, vec![Edge { source: 0, target: 1 }]);
    }

    #[test]
    fn empty_document_is_an_empty_graph() {
        let graph = parse_document(&[]).expect("empty parses");
        assert!(graph.is_empty());
        assert_eq!(graph.anchor_index(), None);
    }

    #[test]
    fn duplicate_declarations_keep_the_first_node() {
        let document = vec![
            GraphElement::Node {
                name: "web".to_owned(),
                package: Some("monolith".to_owned()),
            },
            GraphElement::node("db"),
            GraphElement::Node {
                name: "web".to_owned(),
                package: Some("other".to_owned()),
            },
            GraphElement::edge("e1", "db", "web"),
        ];

        let graph = parse_document(&document).expect("parses");
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.index_of("web"), Some(0));
        assert_eq!(
            graph.node("web").and_then(|node| node.package.as_deref()),
            Some("monolith")
        );
    }

    #[test]
    fn self_loop_counts_both_endpoints() {
        let document = vec![GraphElement::node("a"), GraphElement::edge("e1", "a", "a")];
        let graph = parse_document(&document).expect("parses");
        assert_eq!(graph.nodes[0].degree, 3);
    }

    #[test]
    fn anchor_is_first_node_of_minimal_degree() {
        let document = vec![
            GraphElement::node("hub"),
            GraphElement::node("left"),
            GraphElement::node("right"),
            GraphElement::edge("e1", "hub", "left"),
            GraphElement::edge("e2", "hub", "right"),
        ];
        let graph = parse_document(&document).expect("parses");
        assert_eq!(graph.anchor_index(), Some(1));
    }

    fn arbitrary_document() -> impl Strategy<Value = Vec<GraphElement>> {
        (1usize..12).prop_flat_map(|node_count| {
            prop::collection::vec((0..node_count, 0..node_count), 0..24).prop_map(
                move |pairs| {
                    let mut elements = (0..node_count)
                        .map(|index| GraphElement::node(format!("n{index}")))
                        .collect::<Vec<_>>();
                    for (edge, (source, target)) in pairs.into_iter().enumerate() {
                        elements.push(GraphElement::edge(
                            format!("e{edge}"),
                            format!("n{source}"),
                            format!("n{target}"),
                        ));
                    }
                    elements
                },
            )
        })
    }

    proptest! {
        #[test]
        fn parsing_is_deterministic(document in arbitrary_document()) {
            let first = parse_document(&document).expect("well-formed");
            let second = parse_document(&document).expect("well-formed");
            prop_assert_eq!(first.nodes, second.nodes);
            prop_assert_eq!(first.edges, second.edges);
        }

        #[test]
        fn degree_is_one_plus_incident_endpoints(document in arbitrary_document()) {
            let graph = parse_document(&document).expect("well-formed");
            for (index, node) in graph.nodes.iter().enumerate() {
                let endpoints = graph
                    .edges
                    .iter()
                    .map(|edge| {
                        u32::from(edge.source == index) + u32::from(edge.target == index)
                    })
                    .sum::<u32>();
                prop_assert_eq!(node.degree, 1 + endpoints);
            }
            for edge in &graph.edges {
                prop_assert!(edge.source < graph.node_count());
                prop_assert!(edge.target < graph.node_count());
            }
        }
    }
}
