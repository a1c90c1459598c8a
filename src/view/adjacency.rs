use std::collections::HashSet;

use crate::snapshot::Graph;

/// Symmetric neighbor table, built once per dataset. Every node counts as
/// its own neighbor.
pub struct Adjacency {
    neighbors: Vec<HashSet<usize>>,
}

impl Adjacency {
    pub fn build(graph: &Graph) -> Self {
        let mut neighbors = (0..graph.node_count())
            .map(|index| HashSet::from([index]))
            .collect::<Vec<_>>();

        for edge in &graph.edges {
            neighbors[edge.source].insert(edge.target);
            neighbors[edge.target].insert(edge.source);
        }

        Self { neighbors }
    }

    pub fn connected(&self, a: usize, b: usize) -> bool {
        self.neighbors
            .get(a)
            .is_some_and(|neighbors| neighbors.contains(&b))
    }
}
