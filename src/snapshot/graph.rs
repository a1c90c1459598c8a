use std::fmt;

/// Identifies one architecture snapshot. Step 0 is the baseline.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SnapshotKey {
    pub architecture: String,
    pub step: usize,
}

impl SnapshotKey {
    pub fn new(architecture: impl Into<String>, step: usize) -> Self {
        Self {
            architecture: architecture.into(),
            step,
        }
    }

    pub fn next(&self) -> Self {
        Self::new(self.architecture.clone(), self.step + 1)
    }

    pub fn previous(&self) -> Option<Self> {
        self.step
            .checked_sub(1)
            .map(|step| Self::new(self.architecture.clone(), step))
    }
}

impl fmt::Display for SnapshotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.architecture, self.step)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Node {
    pub name: String,
    pub package: Option<String>,
    /// One plus the number of edge endpoints naming this node.
    pub degree: u32,
}

/// Endpoints are indices into [`Graph::nodes`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Edge {
    pub source: usize,
    pub target: usize,
}

impl Edge {
    pub fn touches(self, index: usize) -> bool {
        self.source == index || self.target == index
    }
}

#[derive(Clone, Debug, Default)]
pub struct Graph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl Graph {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// First node of minimal degree; the layout keeps it at the viewport center.
    pub fn anchor_index(&self) -> Option<usize> {
        self.nodes
            .iter()
            .enumerate()
            .min_by_key(|(_, node)| node.degree)
            .map(|(index, _)| index)
    }
}

#[cfg(test)]
impl Graph {
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.nodes.iter().position(|node| node.name == name)
    }

    pub fn node(&self, name: &str) -> Option<&Node> {
        self.index_of(name).map(|index| &self.nodes[index])
    }
}
