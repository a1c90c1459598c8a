use anyhow::{Context, Result};
use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::Value;

#[derive(Clone, Debug, Deserialize)]
pub struct SnapshotDocument {
    #[serde(default)]
    pub arch: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    pub graph: Vec<GraphElement>,
}

/// One entry of a snapshot's ordered `graph` list.
///
/// Entries that are neither node nor edge declarations (`forget`, `done`
/// and anything newer writers emit) decode as [`GraphElement::Other`] and
/// are skipped by the parser. An entry carrying a `node` or `edge` key must
/// decode as that kind, otherwise the whole document is rejected.
#[derive(Clone, Debug)]
pub enum GraphElement {
    Node {
        name: String,
        package: Option<String>,
    },
    Edge {
        id: String,
        source_name: String,
        target_name: String,
    },
    Other(Value),
}

#[derive(Deserialize)]
struct NodeEntry {
    node: String,
    #[serde(default, alias = "service")]
    package: Option<String>,
}

#[derive(Deserialize)]
struct EdgeEntry {
    edge: String,
    source: String,
    target: String,
}

impl<'de> Deserialize<'de> for GraphElement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;

        if value.get("node").is_some() {
            let entry = NodeEntry::deserialize(value)
                .map_err(|error| de::Error::custom(format!("invalid node entry: {error}")))?;
            return Ok(Self::Node {
                name: entry.node,
                package: entry.package,
            });
        }

        if value.get("edge").is_some() {
            let entry = EdgeEntry::deserialize(value)
                .map_err(|error| de::Error::custom(format!("invalid edge entry: {error}")))?;
            return Ok(Self::Edge {
                id: entry.edge,
                source_name: entry.source,
                target_name: entry.target,
            });
        }

        Ok(Self::Other(value))
    }
}

#[cfg(test)]
impl GraphElement {
    pub fn node(name: impl Into<String>) -> Self {
        Self::Node {
            name: name.into(),
            package: None,
        }
    }

    pub fn edge(
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self::Edge {
            id: id.into(),
            source_name: source.into(),
            target_name: target.into(),
        }
    }
}

pub fn decode_document(raw: &str) -> Result<SnapshotDocument> {
    serde_json::from_str(raw).context("invalid snapshot JSON")
}
