mod document;
mod graph;
mod parse;

#[cfg(test)]
pub use document::GraphElement;
pub use document::{SnapshotDocument, decode_document};
pub use graph::{Edge, Graph, SnapshotKey};
pub use parse::{SnapshotError, parse_document};
