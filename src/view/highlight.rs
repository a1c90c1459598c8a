use eframe::egui::Color32;

use crate::snapshot::Edge;

use super::adjacency::Adjacency;

pub const DIMMED_OPACITY: f32 = 0.1;
pub const FADE_OUT_SECS: f32 = 0.1;
pub const FADE_IN_SECS: f32 = 0.3;

pub const EDGE_WIDTH: f32 = 1.5;
pub const EDGE_COLOR: Color32 = Color32::from_rgb(0x99, 0x99, 0x99);
pub const EMPHASIZED_EDGE_WIDTH: f32 = 4.0;
pub const EMPHASIZED_EDGE_COLOR: Color32 = Color32::from_rgb(0xc0, 0x39, 0x2b);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Hover {
    #[default]
    None,
    Node(usize),
    Edge(usize),
}

impl Hover {
    /// Target opacity of a node under the current hover.
    pub fn node_opacity(self, adjacency: &Adjacency, index: usize) -> f32 {
        match self {
            Self::Node(hovered) if !adjacency.connected(hovered, index) => DIMMED_OPACITY,
            _ => 1.0,
        }
    }

    pub fn edge_opacity(self, edge: Edge) -> f32 {
        match self {
            Self::Node(hovered) if !edge.touches(hovered) => DIMMED_OPACITY,
            _ => 1.0,
        }
    }

    pub fn edge_stroke(self, index: usize) -> (f32, Color32) {
        if self == Self::Edge(index) {
            (EMPHASIZED_EDGE_WIDTH, EMPHASIZED_EDGE_COLOR)
        } else {
            (EDGE_WIDTH, EDGE_COLOR)
        }
    }

    /// Fading out toward a hover is quick; restoring full opacity is slower.
    pub fn fade_secs(self) -> f32 {
        match self {
            Self::Node(_) => FADE_OUT_SECS,
            _ => FADE_IN_SECS,
        }
    }
}
