use eframe::egui::{Color32, Pos2};

use crate::util::palette_slot;

const NODE_RADIUS_SCALE: f32 = 2.0;
const LENS_NODE_RADIUS_SCALE: f32 = 2.3;

/// Ten-color categorical palette for node fills.
pub const NODE_PALETTE: [Color32; 10] = [
    Color32::from_rgb(0x1f, 0x77, 0xb4),
    Color32::from_rgb(0xff, 0x7f, 0x0e),
    Color32::from_rgb(0x2c, 0xa0, 0x2c),
    Color32::from_rgb(0xd6, 0x27, 0x28),
    Color32::from_rgb(0x94, 0x67, 0xbd),
    Color32::from_rgb(0x8c, 0x56, 0x4b),
    Color32::from_rgb(0xe3, 0x77, 0xc2),
    Color32::from_rgb(0x7f, 0x7f, 0x7f),
    Color32::from_rgb(0xbc, 0xbd, 0x22),
    Color32::from_rgb(0x17, 0xbe, 0xcf),
];

pub fn node_radius(degree: u32, lens_active: bool) -> f32 {
    let scale = if lens_active {
        LENS_NODE_RADIUS_SCALE
    } else {
        NODE_RADIUS_SCALE
    };
    (degree as f32).sqrt() * scale
}

pub fn node_color(name: &str) -> Color32 {
    NODE_PALETTE[palette_slot(name, NODE_PALETTE.len())]
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodeSprite {
    pub index: usize,
    pub center: Pos2,
    pub radius: f32,
    pub color: Color32,
    pub opacity: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EdgeSprite {
    pub index: usize,
    pub from: Pos2,
    pub to: Pos2,
    pub width: f32,
    pub color: Color32,
    pub opacity: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Tooltip {
    pub anchor: Pos2,
    pub text: String,
}

/// Everything the painter needs for one tick. Coordinates are relative to
/// the drawing surface, with the lens already applied.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderFrame {
    pub nodes: Vec<NodeSprite>,
    pub edges: Vec<EdgeSprite>,
    pub tooltip: Option<Tooltip>,
    /// How long opacity changes in this frame should take to animate.
    pub fade_secs: f32,
}
