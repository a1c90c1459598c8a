mod adjacency;
mod frame;
mod highlight;
mod hit;

use std::rc::Rc;

use eframe::egui::{Pos2, Vec2};
use tracing::debug;

use crate::layout::{PauseReason, Simulation};
use crate::lens::{Fisheye, LENS_DISTORTION, LENS_RADIUS};
use crate::snapshot::Graph;

use adjacency::Adjacency;
use frame::{EdgeSprite, NodeSprite, RenderFrame, Tooltip, node_color, node_radius};
pub use highlight::Hover;
use hit::distance_to_segment;

const MIN_NODE_HIT_RADIUS: f32 = 6.0;
const EDGE_HIT_TOLERANCE: f32 = 4.0;

/// One rendering of one snapshot: the live layout plus everything the
/// pointer has done to it.
///
/// Removals, hover state and pins are local to this view. The cached
/// [`Graph`] it was built from is never modified. Dropping the view stops
/// its simulation.
pub struct GraphView {
    graph: Rc<Graph>,
    simulation: Simulation,
    adjacency: Adjacency,
    hover: Hover,
    removed_nodes: Vec<bool>,
    removed_edges: Vec<bool>,
    dragging: Option<usize>,
    lens: Option<Fisheye>,
}

impl GraphView {
    pub fn new(graph: Rc<Graph>, viewport: Vec2, charge: f32) -> Self {
        let simulation = Simulation::new(&graph, viewport, charge);
        let adjacency = Adjacency::build(&graph);

        Self {
            removed_nodes: vec![false; graph.node_count()],
            removed_edges: vec![false; graph.edge_count()],
            graph,
            simulation,
            adjacency,
            hover: Hover::None,
            dragging: None,
            lens: None,
        }
    }

    pub fn graph(&self) -> &Rc<Graph> {
        &self.graph
    }

    /// Follows the store's current dataset.
    ///
    /// A different graph starts a fresh view. The same graph with a new
    /// charge only retunes the simulation. Returns whether anything changed.
    pub fn sync(&mut self, graph: Rc<Graph>, charge: f32) -> bool {
        if !Rc::ptr_eq(&self.graph, &graph) {
            debug!(nodes = graph.node_count(), "seeding graph view");
            *self = Self::new(graph, self.simulation.viewport(), charge);
            return true;
        }

        if self.simulation.charge() != charge {
            self.simulation.set_charge(charge);
            return true;
        }

        false
    }

    pub fn set_viewport(&mut self, viewport: Vec2) {
        self.simulation.set_viewport(viewport);
    }

    pub fn tick(&mut self) -> bool {
        self.simulation.tick()
    }

    pub fn pointer_moved(&mut self, pointer: Pos2) {
        self.simulation.pause(PauseReason::Lens);
        self.lens = Some(Fisheye::new(pointer, LENS_RADIUS, LENS_DISTORTION));
    }

    /// Drops the lens and hands positions back to the simulation.
    pub fn pointer_left(&mut self) {
        self.hover = Hover::None;
        if self.lens.take().is_some() {
            self.simulation.resume(PauseReason::Lens);
        }
    }

    pub fn lens_active(&self) -> bool {
        self.lens.is_some()
    }

    fn node_visible(&self, index: usize) -> bool {
        !self.removed_nodes.get(index).copied().unwrap_or(true)
    }

    fn edge_visible(&self, index: usize) -> bool {
        let Some(edge) = self.graph.edges.get(index) else {
            return false;
        };
        !self.removed_edges[index]
            && self.node_visible(edge.source)
            && self.node_visible(edge.target)
    }

    pub fn visible_node_count(&self) -> usize {
        (0..self.graph.node_count())
            .filter(|&index| self.node_visible(index))
            .count()
    }

    pub fn visible_edge_count(&self) -> usize {
        (0..self.graph.edge_count())
            .filter(|&index| self.edge_visible(index))
            .count()
    }

    /// Where a node is drawn: its simulated position, through the lens if
    /// one is active.
    pub fn display_position(&self, index: usize) -> Option<Pos2> {
        let position = self.simulation.position(index)?.to_pos2();
        Some(match &self.lens {
            Some(lens) => lens.apply(position),
            None => position,
        })
    }

    pub fn node_at(&self, point: Pos2) -> Option<usize> {
        let lens_active = self.lens_active();
        (0..self.graph.node_count())
            .filter(|&index| self.node_visible(index))
            .filter_map(|index| {
                let center = self.display_position(index)?;
                let radius = node_radius(self.graph.nodes[index].degree, lens_active)
                    .max(MIN_NODE_HIT_RADIUS);
                let distance = center.distance(point);
                (distance <= radius).then_some((index, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(index, _)| index)
    }

    pub fn edge_at(&self, point: Pos2) -> Option<usize> {
        self.graph
            .edges
            .iter()
            .enumerate()
            .filter(|(index, _)| self.edge_visible(*index))
            .filter_map(|(index, edge)| {
                let from = self.display_position(edge.source)?;
                let to = self.display_position(edge.target)?;
                let distance = distance_to_segment(point, from, to);
                (distance <= EDGE_HIT_TOLERANCE).then_some((index, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(index, _)| index)
    }

    /// Updates the hover target for the pointer. Nodes win over edges.
    pub fn hover_at(&mut self, point: Pos2) -> Hover {
        self.hover = if let Some(index) = self.node_at(point) {
            Hover::Node(index)
        } else if let Some(index) = self.edge_at(point) {
            Hover::Edge(index)
        } else {
            Hover::None
        };
        self.hover
    }

    pub fn hover(&self) -> Hover {
        self.hover
    }

    /// Hides a node and every edge touching it from this view.
    pub fn remove_node(&mut self, index: usize) -> bool {
        if !self.node_visible(index) {
            return false;
        }

        self.removed_nodes[index] = true;
        for (edge_index, edge) in self.graph.edges.iter().enumerate() {
            if edge.touches(index) {
                self.removed_edges[edge_index] = true;
            }
        }

        match self.hover {
            Hover::Node(hovered) if hovered == index => self.hover = Hover::None,
            Hover::Edge(hovered) if self.removed_edges[hovered] => self.hover = Hover::None,
            _ => {}
        }
        if self.dragging == Some(index) {
            self.drag_end();
        }
        true
    }

    pub fn remove_edge(&mut self, index: usize) -> bool {
        if !self.edge_visible(index) {
            return false;
        }

        self.removed_edges[index] = true;
        if self.hover == Hover::Edge(index) {
            self.hover = Hover::None;
        }
        true
    }

    /// Removal gesture at a point: the node under it, else the edge.
    pub fn remove_at(&mut self, point: Pos2) -> bool {
        if let Some(index) = self.node_at(point) {
            return self.remove_node(index);
        }
        if let Some(index) = self.edge_at(point) {
            return self.remove_edge(index);
        }
        false
    }

    pub fn dragging(&self) -> Option<usize> {
        self.dragging
    }

    /// Grabs a node. The lens is dropped so the node follows the pointer 1:1.
    pub fn drag_start(&mut self, index: usize) -> bool {
        if !self.node_visible(index) {
            return false;
        }
        self.simulation.pause(PauseReason::Drag);
        if self.lens.take().is_some() {
            self.simulation.resume(PauseReason::Lens);
        }
        self.dragging = Some(index);
        true
    }

    pub fn drag_start_at(&mut self, point: Pos2) -> bool {
        match self.node_at(point) {
            Some(index) => self.drag_start(index),
            None => false,
        }
    }

    /// Moves the dragged node now; the caller repaints without waiting for a tick.
    pub fn drag_move(&mut self, delta: Vec2) -> bool {
        let Some(index) = self.dragging else {
            return false;
        };
        self.simulation.translate(index, delta);
        true
    }

    /// Pins the dragged node where it was dropped and lets the layout run again.
    pub fn drag_end(&mut self) {
        if let Some(index) = self.dragging.take() {
            self.simulation.pin(index);
            self.simulation.resume(PauseReason::Drag);
        }
    }

    pub fn frame(&self) -> RenderFrame {
        let lens_active = self.lens_active();

        let edges = self
            .graph
            .edges
            .iter()
            .enumerate()
            .filter(|(index, _)| self.edge_visible(*index))
            .filter_map(|(index, edge)| {
                let (width, color) = self.hover.edge_stroke(index);
                Some(EdgeSprite {
                    index,
                    from: self.display_position(edge.source)?,
                    to: self.display_position(edge.target)?,
                    width,
                    color,
                    opacity: self.hover.edge_opacity(*edge),
                })
            })
            .collect();

        let nodes = self
            .graph
            .nodes
            .iter()
            .enumerate()
            .filter(|(index, _)| self.node_visible(*index))
            .filter_map(|(index, node)| {
                Some(NodeSprite {
                    index,
                    center: self.display_position(index)?,
                    radius: node_radius(node.degree, lens_active),
                    color: node_color(&node.name),
                    opacity: self.hover.node_opacity(&self.adjacency, index),
                })
            })
            .collect();

        let tooltip = match self.hover {
            Hover::Node(index) => self.display_position(index).map(|anchor| {
                let node = &self.graph.nodes[index];
                let text = match &node.package {
                    Some(package) => format!("{} ({package})", node.name),
                    None => node.name.clone(),
                };
                Tooltip { anchor, text }
            }),
            _ => None,
        };

        RenderFrame {
            nodes,
            edges,
            tooltip,
            fade_secs: self.hover.fade_secs(),
        }
    }
}
