mod collide;
mod forces;
mod quadtree;

use std::f32::consts::TAU;

use eframe::egui::{Vec2, vec2};

use crate::snapshot::Graph;
use crate::util::stable_pair;

#[cfg(test)]
use collide::collision_reach;
use collide::resolve as resolve_collisions;
use forces::{ManyBody, accumulate_springs};
use quadtree::QuadNode;

pub const DEFAULT_CHARGE: f32 = -400.0;

const ALPHA_START: f32 = 0.1;
const ALPHA_DECAY: f32 = 0.99;
const ALPHA_MIN: f32 = 0.005;
const FRICTION: f32 = 0.9;
const GRAVITY: f32 = 0.1;
const LINK_STRENGTH: f32 = 1.0;
const COLLISION_STRENGTH: f32 = 0.3;
const BARNES_HUT_THETA: f32 = 0.8;
const SOFTENING: f32 = 1.0;
const MAX_SPEED: f32 = 40.0;

/// Why the simulation is currently held still.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PauseReason {
    Lens,
    Drag,
}

#[derive(Clone, Debug)]
pub struct LayoutNode {
    pub position: Vec2,
    pub degree: u32,
    pub fixed: bool,
    velocity: Vec2,
}

#[derive(Default)]
struct Scratch {
    positions: Vec<Vec2>,
    forces: Vec<Vec2>,
    degrees: Vec<u32>,
    fixed: Vec<bool>,
}

/// Tick-driven force layout over one graph.
///
/// Charge repels every pair, edges act as springs with a degree-dependent
/// rest length, and gravity pulls toward the viewport center. Pinned nodes
/// keep their position but still push and pull on their neighbors. After
/// the forces, each tick runs one collision pass and snaps the anchor node
/// back to the center.
pub struct Simulation {
    nodes: Vec<LayoutNode>,
    edges: Vec<(usize, usize)>,
    anchor: Option<usize>,
    charge: f32,
    viewport: Vec2,
    alpha: f32,
    paused_by: Vec<PauseReason>,
    scratch: Scratch,
}

impl Simulation {
    pub fn new(graph: &Graph, viewport: Vec2, charge: f32) -> Self {
        let mut simulation = Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            anchor: None,
            charge,
            viewport,
            alpha: ALPHA_START,
            paused_by: Vec::new(),
            scratch: Scratch::default(),
        };
        simulation.reseed(graph);
        simulation
    }

    /// Replaces the graph and restarts from fresh positions.
    pub fn reseed(&mut self, graph: &Graph) {
        let center = self.center();
        let count = graph.node_count();
        let base_radius = (count as f32).sqrt() * 24.0;

        self.nodes = graph
            .nodes
            .iter()
            .enumerate()
            .map(|(index, node)| {
                let angle = (index as f32 / count.max(1) as f32) * TAU;
                let (jx, jy) = stable_pair(&node.name);
                LayoutNode {
                    position: center
                        + vec2(angle.cos(), angle.sin()) * base_radius
                        + vec2(jx, jy) * 20.0,
                    degree: node.degree,
                    fixed: false,
                    velocity: Vec2::ZERO,
                }
            })
            .collect();
        self.edges = graph
            .edges
            .iter()
            .map(|edge| (edge.source, edge.target))
            .collect();
        self.anchor = graph.anchor_index();
        self.alpha = ALPHA_START;
    }

    /// Swaps the charge and reheats without touching positions.
    pub fn set_charge(&mut self, charge: f32) {
        self.charge = charge;
        self.alpha = ALPHA_START;
    }

    pub fn charge(&self) -> f32 {
        self.charge
    }

    pub fn set_viewport(&mut self, viewport: Vec2) {
        if (viewport - self.viewport).length_sq() > 0.25 {
            self.viewport = viewport;
            self.alpha = self.alpha.max(ALPHA_START);
        }
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    pub fn center(&self) -> Vec2 {
        self.viewport * 0.5
    }

    pub fn nodes(&self) -> &[LayoutNode] {
        &self.nodes
    }

    pub fn position(&self, index: usize) -> Option<Vec2> {
        self.nodes.get(index).map(|node| node.position)
    }

    pub fn is_paused(&self) -> bool {
        !self.paused_by.is_empty()
    }

    pub fn is_settled(&self) -> bool {
        self.alpha < ALPHA_MIN
    }

    pub fn pause(&mut self, reason: PauseReason) {
        if !self.paused_by.contains(&reason) {
            self.paused_by.push(reason);
        }
    }

    /// Lifts one pause reason. Once none remain the layout is reheated.
    pub fn resume(&mut self, reason: PauseReason) {
        let before = self.paused_by.len();
        self.paused_by.retain(|active| *active != reason);
        if before != self.paused_by.len() && self.paused_by.is_empty() {
            self.alpha = ALPHA_START;
        }
    }

    pub fn pin(&mut self, index: usize) {
        if let Some(node) = self.nodes.get_mut(index) {
            node.fixed = true;
            node.velocity = Vec2::ZERO;
        }
    }

    /// Moves a node directly, outside of the force loop.
    pub fn translate(&mut self, index: usize, delta: Vec2) {
        if let Some(node) = self.nodes.get_mut(index) {
            node.position += delta;
            node.velocity = Vec2::ZERO;
        }
    }

    /// Advances one tick. Returns false without writing any position while
    /// paused or once the layout has cooled down.
    pub fn tick(&mut self) -> bool {
        if self.is_paused() || self.is_settled() || self.nodes.is_empty() {
            return false;
        }

        let alpha = self.alpha;
        let center = self.center();
        let node_count = self.nodes.len();

        let scratch = &mut self.scratch;
        scratch.positions.clear();
        scratch.degrees.clear();
        scratch.fixed.clear();
        for node in &self.nodes {
            scratch.positions.push(node.position);
            scratch.degrees.push(node.degree);
            scratch.fixed.push(node.fixed);
        }
        scratch.forces.clear();
        scratch.forces.resize(node_count, Vec2::ZERO);

        if self.charge != 0.0
            && let Some(tree) = QuadNode::build(&scratch.positions)
        {
            let charge = ManyBody {
                positions: &scratch.positions,
                strength: -self.charge * alpha,
                softening: SOFTENING,
                theta: BARNES_HUT_THETA,
            };
            for (index, force) in scratch.forces.iter_mut().enumerate() {
                *force += charge.force_on(&tree, index);
            }
        }

        accumulate_springs(
            &self.edges,
            &scratch.positions,
            &scratch.degrees,
            LINK_STRENGTH * alpha,
            &mut scratch.forces,
        );

        for (index, force) in scratch.forces.iter_mut().enumerate() {
            *force += (center - scratch.positions[index]) * (GRAVITY * alpha);
        }

        for (index, node) in self.nodes.iter_mut().enumerate() {
            if node.fixed {
                node.velocity = Vec2::ZERO;
                continue;
            }

            let mut velocity = (node.velocity + scratch.forces[index]) * FRICTION;
            let speed = velocity.length();
            if speed > MAX_SPEED {
                velocity *= MAX_SPEED / speed;
            }
            node.velocity = velocity;
            scratch.positions[index] += velocity;
        }

        resolve_collisions(COLLISION_STRENGTH, &mut scratch.positions, &scratch.fixed);

        if let Some(anchor) = self.anchor
            && anchor < node_count
            && !scratch.fixed[anchor]
        {
            scratch.positions[anchor] = center;
        }

        for (node, position) in self.nodes.iter_mut().zip(&scratch.positions) {
            if !node.fixed {
                node.position = *position;
            }
        }

        self.alpha *= ALPHA_DECAY;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{GraphElement, parse_document};

    fn chain() -> Graph {
        parse_document(&[
            GraphElement::node("a"),
            GraphElement::node("b"),
            GraphElement::node("c"),
            GraphElement::node("d"),
            GraphElement::edge("e1", "a", "b"),
            GraphElement::edge("e2", "b", "c"),
            GraphElement::edge("e3", "c", "d"),
            GraphElement::edge("e4", "b", "d"),
        ])
        .expect("chain parses")
    }

    fn viewport() -> Vec2 {
        vec2(800.0, 600.0)
    }

    #[test]
    fn pinned_node_holds_while_neighbors_move() {
        let graph = chain();
        let mut simulation = Simulation::new(&graph, viewport(), DEFAULT_CHARGE);
        for _ in 0..5 {
            simulation.tick();
        }

        let pinned = graph.index_of("b").expect("b exists");
        let neighbor = graph.index_of("c").expect("c exists");
        simulation.pin(pinned);
        let pinned_at = simulation.nodes()[pinned].position;
        let neighbor_at = simulation.nodes()[neighbor].position;

        for _ in 0..20 {
            assert!(simulation.tick());
        }

        assert_eq!(simulation.nodes()[pinned].position, pinned_at);
        assert_ne!(simulation.nodes()[neighbor].position, neighbor_at);
    }

    #[test]
    fn paused_simulation_writes_nothing() {
        let graph = chain();
        let mut simulation = Simulation::new(&graph, viewport(), DEFAULT_CHARGE);
        let before = simulation
            .nodes()
            .iter()
            .map(|node| node.position)
            .collect::<Vec<_>>();

        simulation.pause(PauseReason::Lens);
        simulation.pause(PauseReason::Drag);
        assert!(!simulation.tick());

        simulation.resume(PauseReason::Drag);
        assert!(simulation.is_paused());
        assert!(!simulation.tick());

        let after = simulation
            .nodes()
            .iter()
            .map(|node| node.position)
            .collect::<Vec<_>>();
        assert_eq!(before, after);

        simulation.resume(PauseReason::Lens);
        assert!(simulation.tick());
    }

    #[test]
    fn charge_change_keeps_positions() {
        let graph = chain();
        let mut simulation = Simulation::new(&graph, viewport(), DEFAULT_CHARGE);
        for _ in 0..30 {
            simulation.tick();
        }
        let cooled = simulation.alpha;
        let before = simulation.position(2);

        simulation.set_charge(-1000.0);
        assert_eq!(simulation.position(2), before);
        assert!(simulation.alpha > cooled);
        assert_eq!(simulation.charge(), -1000.0);
    }

    #[test]
    fn reseed_starts_over() {
        let graph = chain();
        let mut simulation = Simulation::new(&graph, viewport(), DEFAULT_CHARGE);
        let initial = simulation.position(3);
        simulation.pin(3);
        for _ in 0..10 {
            simulation.tick();
        }

        simulation.reseed(&graph);
        assert_eq!(simulation.position(3), initial);
        assert!(simulation.nodes().iter().all(|node| !node.fixed));
    }

    #[test]
    fn anchor_sits_at_the_center() {
        let graph = chain();
        let mut simulation = Simulation::new(&graph, viewport(), DEFAULT_CHARGE);
        simulation.tick();

        let anchor = graph.anchor_index().expect("anchor");
        assert_eq!(simulation.nodes()[anchor].position, simulation.center());
    }

    #[test]
    fn layout_cools_down() {
        let graph = chain();
        let mut simulation = Simulation::new(&graph, viewport(), DEFAULT_CHARGE);
        let mut ticks = 0;
        while simulation.tick() {
            ticks += 1;
            assert!(ticks < 1_000);
        }
        assert!(simulation.is_settled());

        simulation.resume(PauseReason::Drag);
        assert!(simulation.is_settled());
    }

    #[test]
    fn connected_nodes_settle_near_their_rest_length() {
        let graph = parse_document(&[
            GraphElement::node("web"),
            GraphElement::node("db"),
            GraphElement::edge("e1", "web", "db"),
        ])
        .expect("parses");
        let mut simulation = Simulation::new(&graph, viewport(), DEFAULT_CHARGE);
        while simulation.tick() {}

        let distance =
            (simulation.nodes()[0].position - simulation.nodes()[1].position).length();
        assert!(distance >= collision_reach() - 1.0);
        assert!(distance < 400.0);
    }

    #[test]
    fn empty_graph_never_ticks() {
        let mut simulation = Simulation::new(&Graph::default(), viewport(), DEFAULT_CHARGE);
        assert!(!simulation.tick());
    }
}
