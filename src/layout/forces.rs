use eframe::egui::{Vec2, vec2};

use super::quadtree::QuadNode;

/// Deterministic unit vector for coincident pairs.
pub(super) fn fallback_direction(from: usize, to: usize) -> Vec2 {
    let angle = ((from as f32) * 0.618_034 + (to as f32) * 0.414_214) * std::f32::consts::TAU;
    vec2(angle.cos(), angle.sin())
}

/// Spring rest length along an edge; busier endpoints claim more room.
pub fn link_distance(source_degree: u32, target_degree: u32) -> f32 {
    10.0 + 7.0 * (source_degree + target_degree) as f32 / 2.0
}

/// Charge between every pair of nodes, approximated with Barnes-Hut.
///
/// `strength` is positive for repulsion; the force falls off with the
/// inverse of the distance. A cell is treated as one body once it is small
/// relative to its distance (`side / distance < theta`) and the point lies
/// outside it.
pub(super) struct ManyBody<'a> {
    pub(super) positions: &'a [Vec2],
    pub(super) strength: f32,
    pub(super) softening: f32,
    pub(super) theta: f32,
}

impl ManyBody<'_> {
    fn pair(&self, index: usize, other: usize) -> Vec2 {
        let delta = self.positions[index] - self.positions[other];
        let distance_sq = delta.length_sq();
        if distance_sq <= 0.0001 {
            return fallback_direction(index, other) * (self.strength / self.softening.sqrt());
        }
        delta * (self.strength / (distance_sq + self.softening))
    }

    pub(super) fn force_on(&self, tree: &QuadNode, index: usize) -> Vec2 {
        let point = self.positions[index];
        let mut force = Vec2::ZERO;

        tree.visit(&mut |cell| {
            if cell.mass <= 0.0 {
                return false;
            }
            if cell.is_leaf() {
                for &other in cell.indices.iter().filter(|&&other| other != index) {
                    force += self.pair(index, other);
                }
                return false;
            }

            let delta = point - cell.center_of_mass;
            let distance_sq = delta.length_sq().max(0.0001);
            let far_enough = cell.bounds.side_length() / distance_sq.sqrt() < self.theta;
            if far_enough && cell.mass > 1.0 && !cell.bounds.contains(point) {
                force += delta * (self.strength * cell.mass / (distance_sq + self.softening));
                return false;
            }
            true
        });

        force
    }
}

/// Pulls each edge's endpoints toward their rest length.
///
/// The correction is split by degree: the lighter endpoint moves more.
pub(super) fn accumulate_springs(
    edges: &[(usize, usize)],
    positions: &[Vec2],
    degrees: &[u32],
    strength: f32,
    forces: &mut [Vec2],
) {
    let node_count = positions.len();
    for &(source, target) in edges {
        if source >= node_count || target >= node_count || source == target {
            continue;
        }

        let delta = positions[target] - positions[source];
        let distance = delta.length();
        if distance <= 0.0001 {
            continue;
        }

        let rest = link_distance(degrees[source], degrees[target]);
        let correction = delta * (strength * (distance - rest) / distance);
        let source_weight = degrees[source] as f32;
        let target_weight = degrees[target] as f32;
        let target_share = source_weight / (source_weight + target_weight);

        forces[target] -= correction * target_share;
        forces[source] += correction * (1.0 - target_share);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_distance_grows_with_degree() {
        assert_eq!(link_distance(1, 1), 17.0);
        assert_eq!(link_distance(2, 2), 24.0);
        assert!(link_distance(10, 2) > link_distance(2, 2));
    }

    #[test]
    fn repulsion_pushes_points_apart() {
        let positions = [vec2(0.0, 0.0), vec2(10.0, 0.0)];
        let tree = QuadNode::build(&positions).expect("tree");
        let charge = ManyBody {
            positions: &positions,
            strength: 40.0,
            softening: 1.0,
            theta: 0.8,
        };
        let force = charge.force_on(&tree, 0);
        assert!(force.x < 0.0);
        assert!(force.y.abs() < 1e-4);
    }

    #[test]
    fn distant_cluster_is_approximated_as_one_body() {
        let mut positions = vec![vec2(0.0, 0.0)];
        for index in 0..30 {
            positions.push(vec2(1000.0 + (index % 6) as f32, (index / 6) as f32));
        }
        let tree = QuadNode::build(&positions).expect("tree");

        let approximate = ManyBody {
            positions: &positions,
            strength: 40.0,
            softening: 1.0,
            theta: 0.8,
        };
        let exact = ManyBody {
            theta: 0.0,
            ..approximate
        };

        let (near, far) = (approximate.force_on(&tree, 0), exact.force_on(&tree, 0));
        assert!(near.x < 0.0);
        assert!((near - far).length() < far.length() * 0.05);
    }

    #[test]
    fn stretched_spring_pulls_endpoints_together() {
        let positions = [vec2(0.0, 0.0), vec2(100.0, 0.0)];
        let mut forces = [Vec2::ZERO; 2];
        accumulate_springs(&[(0, 1)], &positions, &[2, 2], 0.1, &mut forces);

        assert!(forces[0].x > 0.0);
        assert!(forces[1].x < 0.0);
        assert!((forces[0].x + forces[1].x).abs() < 1e-4);
    }

    #[test]
    fn compressed_spring_pushes_endpoints_apart() {
        let positions = [vec2(0.0, 0.0), vec2(5.0, 0.0)];
        let mut forces = [Vec2::ZERO; 2];
        accumulate_springs(&[(0, 1)], &positions, &[1, 3], 0.1, &mut forces);

        assert!(forces[0].x < 0.0);
        assert!(forces[1].x > 0.0);
        assert!(forces[0].x.abs() > forces[1].x.abs());
    }
}
