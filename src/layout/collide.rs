use eframe::egui::{Vec2, vec2};

use super::forces::fallback_direction;
use super::quadtree::QuadNode;

pub const COLLISION_RADIUS: f32 = 10.0;
pub const COLLISION_PADDING: f32 = 1.0;

/// Centers closer than this overlap.
pub fn collision_reach() -> f32 {
    2.0 * COLLISION_RADIUS + COLLISION_PADDING
}

/// One overlap-resolution pass.
///
/// Each overlapping pair is pushed apart by `strength` times the overlap.
/// The push is split evenly, or given entirely to the free node when the
/// other is pinned. The quadtree is rebuilt from the positions on entry and
/// cells outside a node's search box are skipped without descending.
pub fn resolve(strength: f32, positions: &mut [Vec2], fixed: &[bool]) {
    let strength = strength.clamp(0.0, 1.0);
    if strength <= 0.0 || positions.len() < 2 {
        return;
    }
    let Some(tree) = QuadNode::build(positions) else {
        return;
    };

    let reach = collision_reach();
    for index in 0..positions.len() {
        let search_min = positions[index] - vec2(reach, reach);
        let search_max = positions[index] + vec2(reach, reach);

        tree.visit(&mut |cell| {
            if !cell.bounds.overlaps(search_min, search_max) {
                return false;
            }
            for &other in &cell.indices {
                if other != index {
                    separate(positions, fixed, index, other, reach, strength);
                }
            }
            true
        });
    }
}

fn separate(
    positions: &mut [Vec2],
    fixed: &[bool],
    index: usize,
    other: usize,
    reach: f32,
    strength: f32,
) {
    let index_fixed = fixed.get(index).copied().unwrap_or(false);
    let other_fixed = fixed.get(other).copied().unwrap_or(false);
    if index_fixed && other_fixed {
        return;
    }

    let delta = positions[index] - positions[other];
    let distance = delta.length();
    if distance >= reach {
        return;
    }

    let direction = if distance > 0.0001 {
        delta / distance
    } else {
        let sign = if index < other { 1.0 } else { -1.0 };
        fallback_direction(index.min(other), index.max(other)) * sign
    };
    let push = direction * ((reach - distance) * strength);

    match (index_fixed, other_fixed) {
        (false, false) => {
            positions[index] += push * 0.5;
            positions[other] -= push * 0.5;
        }
        (false, true) => positions[index] += push,
        (true, false) => positions[other] -= push,
        (true, true) => {}
    }
}
