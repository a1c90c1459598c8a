use eframe::egui::{Vec2, vec2};

const LEAF_CAPACITY: usize = 8;
const MAX_DEPTH: u8 = 10;

/// Square cell given by its top-left corner and side.
#[derive(Clone, Copy, Debug)]
pub(super) struct QuadBounds {
    origin: Vec2,
    side: f32,
}

impl QuadBounds {
    /// Smallest padded square around every point, or `None` when there is
    /// no point or one of them is not finite.
    fn enclosing(points: &[Vec2]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let (low, high) = rest
            .iter()
            .fold((*first, *first), |(low, high), point| (low.min(*point), high.max(*point)));

        if !(low.is_finite() && high.is_finite()) {
            return None;
        }

        let span = high - low;
        let side = span.x.max(span.y).max(1.0) + 2.0;
        let middle = (low + high) * 0.5;
        Some(Self {
            origin: middle - Vec2::splat(side * 0.5),
            side,
        })
    }

    fn far_corner(self) -> Vec2 {
        self.origin + Vec2::splat(self.side)
    }

    fn middle(self) -> Vec2 {
        self.origin + Vec2::splat(self.side * 0.5)
    }

    pub(super) fn contains(self, point: Vec2) -> bool {
        let far = self.far_corner();
        (self.origin.x..=far.x).contains(&point.x) && (self.origin.y..=far.y).contains(&point.y)
    }

    /// Whether this cell overlaps the axis-aligned box `[min, max]`.
    pub(super) fn overlaps(self, min: Vec2, max: Vec2) -> bool {
        let far = self.far_corner();
        self.origin.x <= max.x && far.x >= min.x && self.origin.y <= max.y && far.y >= min.y
    }

    pub(super) fn side_length(self) -> f32 {
        self.side
    }

    /// Quadrant bits: 1 for the right half, 2 for the lower half.
    fn quadrant_of(self, point: Vec2) -> usize {
        let middle = self.middle();
        usize::from(point.x >= middle.x) | (usize::from(point.y >= middle.y) << 1)
    }

    fn quadrant(self, quadrant: usize) -> Self {
        let half = self.side * 0.5;
        let shift = vec2((quadrant & 1) as f32, (quadrant >> 1) as f32) * half;
        Self {
            origin: self.origin + shift,
            side: half,
        }
    }
}

/// Region quadtree over node indices. Leaves own their indices; inner
/// cells only carry bounds and the aggregate mass.
pub(super) struct QuadNode {
    pub(super) bounds: QuadBounds,
    pub(super) center_of_mass: Vec2,
    pub(super) mass: f32,
    pub(super) indices: Vec<usize>,
    pub(super) children: [Option<Box<QuadNode>>; 4],
}

impl QuadNode {
    pub(super) fn build(positions: &[Vec2]) -> Option<Self> {
        let bounds = QuadBounds::enclosing(positions)?;
        Some(Self::subdivide(bounds, (0..positions.len()).collect(), positions, 0))
    }

    fn subdivide(bounds: QuadBounds, indices: Vec<usize>, positions: &[Vec2], depth: u8) -> Self {
        let mass = indices.len() as f32;
        let total = indices
            .iter()
            .fold(Vec2::ZERO, |sum, &index| sum + positions[index]);
        let center_of_mass = if mass > 0.0 { total / mass } else { Vec2::ZERO };

        let mut cell = Self {
            bounds,
            center_of_mass,
            mass,
            indices,
            children: Default::default(),
        };
        if depth >= MAX_DEPTH || cell.indices.len() <= LEAF_CAPACITY {
            return cell;
        }

        let mut quadrants: [Vec<usize>; 4] = Default::default();
        for &index in &cell.indices {
            quadrants[bounds.quadrant_of(positions[index])].push(index);
        }
        // Coincident points would otherwise recurse to the depth limit.
        if quadrants.iter().filter(|members| !members.is_empty()).count() < 2 {
            return cell;
        }

        for (quadrant, members) in quadrants.into_iter().enumerate() {
            if !members.is_empty() {
                let child_bounds = bounds.quadrant(quadrant);
                let child = Self::subdivide(child_bounds, members, positions, depth + 1);
                cell.children[quadrant] = Some(Box::new(child));
            }
        }
        cell.indices = Vec::new();
        cell
    }

    pub(super) fn is_leaf(&self) -> bool {
        self.children.iter().all(Option::is_none)
    }

    /// Pre-order walk. `visit` returns whether to descend into the children.
    pub(super) fn visit(&self, visit: &mut impl FnMut(&QuadNode) -> bool) {
        if visit(self) {
            for child in self.children.iter().flatten() {
                child.visit(visit);
            }
        }
    }
}
