use eframe::egui::Pos2;

pub const LENS_RADIUS: f32 = 230.0;
pub const LENS_DISTORTION: f32 = 2.0;

/// Circular fisheye magnification around a focus point.
///
/// Inside `radius` a point at distance `d` from the focus is moved to
/// distance `0.75 * k0 * (1 - exp(-d * distortion / radius)) + 0.25 * d`,
/// which grows monotonically with `d` and meets the identity at the rim.
/// Points on or beyond the rim are returned unchanged.
#[derive(Clone, Copy, Debug)]
pub struct Fisheye {
    focus: Pos2,
    radius: f32,
    k0: f32,
    k1: f32,
}

impl Fisheye {
    pub fn new(focus: Pos2, radius: f32, distortion: f32) -> Self {
        let radius = radius.max(0.0);
        let (k0, k1) = if radius > 0.0 && distortion > f32::EPSILON {
            let e = distortion.exp();
            (e / (e - 1.0) * radius, distortion / radius)
        } else {
            (0.0, 0.0)
        };

        Self {
            focus,
            radius,
            k0,
            k1,
        }
    }

    pub fn apply(&self, point: Pos2) -> Pos2 {
        let delta = point - self.focus;
        let distance = delta.length();

        if self.k1 <= 0.0 || distance <= f32::EPSILON || distance >= self.radius {
            return point;
        }

        let k = self.k0 * (1.0 - (-distance * self.k1).exp()) / distance * 0.75 + 0.25;
        self.focus + delta * k
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::pos2;

    use super::*;

    #[test]
    fn identity_outside_the_radius() {
        let lens = Fisheye::new(pos2(100.0, 100.0), 50.0, 2.0);

        for point in [
            pos2(150.0, 100.0),
            pos2(100.0, 40.0),
            pos2(400.0, -20.0),
            pos2(136.0, 136.0),
        ] {
            assert_eq!(lens.apply(point), point);
        }
    }

    #[test]
    fn focus_is_fixed() {
        let focus = pos2(10.0, 20.0);
        let lens = Fisheye::new(focus, LENS_RADIUS, LENS_DISTORTION);
        assert_eq!(lens.apply(focus), focus);
        assert_eq!(lens.focus, focus);
    }

    #[test]
    fn points_inside_are_pushed_outward_monotonically() {
        let focus = pos2(0.0, 0.0);
        let lens = Fisheye::new(focus, LENS_RADIUS, LENS_DISTORTION);

        let mut previous = 0.0;
        for step in 1..230 {
            let distance = step as f32;
            let moved = (lens.apply(pos2(distance, 0.0)) - focus).length();
            assert!(moved >= distance - 1e-3, "{moved} < {distance}");
            assert!(moved > previous);
            previous = moved;
        }
    }

    #[test]
    fn rim_is_continuous() {
        let lens = Fisheye::new(pos2(0.0, 0.0), LENS_RADIUS, LENS_DISTORTION);
        let inside = lens.apply(pos2(229.99, 0.0));
        assert!((inside.x - 229.99).abs() < 0.05);
    }

    #[test]
    fn stronger_distortion_magnifies_more() {
        let point = pos2(30.0, 0.0);
        let mild = Fisheye::new(pos2(0.0, 0.0), 230.0, 1.0).apply(point);
        let strong = Fisheye::new(pos2(0.0, 0.0), 230.0, 4.0).apply(point);
        assert!(strong.x > mild.x);
    }

    #[test]
    fn zero_distortion_is_identity() {
        let lens = Fisheye::new(pos2(0.0, 0.0), 230.0, 0.0);
        let point = pos2(12.0, 5.0);
        assert_eq!(lens.apply(point), point);
    }
}
