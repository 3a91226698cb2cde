//! The detected code's quadrilateral and the derived overlay geometry.

use super::{Point, Rect};

/// Four corner points in delivery order, forming a closed polygon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quad {
    corners: [Point; 4],
}

impl Quad {
    /// Wraps four ordered corners.
    pub const fn new(corners: [Point; 4]) -> Self {
        Self { corners }
    }

    /// The corners in delivery order.
    pub fn corners(&self) -> &[Point; 4] {
        &self.corners
    }

    /// Rotation applied to the focus indicator when snapping onto the code.
    ///
    /// The side used to measure the angle depends on the horizontal order of
    /// the first two corners; the division is left as-is so a vertical
    /// measuring side yields `atan(±inf) = ±π/2`. This asymmetry is the
    /// canonical behavior and is regression-tested; do not replace it with
    /// `atan2`.
    pub fn rotation_angle(&self) -> f64 {
        let c = &self.corners;
        let (a_side, b_side) = if c[0].x < c[1].x {
            (c[0].x - c[1].x, c[1].y - c[0].y)
        } else {
            (c[2].y - c[1].y, c[2].x - c[1].x)
        };
        (a_side / b_side).atan()
    }

    /// Side length of a square containing the quad, plus `2 × padding`.
    ///
    /// Starts from the closing edge `(corners[3], corners[0])` and keeps the
    /// maximum over the three adjacent edges.
    pub fn bounding_side(&self, padding: f64) -> f64 {
        let c = &self.corners;
        let mut max_side = c[3].distance_to(c[0]);
        for i in 0..3 {
            let side = c[i].distance_to(c[i + 1]);
            if side > max_side {
                max_side = side;
            }
        }
        max_side + padding * 2.0
    }

    /// Axis-aligned bounds of the closed polygon path.
    pub fn bounds(&self) -> Rect {
        let mut min_x = self.corners[0].x;
        let mut min_y = self.corners[0].y;
        let mut max_x = min_x;
        let mut max_y = min_y;
        for corner in &self.corners[1..] {
            min_x = min_x.min(corner.x);
            min_y = min_y.min(corner.y);
            max_x = max_x.max(corner.x);
            max_y = max_y.max(corner.y);
        }
        Rect::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }

    /// Translates every corner by the same offset.
    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        let mut corners = self.corners;
        for corner in &mut corners {
            corner.x += dx;
            corner.y += dy;
        }
        Self { corners }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::f64::consts::FRAC_PI_2;

    fn axis_aligned_square() -> Quad {
        Quad::new([
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        ])
    }

    #[test]
    fn test_vertical_measuring_side_hits_atan_infinity() {
        // corners[0].x < corners[1].x, so a = -10, b = 0 and the division
        // produces -inf; IEEE atan maps it to exactly -π/2.
        let angle = axis_aligned_square().rotation_angle();
        assert!((angle + FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn test_bounding_side_of_square_is_edge_plus_padding() {
        let quad = axis_aligned_square();
        assert!((quad.bounding_side(0.0) - 10.0).abs() < 1e-12);
        assert!((quad.bounding_side(8.0) - 26.0).abs() < 1e-12);
    }

    #[test]
    fn test_bounds_cover_all_corners() {
        let quad = Quad::new([
            Point::new(4.0, -2.0),
            Point::new(9.0, 1.0),
            Point::new(7.0, 8.0),
            Point::new(-1.0, 5.0),
        ]);
        let bounds = quad.bounds();
        assert_eq!(bounds, Rect::new(-1.0, -2.0, 10.0, 10.0));
    }

    prop_compose! {
        fn arb_point()(x in -1000.0..1000.0f64, y in -1000.0..1000.0f64) -> Point {
            Point::new(x, y)
        }
    }

    prop_compose! {
        fn arb_quad()(a in arb_point(), b in arb_point(), c in arb_point(), d in arb_point()) -> Quad {
            Quad::new([a, b, c, d])
        }
    }

    proptest! {
        #[test]
        fn prop_bounding_side_dominates_measured_edges(quad in arb_quad(), padding in 0.0..100.0f64) {
            let side = quad.bounding_side(padding);
            let c = quad.corners();
            let measured = [
                c[3].distance_to(c[0]),
                c[0].distance_to(c[1]),
                c[1].distance_to(c[2]),
                c[2].distance_to(c[3]),
            ];
            for edge in measured {
                prop_assert!(side + 1e-9 >= edge + padding * 2.0);
            }
            let longest = measured.iter().cloned().fold(f64::MIN, f64::max);
            prop_assert!((side - (longest + padding * 2.0)).abs() < 1e-9);
        }

        #[test]
        fn prop_rotation_angle_is_translation_invariant(
            quad in arb_quad(),
            dx in -500.0..500.0f64,
            dy in -500.0..500.0f64,
        ) {
            // Keep the measuring side away from vertical: right at b = 0 the
            // quotient flips between ±inf and the sign of the angle with it.
            let c = quad.corners();
            let b_side = if c[0].x < c[1].x { c[1].y - c[0].y } else { c[2].x - c[1].x };
            prop_assume!(b_side.abs() > 1e-3);
            // And away from the branch boundary, where translation rounding
            // could switch which side gets measured.
            prop_assume!((c[0].x - c[1].x).abs() > 1e-3);

            let moved = quad.translated(dx, dy);
            prop_assert!((quad.rotation_angle() - moved.rotation_angle()).abs() < 1e-6);
        }
    }
}
