//! Axis-aligned plan (x, y) bounding boxes.
//!
//! Envelopes are the currency of the spatial indexes: every indexed record
//! and every query is an `Envelope`. Degenerate boxes (points, vertical or
//! horizontal segments) are legal and behave as closed sets.

use crate::geom::point::Point;
use crate::geom::EPS;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Envelope {
    /// Envelope of the plan projections of two points, in any corner order.
    pub fn new(p1: &Point, p2: &Point) -> Self {
        Self::from_bounds(p1.x, p1.y, p2.x, p2.y)
    }

    /// Normalizes corner order without using `f64::min`/`max`, which
    /// would drop a NaN operand; the ordered comparison is false for
    /// NaN, so a non-finite coordinate survives into the result and
    /// `is_finite` can reject it.
    pub fn from_bounds(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        let (min_x, max_x) = if min_x <= max_x {
            (min_x, max_x)
        } else {
            (max_x, min_x)
        };
        let (min_y, max_y) = if min_y <= max_y {
            (min_y, max_y)
        } else {
            (max_y, min_y)
        };
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Envelope of a nonempty point set. Returns `None` for an empty slice.
    pub fn of_points(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let mut env = Envelope::new(first, first);
        for p in &points[1..] {
            env.expand_to_include(p);
        }
        Some(env)
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn centre(&self) -> Point {
        Point::new_2d(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Closed-set intersection test with a small tolerance, so envelopes
    /// sharing only an edge or a corner still count as intersecting.
    pub fn intersects(&self, other: &Self) -> bool {
        self.min_x <= other.max_x + EPS
            && other.min_x <= self.max_x + EPS
            && self.min_y <= other.max_y + EPS
            && other.min_y <= self.max_y + EPS
    }

    pub fn contains_envelope(&self, other: &Self) -> bool {
        self.min_x - EPS <= other.min_x
            && self.min_y - EPS <= other.min_y
            && other.max_x <= self.max_x + EPS
            && other.max_y <= self.max_y + EPS
    }

    pub fn contains_point_2d(&self, p: &Point) -> bool {
        self.min_x - EPS <= p.x
            && p.x <= self.max_x + EPS
            && self.min_y - EPS <= p.y
            && p.y <= self.max_y + EPS
    }

    pub fn expand_to_include(&mut self, p: &Point) {
        self.min_x = self.min_x.min(p.x);
        self.min_y = self.min_y.min(p.y);
        self.max_x = self.max_x.max(p.x);
        self.max_y = self.max_y.max(p.y);
    }

    pub fn is_finite(&self) -> bool {
        self.min_x.is_finite()
            && self.min_y.is_finite()
            && self.max_x.is_finite()
            && self.max_y.is_finite()
    }

    /// The four quadrants of this envelope, in SW, SE, NW, NE order.
    pub fn quadrants(&self) -> [Envelope; 4] {
        let cx = (self.min_x + self.max_x) / 2.0;
        let cy = (self.min_y + self.max_y) / 2.0;
        [
            Envelope::from_bounds(self.min_x, self.min_y, cx, cy),
            Envelope::from_bounds(cx, self.min_y, self.max_x, cy),
            Envelope::from_bounds(self.min_x, cy, cx, self.max_y),
            Envelope::from_bounds(cx, cy, self.max_x, self.max_y),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corner_order_normalized() {
        let e = Envelope::new(&Point::new_2d(5., 1.), &Point::new_2d(2., 7.));
        assert_eq!(e, Envelope::from_bounds(2., 1., 5., 7.));
        assert!((e.width() - 3.0).abs() < EPS);
        assert!((e.height() - 6.0).abs() < EPS);
    }

    #[test]
    fn test_intersects() {
        let a = Envelope::from_bounds(0., 0., 5., 5.);
        let b = Envelope::from_bounds(4., 4., 9., 9.);
        let c = Envelope::from_bounds(6., 0., 9., 4.);
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
        assert!(!a.intersects(&c));
        // Touching along an edge counts as intersecting
        let d = Envelope::from_bounds(5., 0., 9., 5.);
        assert!(a.intersects(&d));
    }

    #[test]
    fn test_degenerate_envelope() {
        let p = Point::new_2d(3., 3.);
        let e = Envelope::new(&p, &p);
        assert!(e.width().abs() < EPS && e.height().abs() < EPS);
        assert!(e.intersects(&Envelope::from_bounds(0., 0., 5., 5.)));
        assert!(e.contains_point_2d(&p));
    }

    #[test]
    fn test_nan_coordinate_survives_normalization() {
        let e = Envelope::from_bounds(0., 0., f64::NAN, 5.);
        assert!(e.max_x.is_nan() || e.min_x.is_nan());
        assert!(!e.is_finite());

        let e = Envelope::new(&Point::new_2d(f64::NAN, 1.), &Point::new_2d(3., 4.));
        assert!(!e.is_finite());

        let e = Envelope::from_bounds(0., f64::INFINITY, 5., 1.);
        assert!(!e.is_finite());
    }

    #[test]
    fn test_of_points() {
        let pts = [
            Point::new_2d(1., 8.),
            Point::new_2d(4., 2.),
            Point::new_2d(-1., 5.),
        ];
        let e = Envelope::of_points(&pts).unwrap();
        assert_eq!(e, Envelope::from_bounds(-1., 2., 4., 8.));
        assert!(Envelope::of_points(&[]).is_none());
    }

    #[test]
    fn test_quadrants_cover_parent() {
        let e = Envelope::from_bounds(0., 0., 10., 10.);
        let q = e.quadrants();
        assert_eq!(q[0], Envelope::from_bounds(0., 0., 5., 5.));
        assert_eq!(q[3], Envelope::from_bounds(5., 5., 10., 10.));
        for sub in &q {
            assert!(e.contains_envelope(sub));
        }
    }
}
