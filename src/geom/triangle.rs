//! Triangles of the frozen scene decomposition.
//!
//! A triangle lives in the plan; its `source_height` says whether it is
//! open ground (0) or covered by a building prism of that height. The
//! `constrained` flags mark which of its edges coincide with a building
//! wall, as opposed to an internal edge of the decomposition.

use crate::geom::envelope::Envelope;
use crate::geom::point::Point;
use crate::geom::segment::orient2d;
use crate::geom::EPS;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Triangle {
    pub a: Point,
    pub b: Point,
    pub c: Point,
    /// 0 for ground, the covering building's height otherwise.
    pub source_height: f64,
    /// Per-edge wall flags, in (a-b, b-c, c-a) order.
    pub constrained: [bool; 3],
}

impl Triangle {
    /// Builds a triangle with counter-clockwise plan orientation,
    /// reordering the vertices (and their edge flags) if needed.
    pub fn new(a: Point, b: Point, c: Point, source_height: f64, constrained: [bool; 3]) -> Self {
        if orient2d(&a, &b, &c) < 0.0 {
            // Swapping b and c reverses orientation; edge a-b becomes
            // a-c and vice versa, edge b-c keeps its flag.
            Self {
                a,
                b: c,
                c: b,
                source_height,
                constrained: [constrained[2], constrained[1], constrained[0]],
            }
        } else {
            Self {
                a,
                b,
                c,
                source_height,
                constrained,
            }
        }
    }

    pub fn plan_envelope(&self) -> Envelope {
        let mut env = Envelope::new(&self.a, &self.b);
        env.expand_to_include(&self.c);
        env
    }

    pub fn centroid(&self) -> Point {
        Point::new_2d(
            (self.a.x + self.b.x + self.c.x) / 3.0,
            (self.a.y + self.b.y + self.c.y) / 3.0,
        )
    }

    fn edges(&self) -> [(&Point, &Point); 3] {
        [(&self.a, &self.b), (&self.b, &self.c), (&self.c, &self.a)]
    }

    /// Strict plan interior test: the point must sit left of all three
    /// CCW edges by more than the tolerance, scaled by edge length.
    pub fn strictly_contains_plan(&self, p: &Point) -> bool {
        for (s, e) in self.edges() {
            let edge_len = s.distance_2d(e).max(EPS);
            if orient2d(s, e, p) / edge_len <= EPS {
                return false;
            }
        }
        true
    }

    /// Clips the plan segment p1 -> p2 against this triangle, treated as
    /// the intersection of its three CCW half-planes. Returns the
    /// parameter interval of the overlap, or `None` when the segment
    /// misses the triangle entirely.
    pub fn clip_plan_segment(&self, p1: &Point, p2: &Point) -> Option<(f64, f64)> {
        let mut t0 = 0.0_f64;
        let mut t1 = 1.0_f64;
        for (s, e) in self.edges() {
            // Signed distance to the edge line, positive inside
            let d1 = orient2d(s, e, p1);
            let d2 = orient2d(s, e, p2);
            if d1 < 0.0 && d2 < 0.0 {
                return None;
            }
            let denom = d1 - d2;
            if denom.abs() < EPS {
                continue; // Parallel to the edge, fully on one side
            }
            let t = d1 / denom;
            if d1 < d2 {
                // Entering the half-plane
                t0 = t0.max(t);
            } else {
                // Leaving it
                t1 = t1.min(t);
            }
            if t0 > t1 + EPS {
                return None;
            }
        }
        Some((t0, t1.max(t0)))
    }

    /// True when `p` lies within tolerance of an edge of this triangle
    /// that is not a building wall.
    pub fn on_unconstrained_edge(&self, p: &Point) -> bool {
        for (i, (s, e)) in self.edges().into_iter().enumerate() {
            if self.constrained[i] {
                continue;
            }
            let edge_len = s.distance_2d(e);
            if edge_len < EPS {
                continue;
            }
            if orient2d(s, e, p).abs() / edge_len > EPS {
                continue;
            }
            // On the line; check it falls within the edge span
            let t = ((p.x - s.x) * (e.x - s.x) + (p.y - s.y) * (e.y - s.y)) / (edge_len * edge_len);
            if (-EPS..=1.0 + EPS).contains(&t) {
                return true;
            }
        }
        false
    }
}
