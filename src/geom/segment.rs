//! Plan-projection segment and ring predicates.

use crate::geom::point::Point;
use crate::geom::EPS;

/// Twice the signed area of the plan triangle (a, b, c).
/// Positive when c lies to the left of a -> b.
pub fn orient2d(a: &Point, b: &Point, c: &Point) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

/// Proper plan intersection of segments (p1, p2) and (q1, q2).
/// Shared endpoints and collinear touching do not count.
pub fn segments_intersect_2d(p1: &Point, p2: &Point, q1: &Point, q2: &Point) -> bool {
    let d1 = orient2d(q1, q2, p1);
    let d2 = orient2d(q1, q2, p2);
    let d3 = orient2d(p1, p2, q1);
    let d4 = orient2d(p1, p2, q2);
    d1 * d2 < -EPS && d3 * d4 < -EPS
}

/// Even-odd plan containment test against a closed ring (no repeated
/// closing vertex). Points on the boundary may report either way.
pub fn point_in_ring(p: &Point, ring: &[Point]) -> bool {
    let n = ring.len();
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (pi, pj) = (&ring[i], &ring[j]);
        if (pi.y > p.y) != (pj.y > p.y) {
            let x_cross = pi.x + (p.y - pi.y) / (pj.y - pi.y) * (pj.x - pi.x);
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Perpendicular plan distance from `p` to the infinite line through
/// `a` and `b`. Falls back to point distance for a degenerate line.
pub fn distance_point_to_line_2d(p: &Point, a: &Point, b: &Point) -> f64 {
    let len = a.distance_2d(b);
    if len < EPS {
        return p.distance_2d(a);
    }
    orient2d(a, b, p).abs() / len
}

/// Splits a polyline into regularly spaced points with spacing at most
/// `delta`. The actual spacing is regularized to `length / ceil(length /
/// delta)` so the points divide the polyline evenly. A polyline shorter
/// than `delta` collapses to its single midpoint. Spacing is measured in
/// the plan; z is interpolated along each edge.
pub fn split_polyline_regular(points: &[Point], delta: f64) -> Vec<Point> {
    if points.len() < 2 || delta <= 0.0 {
        return Vec::new();
    }
    let length: f64 = points
        .windows(2)
        .map(|w| w[0].distance_2d(&w[1]))
        .sum();
    if length < EPS {
        return Vec::new();
    }
    let step = if length < delta {
        length / 2.0
    } else {
        length / (length / delta).ceil()
    };

    let mut out = Vec::new();
    let mut to_next = step;
    for w in points.windows(2) {
        let (a, b) = (&w[0], &w[1]);
        let edge_len = a.distance_2d(b);
        if edge_len < EPS {
            continue;
        }
        let mut covered = 0.0;
        while covered + to_next <= edge_len + EPS {
            covered += to_next;
            out.push(a.lerp(b, covered / edge_len));
            to_next = step;
        }
        to_next -= edge_len - covered;
    }
    if length < delta {
        out.truncate(1);
    }
    out
}
