//! Constrained plan triangulation.
//!
//! Bowyer-Watson incremental Delaunay over the point set, followed by
//! constraint recovery: any footprint edge missing from the result gets
//! its midpoint inserted and the triangulation is rebuilt, until every
//! constraint is an edge of the triangulation. Midpoint insertion
//! converges because each round halves the offending edges.

use crate::error::CityNoiseError;
use crate::geom::point::Point;
use crate::geom::segment::orient2d;
use crate::geom::EPS;
use std::collections::{HashMap, HashSet};

/// Undirected edge between two point indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeKey(pub [usize; 2]);

impl EdgeKey {
    pub fn new(i: usize, j: usize) -> Self {
        if i <= j {
            Self([i, j])
        } else {
            Self([j, i])
        }
    }
}

/// Working triangle with a cached circumcircle.
struct BwTri {
    v: [usize; 3],
    cx: f64,
    cy: f64,
    radius_sq: f64,
}

impl BwTri {
    fn new(v: [usize; 3], points: &[Point]) -> Option<Self> {
        let (cx, cy, radius_sq) = circumcircle(&points[v[0]], &points[v[1]], &points[v[2]])?;
        Some(Self {
            v,
            cx,
            cy,
            radius_sq,
        })
    }

    fn circumcircle_contains(&self, p: &Point) -> bool {
        let dx = p.x - self.cx;
        let dy = p.y - self.cy;
        dx * dx + dy * dy < self.radius_sq + EPS
    }
}

/// Plan circumcircle of three points, or `None` if they are collinear.
fn circumcircle(a: &Point, b: &Point, c: &Point) -> Option<(f64, f64, f64)> {
    let d = 2.0 * (a.x * (b.y - c.y) + b.x * (c.y - a.y) + c.x * (a.y - b.y));
    if d.abs() < EPS {
        return None;
    }
    let aa = a.x * a.x + a.y * a.y;
    let bb = b.x * b.x + b.y * b.y;
    let cc = c.x * c.x + c.y * c.y;
    let cx = (aa * (b.y - c.y) + bb * (c.y - a.y) + cc * (a.y - b.y)) / d;
    let cy = (aa * (c.x - b.x) + bb * (a.x - c.x) + cc * (b.x - a.x)) / d;
    let dx = a.x - cx;
    let dy = a.y - cy;
    Some((cx, cy, dx * dx + dy * dy))
}

/// Delaunay triangulation of the plan projection of `points`.
/// Returns vertex-index triples, or `None` when fewer than three
/// non-collinear points are given.
pub fn bowyer_watson(points: &[Point]) -> Option<Vec<[usize; 3]>> {
    let n = points.len();
    if n < 3 {
        return None;
    }

    // Super-triangle comfortably containing every input point
    let mut min_x = f64::INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    let span = (max_x - min_x).max(max_y - min_y).max(1.0);
    let mid_x = (min_x + max_x) / 2.0;
    let mid_y = (min_y + max_y) / 2.0;

    let mut all_points = points.to_vec();
    all_points.push(Point::new_2d(mid_x - 20.0 * span, mid_y - span));
    all_points.push(Point::new_2d(mid_x + 20.0 * span, mid_y - span));
    all_points.push(Point::new_2d(mid_x, mid_y + 20.0 * span));
    let super_v = [n, n + 1, n + 2];

    let mut triangles = vec![BwTri::new(super_v, &all_points)?];

    for pi in 0..n {
        let p = all_points[pi];

        // Triangles whose circumcircle swallows the new point
        let mut bad: Vec<usize> = Vec::new();
        for (ti, tri) in triangles.iter().enumerate() {
            if tri.circumcircle_contains(&p) {
                bad.push(ti);
            }
        }

        // Boundary of the cavity: edges used by exactly one bad triangle
        let mut edge_count: HashMap<EdgeKey, (usize, usize)> = HashMap::new();
        for &ti in &bad {
            let v = triangles[ti].v;
            for (i, j) in [(v[0], v[1]), (v[1], v[2]), (v[2], v[0])] {
                let entry = edge_count.entry(EdgeKey::new(i, j)).or_insert((0, i));
                entry.0 += 1;
                entry.1 = i; // Remember the directed origin for orientation
            }
        }

        for &ti in bad.iter().rev() {
            triangles.swap_remove(ti);
        }

        for (key, (count, origin)) in edge_count {
            if count != 1 {
                continue;
            }
            let [a, b] = key.0;
            let (a, b) = if origin == a { (a, b) } else { (b, a) };
            if let Some(tri) = BwTri::new([a, b, pi], &all_points) {
                triangles.push(tri);
            }
        }
    }

    let result: Vec<[usize; 3]> = triangles
        .iter()
        .filter(|t| !t.v.iter().any(|v| super_v.contains(v)))
        .filter(|t| {
            orient2d(
                &all_points[t.v[0]],
                &all_points[t.v[1]],
                &all_points[t.v[2]],
            )
            .abs()
                > EPS
        })
        .map(|t| t.v)
        .collect();

    if result.is_empty() {
        None
    } else {
        Some(result)
    }
}

const MAX_RECOVERY_ROUNDS: usize = 16;

/// Triangulates the plan and forces every `constraints` segment to be an
/// edge of the result, inserting constraint midpoints as needed. Returns
/// the final point set (inputs plus inserted midpoints), the triangle
/// index triples, and the set of edges that carry a constraint.
pub fn triangulate_constrained(
    mut points: Vec<Point>,
    mut constraints: Vec<[usize; 2]>,
) -> Result<(Vec<Point>, Vec<[usize; 3]>, HashSet<EdgeKey>), CityNoiseError> {
    let mut triangles = Vec::new();

    for round in 0..=MAX_RECOVERY_ROUNDS {
        triangles = bowyer_watson(&points).ok_or_else(|| {
            CityNoiseError::InvalidGeometry("triangulation failed: degenerate point set".into())
        })?;

        let mut present: HashSet<EdgeKey> = HashSet::new();
        for t in &triangles {
            present.insert(EdgeKey::new(t[0], t[1]));
            present.insert(EdgeKey::new(t[1], t[2]));
            present.insert(EdgeKey::new(t[2], t[0]));
        }

        let missing: Vec<usize> = constraints
            .iter()
            .enumerate()
            .filter(|(_, c)| !present.contains(&EdgeKey::new(c[0], c[1])))
            .map(|(i, _)| i)
            .collect();

        if missing.is_empty() {
            break;
        }
        if round == MAX_RECOVERY_ROUNDS {
            log::warn!(
                "constraint recovery incomplete after {} rounds ({} edges unresolved)",
                MAX_RECOVERY_ROUNDS,
                missing.len()
            );
            break;
        }

        // Split every unresolved constraint at its midpoint
        for &ci in missing.iter().rev() {
            let [i, j] = constraints[ci];
            let mid = points[i].lerp(&points[j], 0.5);
            let k = points.len();
            points.push(mid);
            constraints[ci] = [i, k];
            constraints.push([k, j]);
        }
    }

    let constraint_edges: HashSet<EdgeKey> = constraints
        .iter()
        .map(|c| EdgeKey::new(c[0], c[1]))
        .collect();

    Ok((points, triangles, constraint_edges))
}
