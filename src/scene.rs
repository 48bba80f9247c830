//! Scene triangulation builder.
//!
//! The builder has two phases. While mutable, `add_geometry` collects
//! validated building footprints. `finish_polygon_feeding` then clips
//! every footprint to the scene envelope, triangulates the whole plan
//! with the footprint edges as constraints, tags each triangle with the
//! height of its covering building, and freezes the result into an
//! [`ObstructionEngine`](crate::engine::ObstructionEngine).

use crate::engine::ObstructionEngine;
use crate::error::CityNoiseError;
use crate::geom::delaunay::{triangulate_constrained, EdgeKey};
use crate::geom::envelope::Envelope;
use crate::geom::point::Point;
use crate::geom::segment::{point_in_ring, segments_intersect_2d};
use crate::geom::triangle::Triangle;
use crate::geom::EPS;
use crate::index::{new_index, IndexKind};
use std::collections::HashMap;
use std::mem;

/// How a triangle covered by several footprints picks its height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlapPolicy {
    /// The tallest covering building wins.
    #[default]
    HigherWins,
    /// The most recently fed covering building wins.
    LastWins,
}

struct Building {
    footprint: Vec<Point>,
    height: f64,
}

pub struct SceneBuilder {
    buildings: Vec<Building>,
    overlap: OverlapPolicy,
    finished: bool,
}

impl Default for SceneBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneBuilder {
    pub fn new() -> Self {
        Self {
            buildings: Vec::new(),
            overlap: OverlapPolicy::default(),
            finished: false,
        }
    }

    pub fn with_overlap_policy(mut self, policy: OverlapPolicy) -> Self {
        self.overlap = policy;
        self
    }

    /// Feeds one building footprint. The footprint is a plan ring given
    /// in either winding order; a repeated closing vertex is accepted
    /// and dropped. z coordinates of the ring are ignored.
    pub fn add_geometry(&mut self, footprint: &[Point], height: f64) -> Result<(), CityNoiseError> {
        if self.finished {
            return Err(CityNoiseError::AlreadyFinished);
        }
        if !height.is_finite() || height < 0.0 {
            return Err(CityNoiseError::InvalidHeight(height));
        }

        let mut ring: Vec<Point> = footprint.to_vec();
        if ring.len() >= 2 && ring[0].is_close(&ring[ring.len() - 1]) {
            ring.pop();
        }
        // Collapse consecutive duplicates
        ring.dedup_by(|a, b| a.is_close(b));

        if ring.len() < 3 {
            return Err(CityNoiseError::InvalidGeometry(format!(
                "footprint needs at least 3 distinct vertices, got {}",
                ring.len()
            )));
        }
        for p in &ring {
            if !p.is_finite() {
                return Err(CityNoiseError::InvalidGeometry(format!(
                    "non-finite footprint vertex {p}"
                )));
            }
        }
        let n = ring.len();
        for i in 0..n {
            for j in i + 1..n {
                // Adjacent edges share a vertex and may touch
                if j == i + 1 || (i == 0 && j == n - 1) {
                    continue;
                }
                let (a1, a2) = (&ring[i], &ring[(i + 1) % n]);
                let (b1, b2) = (&ring[j], &ring[(j + 1) % n]);
                if segments_intersect_2d(a1, a2, b1, b2) {
                    return Err(CityNoiseError::InvalidGeometry(format!(
                        "self-intersecting footprint (edges {i} and {j} cross)"
                    )));
                }
            }
        }

        self.buildings.push(Building {
            footprint: ring,
            height,
        });
        Ok(())
    }

    /// Freezes the scene. Consumes the fed footprints, leaves the
    /// builder finished (a second call fails with `AlreadyFinished`).
    pub fn finish_polygon_feeding(
        &mut self,
        scene_envelope: Envelope,
        index: IndexKind,
    ) -> Result<ObstructionEngine, CityNoiseError> {
        if self.finished {
            return Err(CityNoiseError::AlreadyFinished);
        }
        if !scene_envelope.is_finite() {
            return Err(CityNoiseError::InvalidEnvelope(
                "scene envelope must be finite".into(),
            ));
        }
        if scene_envelope.width() < EPS || scene_envelope.height() < EPS {
            return Err(CityNoiseError::InvalidEnvelope(
                "scene envelope must have positive area".into(),
            ));
        }
        self.finished = true;
        let buildings = mem::take(&mut self.buildings);

        // Clip footprints to the scene; fully-outside buildings vanish
        let mut clipped: Vec<(Vec<Point>, f64)> = Vec::new();
        for b in &buildings {
            let ring = clip_ring_to_envelope(&b.footprint, &scene_envelope);
            if ring.len() >= 3 {
                clipped.push((ring, b.height));
            }
        }

        // Triangulation points: scene corners plus every clipped vertex,
        // deduplicated on quantized coordinates so shared corners map to
        // one index
        let mut points: Vec<Point> = Vec::new();
        let mut by_key: HashMap<(i64, i64), usize> = HashMap::new();
        let mut intern = |p: Point, points: &mut Vec<Point>| -> usize {
            let key = ((p.x * 1e9).round() as i64, (p.y * 1e9).round() as i64);
            *by_key.entry(key).or_insert_with(|| {
                points.push(Point::new_2d(p.x, p.y));
                points.len() - 1
            })
        };
        for corner in [
            Point::new_2d(scene_envelope.min_x, scene_envelope.min_y),
            Point::new_2d(scene_envelope.max_x, scene_envelope.min_y),
            Point::new_2d(scene_envelope.max_x, scene_envelope.max_y),
            Point::new_2d(scene_envelope.min_x, scene_envelope.max_y),
        ] {
            intern(corner, &mut points);
        }

        let mut constraints: Vec<[usize; 2]> = Vec::new();
        let mut rings: Vec<(Vec<usize>, f64)> = Vec::new();
        for (ring, height) in &clipped {
            let ids: Vec<usize> = ring.iter().map(|p| intern(*p, &mut points)).collect();
            let n = ids.len();
            for i in 0..n {
                let (a, b) = (ids[i], ids[(i + 1) % n]);
                if a != b {
                    constraints.push([a, b]);
                }
            }
            rings.push((ids, *height));
        }

        let (points, tri_indices, constraint_edges) = triangulate_constrained(points, constraints)?;

        // Ring vertex lists for centroid containment tests
        let ring_points: Vec<(Vec<Point>, f64)> = rings
            .iter()
            .map(|(ids, h)| (ids.iter().map(|&i| points[i]).collect(), *h))
            .collect();

        let mut triangles: Vec<Triangle> = Vec::with_capacity(tri_indices.len());
        for &[i, j, k] in &tri_indices {
            let flags = [
                constraint_edges.contains(&EdgeKey::new(i, j)),
                constraint_edges.contains(&EdgeKey::new(j, k)),
                constraint_edges.contains(&EdgeKey::new(k, i)),
            ];
            let tri = Triangle::new(points[i], points[j], points[k], 0.0, flags);
            let centroid = tri.centroid();
            let mut height = 0.0_f64;
            for (ring, h) in &ring_points {
                if point_in_ring(&centroid, ring) {
                    height = match self.overlap {
                        OverlapPolicy::HigherWins => height.max(*h),
                        OverlapPolicy::LastWins => *h,
                    };
                }
            }
            triangles.push(Triangle { source_height: height, ..tri });
        }

        let mut index = new_index(index, scene_envelope);
        for (id, tri) in triangles.iter().enumerate() {
            index.insert(tri.plan_envelope(), id);
        }

        // Clipped footprint corners raised to roof height become the
        // candidate bend points for diffracted paths
        let mut diffraction_nodes: Vec<Point> = Vec::new();
        for (ring, height) in &clipped {
            for p in ring {
                diffraction_nodes.push(Point::new(p.x, p.y, *height));
            }
        }

        log::debug!(
            "scene frozen: {} buildings ({} after clipping), {} triangles, {} diffraction nodes",
            buildings.len(),
            clipped.len(),
            triangles.len(),
            diffraction_nodes.len()
        );

        Ok(ObstructionEngine::new(
            triangles,
            index,
            scene_envelope,
            diffraction_nodes,
        ))
    }
}

/// Sutherland-Hodgman clipping of a plan ring against an axis-aligned
/// envelope. The result may be empty when the ring lies fully outside.
fn clip_ring_to_envelope(ring: &[Point], env: &Envelope) -> Vec<Point> {
    // Signed distance to each boundary, positive inside
    let sides: [fn(&Point, &Envelope) -> f64; 4] = [
        |p, e| p.x - e.min_x,
        |p, e| e.max_x - p.x,
        |p, e| p.y - e.min_y,
        |p, e| e.max_y - p.y,
    ];

    let mut current = ring.to_vec();
    for side in sides {
        if current.is_empty() {
            break;
        }
        let mut next = Vec::with_capacity(current.len() + 4);
        let n = current.len();
        for i in 0..n {
            let a = current[i];
            let b = current[(i + 1) % n];
            let da = side(&a, env);
            let db = side(&b, env);
            let a_in = da >= -EPS;
            let b_in = db >= -EPS;
            if a_in {
                next.push(a);
            }
            if a_in != b_in {
                let t = da / (da - db);
                next.push(a.lerp(&b, t));
            }
        }
        current = next;
    }
    current.dedup_by(|a, b| a.is_close(b));
    if current.len() >= 2 && current[0].is_close(&current[current.len() - 1]) {
        current.pop();
    }
    current
}
