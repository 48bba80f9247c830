//! Frozen obstruction engine: free-field tests and diffracted paths.
//!
//! The engine owns the triangulated scene and answers two questions:
//! does a straight segment between two points cross a building, and if
//! so, what is the shortest path that bends around building corners.
//! All state is immutable after freezing, so queries can run from any
//! number of threads at once.

use crate::error::CityNoiseError;
use crate::geom::envelope::Envelope;
use crate::geom::point::Point;
use crate::geom::segment::distance_point_to_line_2d;
use crate::geom::triangle::Triangle;
use crate::geom::EPS;
use crate::index::SpatialIndex;
use pathfinding::prelude::dijkstra;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Result of a propagation path query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObstructionPath {
    /// Diffracted minus direct distance; zero in free field.
    pub path_difference: f64,
    /// Largest perpendicular plan offset of a path bend from the
    /// direct source-receiver line; zero in free field.
    pub diffraction_shape_factor: f64,
    /// Straight-line 3-D distance from source to receiver.
    pub direct_distance: f64,
    /// Length of the shortest unobstructed path.
    pub diffracted_distance: f64,
}

/// Edge costs for the path search, in tenths of a micrometre.
fn edge_cost(distance: f64) -> u64 {
    (distance * 1e7).round() as u64
}

pub struct ObstructionEngine {
    triangles: Vec<Triangle>,
    index: Box<dyn SpatialIndex>,
    scene_envelope: Envelope,
    diffraction_nodes: Vec<Point>,
}

impl ObstructionEngine {
    pub(crate) fn new(
        triangles: Vec<Triangle>,
        index: Box<dyn SpatialIndex>,
        scene_envelope: Envelope,
        diffraction_nodes: Vec<Point>,
    ) -> Self {
        Self {
            triangles,
            index,
            scene_envelope,
            diffraction_nodes,
        }
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn scene_envelope(&self) -> Envelope {
        self.scene_envelope
    }

    /// True when the straight segment p1 -> p2 crosses no building.
    /// A building prism obstructs the full column above its footprint,
    /// so a segment passing over a roof is still obstructed; over-roof
    /// propagation is expressed through [`get_path`](Self::get_path)
    /// diffraction instead. Grazing contact through a corner or along a
    /// wall does not obstruct, which is what lets diffracted paths hug
    /// building edges.
    pub fn is_free_field(&self, p1: Point, p2: Point) -> bool {
        if !p1.is_finite() || !p2.is_finite() {
            return false;
        }
        let env = Envelope::new(&p1, &p2);
        // Endpoints are finite, so the envelope is too and the query
        // cannot fail; if it somehow does, err on the blocked side
        let Ok(candidates) = self.index.query(&env) else {
            return false;
        };
        let plan_len = p1.distance_2d(&p2);

        for id in candidates {
            let tri = &self.triangles[id];
            if tri.source_height <= 0.0 {
                continue; // Ground never blocks
            }
            if plan_len < EPS {
                // Vertical segment: blocked iff it stands inside a footprint
                if tri.strictly_contains_plan(&p1) {
                    return false;
                }
                continue;
            }
            if let Some((t0, t1)) = tri.clip_plan_segment(&p1, &p2) {
                if (t1 - t0) * plan_len <= EPS {
                    continue; // Corner graze
                }
                let mid = p1.lerp(&p2, (t0 + t1) / 2.0);
                // A positive-length overlap blocks unless it runs along
                // a wall (a constrained edge of the triangulation)
                if tri.strictly_contains_plan(&mid) || tri.on_unconstrained_edge(&mid) {
                    return false;
                }
            }
        }
        true
    }

    /// Shortest unobstructed path from `source` to `receiver`, bending
    /// around building corners raised to roof height. Fails with
    /// `NoPathFound` only when an endpoint is fully enclosed.
    pub fn get_path(
        &self,
        source: Point,
        receiver: Point,
    ) -> Result<ObstructionPath, CityNoiseError> {
        if !source.is_finite() || !receiver.is_finite() {
            return Err(CityNoiseError::InvalidEnvelope(format!(
                "non-finite query endpoints {source} and {receiver}"
            )));
        }
        let direct = source.distance(&receiver);
        if self.is_free_field(source, receiver) {
            return Ok(ObstructionPath {
                path_difference: 0.0,
                diffraction_shape_factor: 0.0,
                direct_distance: direct,
                diffracted_distance: direct,
            });
        }

        // Visibility graph: node 0 is the source, node 1 the receiver,
        // the rest are the scene's diffraction corners
        let mut nodes: Vec<Point> = Vec::with_capacity(self.diffraction_nodes.len() + 2);
        nodes.push(source);
        nodes.push(receiver);
        nodes.extend(self.diffraction_nodes.iter().copied());

        let (path, _cost) = dijkstra(
            &0_usize,
            |&i| {
                let from = nodes[i];
                nodes
                    .iter()
                    .enumerate()
                    .filter(|&(j, _)| j != i)
                    .filter(|&(_, p)| self.is_free_field(from, *p))
                    .map(|(j, p)| (j, edge_cost(from.distance(p))))
                    .collect::<Vec<_>>()
            },
            |&i| i == 1,
        )
        .ok_or(CityNoiseError::NoPathFound)?;

        // Re-accumulate the length in f64; the integer costs only drive
        // the search
        let diffracted: f64 = path
            .windows(2)
            .map(|w| nodes[w[0]].distance(&nodes[w[1]]))
            .sum();
        let bends: Vec<Point> = path[1..path.len() - 1].iter().map(|&i| nodes[i]).collect();

        Ok(ObstructionPath {
            path_difference: (diffracted - direct).max(0.0),
            diffraction_shape_factor: diffraction_shape_factor(&source, &receiver, &bends),
            direct_distance: direct,
            diffracted_distance: diffracted,
        })
    }

    /// Free-field tests for many pairs at once, fanned across threads.
    pub fn is_free_field_batch(&self, pairs: &[(Point, Point)]) -> Vec<bool> {
        pairs
            .par_iter()
            .map(|&(p1, p2)| self.is_free_field(p1, p2))
            .collect()
    }

    /// Path queries for many pairs at once, fanned across threads.
    pub fn get_path_batch(
        &self,
        pairs: &[(Point, Point)],
    ) -> Vec<Result<ObstructionPath, CityNoiseError>> {
        pairs
            .par_iter()
            .map(|&(source, receiver)| self.get_path(source, receiver))
            .collect()
    }
}

/// Largest perpendicular plan offset of the path bends from the direct
/// source-receiver line. Kept separate from the path search so the
/// shape measure can evolve independently of it.
fn diffraction_shape_factor(source: &Point, receiver: &Point, bends: &[Point]) -> f64 {
    bends
        .iter()
        .map(|p| distance_point_to_line_2d(p, source, receiver))
        .fold(0.0, f64::max)
}
