//! Spatial indexes over plan envelopes.
//!
//! Build-once, query-many: records are inserted while the scene is being
//! frozen and never move afterwards, so queries are pure reads and safe
//! to fan out across threads.

pub mod grid;
pub mod quadtree;

use crate::error::CityNoiseError;
use crate::geom::envelope::Envelope;

/// A record as the index sees it: an opaque id and its plan envelope.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexedRecord {
    pub id: usize,
    pub envelope: Envelope,
}

/// Index variant selection at scene-freezing time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IndexKind {
    Grid { rows: usize, cols: usize },
    QuadTree,
}

/// Common capability of the index variants. Queries are conservative:
/// they return a superset of the records whose envelope intersects the
/// query envelope, each id at most once, in unspecified order.
pub trait SpatialIndex: Send + Sync {
    fn insert(&mut self, envelope: Envelope, id: usize);

    fn query(&self, envelope: &Envelope) -> Result<Vec<usize>, CityNoiseError>;
}

pub(crate) fn new_index(kind: IndexKind, scene_envelope: Envelope) -> Box<dyn SpatialIndex> {
    match kind {
        IndexKind::Grid { rows, cols } => {
            Box::new(grid::GridIndex::new(scene_envelope, rows, cols))
        }
        IndexKind::QuadTree => Box::new(quadtree::QuadTreeIndex::new(scene_envelope)),
    }
}

pub(crate) fn check_query_envelope(envelope: &Envelope) -> Result<(), CityNoiseError> {
    if envelope.is_finite() {
        Ok(())
    } else {
        Err(CityNoiseError::InvalidEnvelope(format!(
            "non-finite query bounds ({}, {}) - ({}, {})",
            envelope.min_x, envelope.min_y, envelope.max_x, envelope.max_y
        )))
    }
}
