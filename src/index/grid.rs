//! Fixed grid index: the scene envelope cut into `rows` x `cols` cells.
//!
//! A record is registered in every cell its envelope overlaps, so a
//! query only has to visit the cells under the query envelope and
//! deduplicate. Best when record envelopes are small relative to the
//! cell size; degenerates gracefully (everything in one cell) otherwise.

use crate::error::CityNoiseError;
use crate::geom::envelope::Envelope;
use crate::index::{check_query_envelope, IndexedRecord, SpatialIndex};
use std::collections::HashSet;

pub struct GridIndex {
    envelope: Envelope,
    rows: usize,
    cols: usize,
    cells: Vec<Vec<IndexedRecord>>,
}

impl GridIndex {
    pub fn new(envelope: Envelope, rows: usize, cols: usize) -> Self {
        let rows = rows.max(1);
        let cols = cols.max(1);
        Self {
            envelope,
            rows,
            cols,
            cells: vec![Vec::new(); rows * cols],
        }
    }

    /// Inclusive (col, row) ranges of the cells overlapped by `env`,
    /// clamped into the grid.
    fn cell_range(&self, env: &Envelope) -> (usize, usize, usize, usize) {
        let cell_w = (self.envelope.width() / self.cols as f64).max(f64::MIN_POSITIVE);
        let cell_h = (self.envelope.height() / self.rows as f64).max(f64::MIN_POSITIVE);
        let to_col = |x: f64| {
            (((x - self.envelope.min_x) / cell_w).floor() as isize)
                .clamp(0, self.cols as isize - 1) as usize
        };
        let to_row = |y: f64| {
            (((y - self.envelope.min_y) / cell_h).floor() as isize)
                .clamp(0, self.rows as isize - 1) as usize
        };
        (
            to_col(env.min_x),
            to_col(env.max_x),
            to_row(env.min_y),
            to_row(env.max_y),
        )
    }
}

impl SpatialIndex for GridIndex {
    fn insert(&mut self, envelope: Envelope, id: usize) {
        let (c0, c1, r0, r1) = self.cell_range(&envelope);
        for row in r0..=r1 {
            for col in c0..=c1 {
                self.cells[row * self.cols + col].push(IndexedRecord { id, envelope });
            }
        }
    }

    fn query(&self, envelope: &Envelope) -> Result<Vec<usize>, CityNoiseError> {
        check_query_envelope(envelope)?;
        let (c0, c1, r0, r1) = self.cell_range(envelope);
        let mut seen: HashSet<usize> = HashSet::new();
        for row in r0..=r1 {
            for col in c0..=c1 {
                for rec in &self.cells[row * self.cols + col] {
                    if rec.envelope.intersects(envelope) {
                        seen.insert(rec.id);
                    }
                }
            }
        }
        Ok(seen.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::point::Point;

    fn scene() -> Envelope {
        Envelope::from_bounds(0., 0., 11., 11.)
    }

    fn seg_env(x1: f64, y1: f64, x2: f64, y2: f64) -> Envelope {
        Envelope::new(&Point::new_2d(x1, y1), &Point::new_2d(x2, y2))
    }

    #[test]
    fn test_query_returns_intersecting_records() -> anyhow::Result<()> {
        let mut index = GridIndex::new(scene(), 4, 4);
        index.insert(seg_env(2., 1., 7., 3.), 0);
        index.insert(seg_env(8., 3., 10., 1.), 1);
        index.insert(seg_env(2., 6., 7., 6.), 2);

        let mut hits = index.query(&seg_env(7., 2., 8., 3.))?;
        hits.sort_unstable();
        assert_eq!(hits, vec![0, 1]);

        let mut hits = index.query(&seg_env(7., 2., 8., 6.))?;
        hits.sort_unstable();
        assert_eq!(hits, vec![0, 1, 2]);
        Ok(())
    }

    #[test]
    fn test_no_duplicate_ids() -> anyhow::Result<()> {
        let mut index = GridIndex::new(scene(), 4, 4);
        // Envelope spanning many cells
        index.insert(seg_env(0., 0., 11., 11.), 7);
        let hits = index.query(&seg_env(1., 1., 10., 10.))?;
        assert_eq!(hits, vec![7]);
        Ok(())
    }

    #[test]
    fn test_boundary_clamping() -> anyhow::Result<()> {
        let mut index = GridIndex::new(scene(), 4, 4);
        // Touches the scene boundary exactly
        index.insert(seg_env(11., 11., 11., 11.), 3);
        let hits = index.query(&seg_env(10., 10., 11., 11.))?;
        assert_eq!(hits, vec![3]);
        Ok(())
    }

    #[test]
    fn test_non_finite_query_rejected() {
        let index = GridIndex::new(scene(), 4, 4);
        let bad = Envelope::from_bounds(0., 0., f64::NAN, 5.);
        assert!(matches!(
            index.query(&bad),
            Err(CityNoiseError::InvalidEnvelope(_))
        ));
    }
}
