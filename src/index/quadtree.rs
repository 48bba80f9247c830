//! Quadtree index rooted at the scene envelope.
//!
//! Each record lives in exactly one node: the smallest quadrant that
//! fully contains its envelope. Records straddling a quadrant split stay
//! at the straddling node, and records outside the root envelope stay at
//! the root, so queries can never miss a record by pruning too early.

use crate::error::CityNoiseError;
use crate::geom::envelope::Envelope;
use crate::index::{check_query_envelope, IndexedRecord, SpatialIndex};

const NODE_CAPACITY: usize = 8;
const MAX_DEPTH: usize = 10;

struct QuadNode {
    envelope: Envelope,
    records: Vec<IndexedRecord>,
    children: Option<Box<[QuadNode; 4]>>,
}

impl QuadNode {
    fn new(envelope: Envelope) -> Self {
        Self {
            envelope,
            records: Vec::new(),
            children: None,
        }
    }

    fn insert(&mut self, record: IndexedRecord, depth: usize) {
        if self.children.is_none() && self.records.len() >= NODE_CAPACITY && depth < MAX_DEPTH {
            self.subdivide(depth);
        }
        if let Some(children) = self.children.as_mut() {
            for child in children.iter_mut() {
                if child.envelope.contains_envelope(&record.envelope) {
                    child.insert(record, depth + 1);
                    return;
                }
            }
        }
        // Straddles the split, or this is a leaf
        self.records.push(record);
    }

    fn subdivide(&mut self, depth: usize) {
        let quadrants = self.envelope.quadrants();
        self.children = Some(Box::new(quadrants.map(QuadNode::new)));
        let kept = std::mem::take(&mut self.records);
        for record in kept {
            self.insert(record, depth);
        }
    }

    fn query(&self, envelope: &Envelope, out: &mut Vec<usize>) {
        // Own records are always scanned: straddlers and out-of-root
        // records are not bounded by this node's envelope.
        for rec in &self.records {
            if rec.envelope.intersects(envelope) {
                out.push(rec.id);
            }
        }
        if let Some(children) = self.children.as_ref() {
            for child in children.iter() {
                if child.envelope.intersects(envelope) {
                    child.query(envelope, out);
                }
            }
        }
    }
}

pub struct QuadTreeIndex {
    root: QuadNode,
}

impl QuadTreeIndex {
    pub fn new(scene_envelope: Envelope) -> Self {
        Self {
            root: QuadNode::new(scene_envelope),
        }
    }
}

impl SpatialIndex for QuadTreeIndex {
    fn insert(&mut self, envelope: Envelope, id: usize) {
        self.root.insert(IndexedRecord { id, envelope }, 0);
    }

    fn query(&self, envelope: &Envelope) -> Result<Vec<usize>, CityNoiseError> {
        check_query_envelope(envelope)?;
        let mut out = Vec::new();
        self.root.query(envelope, &mut out);
        Ok(out)
    }
}
