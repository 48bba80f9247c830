pub mod delaunay;
pub mod envelope;
pub mod point;
pub mod segment;
pub mod triangle;
pub mod vector;

/// Geometric precision
pub(crate) const EPS: f64 = 1e-9;

/// Approximate scalar comparison with the crate-wide precision.
pub trait IsClose {
    fn is_close(&self, other: f64) -> bool;
}

impl IsClose for f64 {
    fn is_close(&self, other: f64) -> bool {
        (self - other).abs() < EPS
    }
}
