//! Error types shared across the crate.
//!
//! Feeding errors (`InvalidGeometry`, `InvalidHeight`, `AlreadyFinished`) are
//! raised synchronously while the scene is mutable, so bad input can never
//! corrupt the frozen triangulation. Query-time failures are limited to
//! `InvalidEnvelope` and `NoPathFound`, keeping "no data" distinguishable
//! from "bad query".

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CityNoiseError {
    /// Footprint ring rejected at feeding time (too few distinct vertices,
    /// non-finite coordinates, or a self-intersecting ring).
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// Building height rejected at feeding time (negative or non-finite).
    #[error("invalid building height: {0}")]
    InvalidHeight(f64),

    /// Feeding attempted after the scene was frozen.
    #[error("scene already finished, no further feeding is allowed")]
    AlreadyFinished,

    /// Query or scene envelope is malformed (NaN or infinite coordinates).
    #[error("invalid envelope: {0}")]
    InvalidEnvelope(String),

    /// No diffracted path exists between source and receiver
    /// (fully enclosed endpoint).
    #[error("no propagation path found between source and receiver")]
    NoPathFound,
}
