//! Geometric core for urban noise propagation.
//!
//! Feed building footprints into a [`SceneBuilder`], freeze it into an
//! [`ObstructionEngine`], then ask whether source-receiver segments are
//! in free field and what the shortest diffracted path around the
//! buildings is. The engine is immutable and thread-safe, built for
//! millions of independent queries against one frozen scene.

pub mod engine;
pub mod error;
pub mod geom;
pub mod index;
pub mod scene;

pub use engine::{ObstructionEngine, ObstructionPath};
pub use error::CityNoiseError;
pub use geom::envelope::Envelope;
pub use geom::point::Point;
pub use geom::vector::Vector;
pub use index::{IndexKind, SpatialIndex};
pub use scene::{OverlapPolicy, SceneBuilder};
