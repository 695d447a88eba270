//! Coordinate reference system transformations.
//!
//! Implements a small set of closed-form map projections without external
//! dependencies. CRS identifiers resolve through an injectable
//! [`CrsRegistry`]; nothing here consults a global table or the network.

pub mod affine;
pub mod geographic;
pub mod lambert;
pub mod mercator;
pub mod registry;
pub mod transform;

pub use affine::AffineProjection;
pub use geographic::Geographic;
pub use lambert::LambertConformal;
pub use mercator::WebMercator;
pub use registry::{CrsDefinition, CrsRegistry, ProjectionParams};
pub use transform::{CoordinateTransformer, TransformPipeline};

/// A 2D coordinate pair `(x, y)`; longitude/latitude order for geographic CRSs.
pub type Point = (f64, f64);
