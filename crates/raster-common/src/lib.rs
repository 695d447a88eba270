//! Common types shared across the raster scenario workspace.

pub mod affine;
pub mod bbox;
pub mod error;
pub mod grid;
pub mod mask;
pub mod sample;

pub use affine::AffineTransform;
pub use bbox::BoundingBox;
pub use error::{Result, ScenarioError};
pub use grid::RasterGrid;
pub use mask::Mask;
pub use sample::SampleFormat;
