//! Error taxonomy for raster scenario operations.

use thiserror::Error;

/// Result type alias using ScenarioError.
pub type Result<T> = std::result::Result<T, ScenarioError>;

/// Errors returned by every component-level operation.
///
/// An operation either returns a complete, consistent result or one of these;
/// no partial grids or partially applied scenarios are ever handed back.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScenarioError {
    /// Header fields are missing or inconsistent, or the payload is truncated.
    #[error("malformed raster: {0}")]
    MalformedRaster(String),

    /// The header is valid but uses a sample format, layout or compression
    /// outside the supported subset.
    #[error("unsupported raster encoding: {0}")]
    UnsupportedEncoding(String),

    /// A CRS identifier was used that is not in the registry.
    #[error("unknown CRS: {0}")]
    UnknownCrs(String),

    /// Encoding would silently lose precision in the chosen sample format.
    #[error("precision loss: {0}")]
    PrecisionLoss(String),

    /// Cell access outside `[0, width) x [0, height)` or a shape mismatch.
    #[error("invalid index: {0}")]
    InvalidIndex(String),

    /// A projection definition is degenerate, or a coordinate falls outside
    /// the projection's domain.
    #[error("invalid projection: {0}")]
    InvalidProjection(String),
}

impl ScenarioError {
    /// Create a MalformedRaster error.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedRaster(msg.into())
    }

    /// Create an UnsupportedEncoding error.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::UnsupportedEncoding(msg.into())
    }

    /// Create an UnknownCrs error.
    pub fn unknown_crs(id: impl Into<String>) -> Self {
        Self::UnknownCrs(id.into())
    }

    /// Create a PrecisionLoss error.
    pub fn precision_loss(msg: impl Into<String>) -> Self {
        Self::PrecisionLoss(msg.into())
    }

    /// Create an InvalidIndex error.
    pub fn invalid_index(msg: impl Into<String>) -> Self {
        Self::InvalidIndex(msg.into())
    }

    /// Create an InvalidProjection error.
    pub fn invalid_projection(msg: impl Into<String>) -> Self {
        Self::InvalidProjection(msg.into())
    }

    /// Stable machine-readable code for surfacing the error kind to a user.
    pub fn kind(&self) -> &'static str {
        match self {
            ScenarioError::MalformedRaster(_) => "MalformedRaster",
            ScenarioError::UnsupportedEncoding(_) => "UnsupportedEncoding",
            ScenarioError::UnknownCrs(_) => "UnknownCRS",
            ScenarioError::PrecisionLoss(_) => "PrecisionLoss",
            ScenarioError::InvalidIndex(_) => "InvalidIndex",
            ScenarioError::InvalidProjection(_) => "InvalidProjection",
        }
    }
}
