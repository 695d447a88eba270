//! Point transformation between registered CRSs.
//!
//! Every transform pivots through geographic lon/lat: the source definition
//! converts to lon/lat, the target converts from it. Same-CRS transforms
//! short-circuit to the identity once both identifiers are known.

use std::sync::Arc;

use raster_common::{Result, ScenarioError};

use crate::registry::{CrsDefinition, CrsRegistry};
use crate::Point;

/// Converts coordinates between CRSs known to a [`CrsRegistry`].
#[derive(Debug, Clone)]
pub struct CoordinateTransformer {
    registry: Arc<CrsRegistry>,
}

impl CoordinateTransformer {
    pub fn new(registry: Arc<CrsRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &CrsRegistry {
        &self.registry
    }

    /// Resolve both identifiers once for repeated transforms.
    ///
    /// Fails with `UnknownCrs` if either identifier is not registered.
    pub fn pipeline(&self, source: &str, target: &str) -> Result<TransformPipeline> {
        let src = self.registry.resolve(source)?;
        let dst = self.registry.resolve(target)?;
        let identity = Arc::ptr_eq(&src, &dst);
        Ok(TransformPipeline {
            source: source.to_string(),
            target: target.to_string(),
            src,
            dst,
            identity,
        })
    }

    /// Transform a single point from `source` to `target`.
    pub fn transform(&self, point: Point, source: &str, target: &str) -> Result<Point> {
        self.pipeline(source, target)?.apply(point)
    }

    /// Transform a sequence of points, preserving order and count.
    ///
    /// All or nothing: the first point outside the projection domain fails
    /// the whole batch.
    pub fn transform_all(&self, points: &[Point], source: &str, target: &str) -> Result<Vec<Point>> {
        self.pipeline(source, target)?.apply_all(points)
    }
}

/// A resolved source/target pair.
#[derive(Debug, Clone)]
pub struct TransformPipeline {
    source: String,
    target: String,
    src: Arc<CrsDefinition>,
    dst: Arc<CrsDefinition>,
    identity: bool,
}

impl TransformPipeline {
    /// True when source and target resolve to the same definition.
    pub fn is_identity(&self) -> bool {
        self.identity
    }

    pub fn apply(&self, (x, y): Point) -> Result<Point> {
        if self.identity {
            return Ok((x, y));
        }

        let out = self
            .src
            .to_geographic(x, y)
            .and_then(|(lon, lat)| self.dst.from_geographic(lon, lat));

        out.ok_or_else(|| {
            ScenarioError::invalid_projection(format!(
                "({}, {}) cannot be transformed from {} to {}",
                x, y, self.source, self.target
            ))
        })
    }

    pub fn apply_all(&self, points: &[Point]) -> Result<Vec<Point>> {
        points.iter().map(|p| self.apply(*p)).collect()
    }
}
