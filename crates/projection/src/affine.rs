//! Synthetic affine CRS defined relative to geographic lon/lat.
//!
//! Useful for local engineering grids and for tests that need a CRS pair
//! with an exactly known relationship.

use raster_common::{AffineTransform, Result, ScenarioError};

use crate::Point;

/// `x = c0 + lon*c1 + lat*c2`, `y = c3 + lon*c4 + lat*c5`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineProjection {
    map: AffineTransform,
}

impl AffineProjection {
    /// Fails with `InvalidProjection` when the map is not invertible.
    pub fn new(coefficients: [f64; 6]) -> Result<Self> {
        let map = AffineTransform::new(coefficients).map_err(|_| {
            ScenarioError::invalid_projection(format!(
                "affine CRS coefficients {:?} are not invertible",
                coefficients
            ))
        })?;
        Ok(Self { map })
    }

    pub fn coefficients(&self) -> [f64; 6] {
        self.map.coefficients()
    }

    pub fn forward(&self, lon: f64, lat: f64) -> Option<Point> {
        let (x, y) = self.map.apply(lon, lat);
        (x.is_finite() && y.is_finite()).then_some((x, y))
    }

    pub fn inverse(&self, x: f64, y: f64) -> Option<Point> {
        let (lon, lat) = self.map.invert(x, y);
        (lon.is_finite() && lat.is_finite()).then_some((lon, lat))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaled_offset() {
        let proj = AffineProjection::new([1000.0, 100.0, 0.0, -50.0, 0.0, 200.0]).unwrap();
        assert_eq!(proj.forward(1.0, 2.0), Some((1100.0, 350.0)));

        let (lon, lat) = proj.inverse(1100.0, 350.0).unwrap();
        assert!((lon - 1.0).abs() < 1e-12);
        assert!((lat - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_singular_rejected() {
        let err = AffineProjection::new([0.0, 1.0, 1.0, 0.0, 1.0, 1.0]).unwrap_err();
        assert_eq!(err.kind(), "InvalidProjection");
    }
}
