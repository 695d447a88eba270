//! Affine geotransform between grid index space and CRS coordinates.
//!
//! Coefficients follow the GDAL ordering:
//!
//! ```text
//! x = c0 + col * c1 + row * c2
//! y = c3 + col * c4 + row * c5
//! ```
//!
//! For north-up rasters `c2` and `c4` are zero and `c5` is negative.

use nalgebra::Matrix3;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScenarioError};
use crate::BoundingBox;

/// An invertible 2D affine map from (col, row) to (x, y).
///
/// The inverse is computed once at construction, so a value of this type is
/// always invertible.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 6]", into = "[f64; 6]")]
pub struct AffineTransform {
    coeffs: [f64; 6],
    inverse: [f64; 6],
}

impl AffineTransform {
    /// Build a transform from GDAL-ordered coefficients.
    ///
    /// Fails with `MalformedRaster` when a coefficient is not finite or the
    /// linear part is singular.
    pub fn new(coeffs: [f64; 6]) -> Result<Self> {
        if coeffs.iter().any(|c| !c.is_finite()) {
            return Err(ScenarioError::malformed(format!(
                "affine transform has non-finite coefficients: {:?}",
                coeffs
            )));
        }

        let [c0, c1, c2, c3, c4, c5] = coeffs;
        let det = c1 * c5 - c2 * c4;
        let magnitude = (c1 * c5).abs() + (c2 * c4).abs();
        if det == 0.0 || det.abs() <= f64::EPSILON * magnitude {
            return Err(ScenarioError::malformed(format!(
                "affine transform is not invertible (determinant {})",
                det
            )));
        }

        let forward = Matrix3::new(c1, c2, c0, c4, c5, c3, 0.0, 0.0, 1.0);
        let inv = forward.try_inverse().ok_or_else(|| {
            ScenarioError::malformed("affine transform is not invertible".to_string())
        })?;

        Ok(Self {
            coeffs,
            inverse: [
                inv[(0, 2)],
                inv[(0, 0)],
                inv[(0, 1)],
                inv[(1, 2)],
                inv[(1, 0)],
                inv[(1, 1)],
            ],
        })
    }

    /// Identity mapping: x = col, y = row.
    pub fn identity() -> Self {
        Self {
            coeffs: [0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
            inverse: [0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
        }
    }

    /// North-up transform with no rotation.
    ///
    /// `pixel_height` is usually negative so that row 0 is the northern edge.
    pub fn north_up(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Result<Self> {
        Self::new([origin_x, pixel_width, 0.0, origin_y, 0.0, pixel_height])
    }

    /// GDAL-ordered coefficients.
    pub fn coefficients(&self) -> [f64; 6] {
        self.coeffs
    }

    /// Map fractional grid coordinates to CRS coordinates.
    pub fn apply(&self, col: f64, row: f64) -> (f64, f64) {
        let [c0, c1, c2, c3, c4, c5] = self.coeffs;
        (c0 + col * c1 + row * c2, c3 + col * c4 + row * c5)
    }

    /// Map CRS coordinates back to fractional (col, row).
    pub fn invert(&self, x: f64, y: f64) -> (f64, f64) {
        let [i0, i1, i2, i3, i4, i5] = self.inverse;
        (i0 + x * i1 + y * i2, i3 + x * i4 + y * i5)
    }

    /// Coordinates of the center of cell (col, row).
    pub fn pixel_center(&self, col: usize, row: usize) -> (f64, f64) {
        self.apply(col as f64 + 0.5, row as f64 + 0.5)
    }

    /// True when there is no rotation or shear term.
    pub fn is_rectilinear(&self) -> bool {
        self.coeffs[2] == 0.0 && self.coeffs[4] == 0.0
    }

    /// Extent covered by a `width` x `height` grid under this transform.
    pub fn bounds(&self, width: usize, height: usize) -> BoundingBox {
        let w = width as f64;
        let h = height as f64;
        let corners = [
            self.apply(0.0, 0.0),
            self.apply(w, 0.0),
            self.apply(0.0, h),
            self.apply(w, h),
        ];
        let mut bbox = BoundingBox::new(corners[0].0, corners[0].1, corners[0].0, corners[0].1);
        for (x, y) in &corners[1..] {
            bbox.include_point(*x, *y);
        }
        bbox
    }
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl TryFrom<[f64; 6]> for AffineTransform {
    type Error = ScenarioError;

    fn try_from(coeffs: [f64; 6]) -> Result<Self> {
        Self::new(coeffs)
    }
}

impl From<AffineTransform> for [f64; 6] {
    fn from(transform: AffineTransform) -> Self {
        transform.coeffs
    }
}
