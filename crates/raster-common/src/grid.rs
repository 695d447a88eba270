//! Single-band geo-referenced raster grids.

use crate::error::{Result, ScenarioError};
use crate::{AffineTransform, BoundingBox, SampleFormat};

/// A single-band, regular, affine-aligned raster.
///
/// Cells are stored row-major (row 0 first) as `f64` regardless of the
/// on-disk sample format; `sample_format` records the storage type the grid
/// was loaded from and is the default target when it is encoded again.
///
/// A grid is immutable once constructed. Editing produces a new grid through
/// [`RasterGrid::with_cells`], which keeps earlier grids safe to share between
/// threads without locking.
#[derive(Debug, Clone)]
pub struct RasterGrid {
    width: usize,
    height: usize,
    cells: Vec<f64>,
    transform: AffineTransform,
    no_data: Option<f64>,
    crs: String,
    sample_format: SampleFormat,
}

impl RasterGrid {
    /// Create a grid, validating the shape invariants.
    ///
    /// Fails with `MalformedRaster` when either dimension is zero, the cell
    /// count does not match `width * height`, or the CRS identifier is empty.
    pub fn new(
        width: usize,
        height: usize,
        cells: Vec<f64>,
        transform: AffineTransform,
        no_data: Option<f64>,
        crs: impl Into<String>,
    ) -> Result<Self> {
        let crs = crs.into();

        if width == 0 || height == 0 {
            return Err(ScenarioError::malformed(format!(
                "grid dimensions must be positive, got {}x{}",
                width, height
            )));
        }

        let expected = width.checked_mul(height).ok_or_else(|| {
            ScenarioError::malformed(format!("grid dimensions {}x{} overflow", width, height))
        })?;

        if cells.len() != expected {
            return Err(ScenarioError::malformed(format!(
                "expected {} cells for a {}x{} grid, got {}",
                expected,
                width,
                height,
                cells.len()
            )));
        }

        if crs.trim().is_empty() {
            return Err(ScenarioError::malformed("grid has no CRS identifier"));
        }

        Ok(Self {
            width,
            height,
            cells,
            transform,
            no_data,
            crs,
            sample_format: SampleFormat::default(),
        })
    }

    /// Grid filled with a single value.
    pub fn filled(
        width: usize,
        height: usize,
        value: f64,
        transform: AffineTransform,
        no_data: Option<f64>,
        crs: impl Into<String>,
    ) -> Result<Self> {
        let len = width.checked_mul(height).unwrap_or(0);
        Self::new(width, height, vec![value; len], transform, no_data, crs)
    }

    /// Set the storage type used when this grid is encoded.
    pub fn with_sample_format(mut self, sample_format: SampleFormat) -> Self {
        self.sample_format = sample_format;
        self
    }

    /// Derived copy with the same header and new cell values.
    ///
    /// Fails with `InvalidIndex` when `cells` has the wrong length.
    pub fn with_cells(&self, cells: Vec<f64>) -> Result<Self> {
        if cells.len() != self.cells.len() {
            return Err(ScenarioError::invalid_index(format!(
                "replacement buffer has {} cells, grid has {}",
                cells.len(),
                self.cells.len()
            )));
        }
        Ok(Self {
            width: self.width,
            height: self.height,
            cells,
            transform: self.transform,
            no_data: self.no_data,
            crs: self.crs.clone(),
            sample_format: self.sample_format,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Always false for a constructed grid; present for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Row-major cell values.
    pub fn cells(&self) -> &[f64] {
        &self.cells
    }

    pub fn transform(&self) -> &AffineTransform {
        &self.transform
    }

    pub fn no_data(&self) -> Option<f64> {
        self.no_data
    }

    /// Native CRS identifier.
    pub fn crs(&self) -> &str {
        &self.crs
    }

    pub fn sample_format(&self) -> SampleFormat {
        self.sample_format
    }

    /// True when `value` is the no-data sentinel (NaN sentinels match NaN).
    pub fn is_no_data(&self, value: f64) -> bool {
        match self.no_data {
            Some(nd) if nd.is_nan() => value.is_nan(),
            Some(nd) => value == nd,
            None => false,
        }
    }

    /// Flat row-major index of (col, row).
    pub fn index(&self, col: usize, row: usize) -> Result<usize> {
        if col >= self.width || row >= self.height {
            return Err(ScenarioError::invalid_index(format!(
                "cell ({}, {}) outside {}x{} grid",
                col, row, self.width, self.height
            )));
        }
        Ok(row * self.width + col)
    }

    /// Value at (col, row).
    pub fn get(&self, col: usize, row: usize) -> Result<f64> {
        self.index(col, row).map(|i| self.cells[i])
    }

    /// Value at (col, row), or `None` if it is no-data.
    pub fn value(&self, col: usize, row: usize) -> Result<Option<f64>> {
        let v = self.get(col, row)?;
        Ok(if self.is_no_data(v) { None } else { Some(v) })
    }

    /// CRS coordinates of the center of (col, row).
    pub fn cell_center(&self, col: usize, row: usize) -> Result<(f64, f64)> {
        self.index(col, row)?;
        Ok(self.transform.pixel_center(col, row))
    }

    /// Cell containing the CRS coordinate `(x, y)`, if it lies on the grid.
    pub fn coord_to_index(&self, x: f64, y: f64) -> Option<(usize, usize)> {
        let (col, row) = self.transform.invert(x, y);
        if !col.is_finite() || !row.is_finite() || col < 0.0 || row < 0.0 {
            return None;
        }
        let (col, row) = (col.floor() as usize, row.floor() as usize);
        if col >= self.width || row >= self.height {
            return None;
        }
        Some((col, row))
    }

    /// Extent of the grid in its native CRS.
    pub fn bounds(&self) -> BoundingBox {
        self.transform.bounds(self.width, self.height)
    }

    /// True when the grid has exactly these dimensions.
    pub fn same_shape(&self, width: usize, height: usize) -> bool {
        self.width == width && self.height == height
    }

    /// Number of cells holding the no-data sentinel.
    pub fn no_data_count(&self) -> usize {
        if self.no_data.is_none() {
            return 0;
        }
        self.cells.iter().filter(|v| self.is_no_data(**v)).count()
    }
}

fn same_value(a: f64, b: f64) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}

impl PartialEq for RasterGrid {
    fn eq(&self, other: &Self) -> bool {
        let no_data_eq = match (self.no_data, other.no_data) {
            (Some(a), Some(b)) => same_value(a, b),
            (None, None) => true,
            _ => false,
        };

        self.width == other.width
            && self.height == other.height
            && self.transform == other.transform
            && self.crs == other.crs
            && self.sample_format == other.sample_format
            && no_data_eq
            && self
                .cells
                .iter()
                .zip(&other.cells)
                .all(|(a, b)| same_value(*a, *b))
    }
}
