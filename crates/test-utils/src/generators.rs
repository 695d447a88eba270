//! Test data generators for creating synthetic raster data.
//!
//! These generators create predictable, verifiable test data patterns
//! that can be used across the test suite.

use raster_common::{AffineTransform, RasterGrid};

/// Creates a test grid with predictable values.
///
/// Each cell value is calculated as: `col * 1000 + row`
///
/// This makes it easy to verify that data is being read/written correctly
/// by checking that grid[row][col] == col * 1000 + row.
///
/// # Example
///
/// ```
/// use test_utils::create_test_grid;
///
/// let grid = create_test_grid(10, 5);
/// assert_eq!(grid.len(), 50);
/// assert_eq!(grid[0], 0.0);
/// assert_eq!(grid[1], 1000.0);
/// assert_eq!(grid[10], 1.0);
/// ```
pub fn create_test_grid(width: usize, height: usize) -> Vec<f64> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push((col * 1000 + row) as f64);
        }
    }
    data
}

/// Creates a gradient from `low` (top-left) to `high` (bottom-right).
pub fn create_gradient_grid(width: usize, height: usize, low: f64, high: f64) -> Vec<f64> {
    let span = (width + height).saturating_sub(2).max(1) as f64;
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let t = (col + row) as f64 / span;
            data.push(low + (high - low) * t);
        }
    }
    data
}

/// Creates a grid filled with a constant value.
pub fn create_constant_grid(width: usize, height: usize, value: f64) -> Vec<f64> {
    vec![value; width * height]
}

/// Replaces every `stride`-th cell (starting at 0) with `sentinel`.
pub fn with_no_data_stride(mut data: Vec<f64>, stride: usize, sentinel: f64) -> Vec<f64> {
    if stride == 0 {
        return data;
    }
    for v in data.iter_mut().step_by(stride) {
        *v = sentinel;
    }
    data
}

/// Wraps `cells` in a grid with an identity transform.
pub fn index_space_grid(
    width: usize,
    height: usize,
    cells: Vec<f64>,
    no_data: Option<f64>,
) -> RasterGrid {
    RasterGrid::new(
        width,
        height,
        cells,
        AffineTransform::identity(),
        no_data,
        crate::fixtures::crs::LOCAL,
    )
    .expect("generated grid is valid")
}

/// Deterministic pseudo-random values in `[0, scale)` from a seed.
pub fn create_noise_grid(width: usize, height: usize, seed: u32, scale: f64) -> Vec<f64> {
    let mut state = seed.wrapping_mul(2_654_435_761).wrapping_add(1);
    let mut data = Vec::with_capacity(width * height);
    for _ in 0..width * height {
        // xorshift32
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        data.push(state as f64 / u32::MAX as f64 * scale);
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_test_grid() {
        let grid = create_test_grid(10, 5);
        assert_eq!(grid.len(), 50);
        assert_eq!(grid[0], 0.0);
        assert_eq!(grid[9], 9000.0);
        assert_eq!(grid[49], 9004.0);
    }

    #[test]
    fn test_gradient_endpoints() {
        let grid = create_gradient_grid(4, 3, 0.0, 100.0);
        assert_eq!(grid[0], 0.0);
        assert_eq!(grid[11], 100.0);
        assert!(grid.windows(2).take(3).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_no_data_stride() {
        let grid = with_no_data_stride(create_constant_grid(3, 3, 1.0), 4, -1.0);
        assert_eq!(grid, vec![-1.0, 1.0, 1.0, 1.0, -1.0, 1.0, 1.0, 1.0, -1.0]);
    }

    #[test]
    fn test_noise_is_deterministic_and_bounded() {
        let a = create_noise_grid(8, 8, 7, 50.0);
        let b = create_noise_grid(8, 8, 7, 50.0);
        assert_eq!(a, b);
        assert!(a.iter().all(|v| (0.0..=50.0).contains(v)));
        assert_ne!(a, create_noise_grid(8, 8, 8, 50.0));
    }

    #[test]
    fn test_index_space_grid() {
        let grid = index_space_grid(2, 2, vec![1.0, 2.0, 3.0, 4.0], None);
        assert_eq!(grid.get(1, 1).unwrap(), 4.0);
    }
}
