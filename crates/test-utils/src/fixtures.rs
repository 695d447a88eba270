//! Common test fixtures for raster scenario tests.
//!
//! This module provides pre-defined grids, geometries and identifiers that
//! represent the scenarios the engine is exercised against.

use raster_common::{AffineTransform, RasterGrid};

/// Common CRS identifiers.
pub mod crs {
    /// WGS84 geographic
    pub const EPSG_4326: &str = "EPSG:4326";

    /// Web Mercator
    pub const EPSG_3857: &str = "EPSG:3857";

    /// Lon/lat order alias of EPSG:4326
    pub const CRS_84: &str = "CRS:84";

    /// Identifier used for synthetic index-space grids
    pub const LOCAL: &str = "LOCAL:GRID";
}

/// Common no-data sentinels.
pub mod no_data {
    pub const NEGATIVE_9999: f64 = -9999.0;
    pub const UINT8_MAX: f64 = 255.0;
}

/// Common polygon rings, as closed lists of (x, y) vertices.
pub mod rings {
    /// Unit square with corners (0,0) and (1,1).
    pub fn unit_square() -> Vec<(f64, f64)> {
        square(0.0, 0.0, 1.0, 1.0)
    }

    /// Axis-aligned rectangle, closed (first vertex repeated).
    pub fn square(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Vec<(f64, f64)> {
        vec![
            (min_x, min_y),
            (max_x, min_y),
            (max_x, max_y),
            (min_x, max_y),
            (min_x, min_y),
        ]
    }

    /// Right triangle with the right angle at `(x, y)`.
    pub fn triangle(x: f64, y: f64, size: f64) -> Vec<(f64, f64)> {
        vec![(x, y), (x + size, y), (x, y + size), (x, y)]
    }
}

/// 4x4 grid with an identity transform (cell (c, r) centred on (c+0.5, r+0.5)),
/// every cell `10.0`, and no-data `-9999` in the CRS `LOCAL:GRID`.
pub fn identity_grid_4x4() -> RasterGrid {
    RasterGrid::filled(
        4,
        4,
        10.0,
        AffineTransform::identity(),
        Some(no_data::NEGATIVE_9999),
        crs::LOCAL,
    )
    .expect("fixture grid is valid")
}

/// Grid over `[-10, 10] x [-10, 10]` in EPSG:4326, north-up, 1 degree
/// cells, holding [`crate::create_test_grid`] values.
pub fn geographic_grid_20x20() -> RasterGrid {
    let transform =
        AffineTransform::north_up(-10.0, 10.0, 1.0, -1.0).expect("fixture transform is valid");
    RasterGrid::new(
        20,
        20,
        crate::create_test_grid(20, 20),
        transform,
        Some(no_data::NEGATIVE_9999),
        crs::EPSG_4326,
    )
    .expect("fixture grid is valid")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_grid_centers() {
        let grid = identity_grid_4x4();
        assert_eq!(grid.len(), 16);
        assert_eq!(grid.cell_center(1, 2).unwrap(), (1.5, 2.5));
        assert_eq!(grid.no_data(), Some(-9999.0));
    }

    #[test]
    fn test_geographic_grid_bounds() {
        let grid = geographic_grid_20x20();
        let bounds = grid.bounds();
        assert_eq!(bounds.min_x, -10.0);
        assert_eq!(bounds.max_x, 10.0);
        assert_eq!(bounds.min_y, -10.0);
        assert_eq!(bounds.max_y, 10.0);
        assert_eq!(grid.get(3, 2).unwrap(), 3002.0);
    }

    #[test]
    fn test_square_is_closed() {
        let ring = rings::square(0.0, 0.0, 2.0, 1.0);
        assert_eq!(ring.first(), ring.last());
        assert_eq!(ring.len(), 5);
    }
}
