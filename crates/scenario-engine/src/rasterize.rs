//! Geometry to cell-mask rasterization.
//!
//! A cell is covered when its center lies inside the geometry under the
//! even-odd rule. Geometry vertices are first reprojected into the grid's
//! CRS; cell centers are then tested in that CRS.

use std::ops::Range;

use projection::{CoordinateTransformer, Point};
use raster_common::{Mask, RasterGrid, Result};
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::geometry::{self, Geometry};

/// Turns geometries into boolean masks over a grid's index space.
#[derive(Debug, Clone)]
pub struct GeometryRasterizer {
    transformer: CoordinateTransformer,
    config: EngineConfig,
}

impl GeometryRasterizer {
    pub fn new(transformer: CoordinateTransformer, config: EngineConfig) -> Self {
        Self {
            transformer,
            config,
        }
    }

    pub fn transformer(&self) -> &CoordinateTransformer {
        &self.transformer
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Mask of the cells of `grid` whose centers lie inside `geometry`.
    ///
    /// Fails with `UnknownCrs` when either CRS is unregistered (also when
    /// both are the same identifier) and with `InvalidProjection` when a
    /// vertex cannot be reprojected.
    pub fn rasterize(&self, geometry: &Geometry, geometry_crs: &str, grid: &RasterGrid) -> Result<Mask> {
        let pipeline = self.transformer.pipeline(geometry_crs, grid.crs())?;
        let mut mask = Mask::for_grid(grid);

        if geometry.is_empty() {
            debug!(crs = geometry_crs, "Empty geometry selects no cells");
            return Ok(mask);
        }

        let projected = geometry.reproject(&pipeline)?;
        let rings = projected.effective_rings();
        if rings.len() < geometry.rings.len() {
            warn!(
                dropped = geometry.rings.len() - rings.len(),
                "Ignoring rings with fewer than three distinct vertices"
            );
        }
        let Some(bounds) = projected.bounds().filter(|_| !rings.is_empty()) else {
            return Ok(mask);
        };

        let (cols, rows) = if self.config.bbox_prefilter {
            index_window(grid, &bounds.corners())
        } else {
            (0..grid.width(), 0..grid.height())
        };

        let scanned = cols.len() * rows.len();
        let transform = *grid.transform();
        let width = grid.width();

        let fill_row = |(row, bits): (usize, &mut [bool])| {
            if !rows.contains(&row) {
                return;
            }
            for col in cols.clone() {
                let (x, y) = transform.pixel_center(col, row);
                if self.config.bbox_prefilter && !bounds.contains_point(x, y) {
                    continue;
                }
                bits[col] = geometry::contains(&rings, x, y);
            }
        };

        let bits = mask.as_mut_slice();
        if scanned >= self.config.parallel_threshold_cells {
            bits.par_chunks_mut(width).enumerate().for_each(fill_row);
        } else {
            bits.chunks_mut(width).enumerate().for_each(fill_row);
        }

        debug!(
            geometry_crs = geometry_crs,
            grid_crs = grid.crs(),
            rings = rings.len(),
            scanned = scanned,
            selected = mask.count(),
            "Rasterized geometry"
        );

        Ok(mask)
    }
}

/// Column and row ranges whose cells can touch the box spanned by
/// `corners`, padded by one cell and clamped to the grid.
fn index_window(grid: &RasterGrid, corners: &[Point]) -> (Range<usize>, Range<usize>) {
    let transform = grid.transform();
    let (mut min_c, mut min_r) = (f64::INFINITY, f64::INFINITY);
    let (mut max_c, mut max_r) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for (x, y) in corners {
        let (c, r) = transform.invert(*x, *y);
        min_c = min_c.min(c);
        max_c = max_c.max(c);
        min_r = min_r.min(r);
        max_r = max_r.max(r);
    }

    let clamp = |lo: f64, hi: f64, len: usize| -> Range<usize> {
        if !(lo.is_finite() && hi.is_finite()) {
            return 0..len;
        }
        let start = (lo.floor() - 1.0).max(0.0);
        let end = (hi.ceil() + 1.0).min(len as f64);
        if end <= start {
            return 0..0;
        }
        start as usize..end as usize
    };

    (
        clamp(min_c, max_c, grid.width()),
        clamp(min_r, max_r, grid.height()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use projection::{CrsRegistry, ProjectionParams};
    use raster_common::AffineTransform;
    use std::sync::Arc;

    fn rasterizer(config: EngineConfig) -> GeometryRasterizer {
        let mut registry = CrsRegistry::with_defaults();
        registry
            .register_params("LOCAL:GRID", &ProjectionParams::Geographic)
            .unwrap();
        registry
            .register_params(
                "LOCAL:SCALED",
                &ProjectionParams::Affine {
                    coefficients: [0.0, 0.5, 0.0, 0.0, 0.0, 0.5],
                },
            )
            .unwrap();
        GeometryRasterizer::new(CoordinateTransformer::new(Arc::new(registry)), config)
    }

    fn grid(width: usize, height: usize) -> RasterGrid {
        RasterGrid::filled(width, height, 1.0, AffineTransform::identity(), None, "LOCAL:GRID").unwrap()
    }

    #[test]
    fn test_full_extent_selects_everything() {
        let mask = rasterizer(EngineConfig::default())
            .rasterize(&Geometry::rectangle(0.0, 0.0, 4.0, 4.0), "LOCAL:GRID", &grid(4, 4))
            .unwrap();
        assert!(mask.is_full());
    }

    #[test]
    fn test_center_rule() {
        // Covers the centers (0.5, 0.5) and (1.5, 0.5) only
        let mask = rasterizer(EngineConfig::default())
            .rasterize(&Geometry::rectangle(0.2, 0.2, 1.7, 0.9), "LOCAL:GRID", &grid(3, 2))
            .unwrap();
        assert_eq!(mask.as_slice(), &[true, true, false, false, false, false]);
    }

    #[test]
    fn test_empty_geometry() {
        let mask = rasterizer(EngineConfig::default())
            .rasterize(&Geometry::default(), "LOCAL:GRID", &grid(2, 2))
            .unwrap();
        assert!(mask.is_clear());
    }

    #[test]
    fn test_unknown_crs() {
        let r = rasterizer(EngineConfig::default());
        let err = r
            .rasterize(&Geometry::rectangle(0.0, 0.0, 1.0, 1.0), "EPSG:99999", &grid(2, 2))
            .unwrap_err();
        assert_eq!(err.kind(), "UnknownCRS");

        let unregistered = RasterGrid::filled(2, 2, 1.0, AffineTransform::identity(), None, "NOPE").unwrap();
        let err = r
            .rasterize(&Geometry::rectangle(0.0, 0.0, 1.0, 1.0), "NOPE", &unregistered)
            .unwrap_err();
        assert_eq!(err.kind(), "UnknownCRS");
    }

    #[test]
    fn test_reprojected_geometry() {
        // LOCAL:SCALED halves lon/lat, so (0,0)-(1,1) there is (0,0)-(2,2) on the grid
        let mask = rasterizer(EngineConfig::default())
            .rasterize(&Geometry::rectangle(0.0, 0.0, 1.0, 1.0), "LOCAL:SCALED", &grid(4, 4))
            .unwrap();
        assert_eq!(mask.count(), 4);
        assert!(mask.get(1, 1).unwrap());
        assert!(!mask.get(2, 2).unwrap());
    }

    #[test]
    fn test_geometry_outside_grid() {
        let mask = rasterizer(EngineConfig::default())
            .rasterize(&Geometry::rectangle(100.0, 100.0, 110.0, 110.0), "LOCAL:GRID", &grid(4, 4))
            .unwrap();
        assert!(mask.is_clear());
    }

    #[test]
    fn test_prefilter_and_parallel_paths_agree() {
        let geometry = Geometry::polygon(vec![(3.3, 1.0), (27.0, 8.5), (12.0, 29.2), (1.0, 17.0)]);
        let g = grid(32, 32);

        let baseline = rasterizer(EngineConfig {
            bbox_prefilter: false,
            parallel_threshold_cells: usize::MAX,
            ..Default::default()
        })
        .rasterize(&geometry, "LOCAL:GRID", &g)
        .unwrap();

        for (prefilter, threshold) in [(true, usize::MAX), (true, 1), (false, 1)] {
            let mask = rasterizer(EngineConfig {
                bbox_prefilter: prefilter,
                parallel_threshold_cells: threshold,
                ..Default::default()
            })
            .rasterize(&geometry, "LOCAL:GRID", &g)
            .unwrap();
            assert_eq!(mask, baseline);
        }
        assert!(baseline.count() > 0);
    }
}
