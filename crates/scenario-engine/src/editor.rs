//! Scenario application: geometry edits over a base grid.

use projection::CoordinateTransformer;
use raster_common::{Mask, RasterGrid, Result};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::rasterize::GeometryRasterizer;
use crate::scenario::Scenario;

/// Applies scenarios to grids, producing new grids.
///
/// Edits run strictly in order, so later edits see the effects of earlier
/// ones. Cells that are no-data in the base grid are never written. The base
/// grid is never mutated.
#[derive(Debug, Clone)]
pub struct ScenarioEditor {
    rasterizer: GeometryRasterizer,
}

impl ScenarioEditor {
    pub fn new(transformer: CoordinateTransformer, config: EngineConfig) -> Self {
        Self::from_rasterizer(GeometryRasterizer::new(transformer, config))
    }

    pub fn from_rasterizer(rasterizer: GeometryRasterizer) -> Self {
        Self { rasterizer }
    }

    pub fn rasterizer(&self) -> &GeometryRasterizer {
        &self.rasterizer
    }

    /// Apply every edit of `scenario` to a copy of `base`.
    ///
    /// Every edit's mask is computed before any cell is written, so an
    /// unknown CRS anywhere in the scenario fails the call with nothing
    /// applied.
    pub fn apply(&self, scenario: &Scenario, base: &RasterGrid) -> Result<RasterGrid> {
        let masks = scenario
            .edits()
            .iter()
            .map(|edit| self.rasterizer.rasterize(&edit.geometry, &edit.crs, base))
            .collect::<Result<Vec<Mask>>>()?;

        let editable: Vec<bool> = base.cells().iter().map(|v| !base.is_no_data(*v)).collect();
        let mut cells = base.cells().to_vec();
        let mut changed = vec![false; cells.len()];

        for (index, (edit, mask)) in scenario.edits().iter().zip(&masks).enumerate() {
            let mut touched = 0usize;
            for (i, selected) in mask.as_slice().iter().enumerate() {
                if *selected && editable[i] {
                    let next = edit.rule.apply(cells[i]);
                    if next.to_bits() != cells[i].to_bits() {
                        changed[i] = true;
                    }
                    cells[i] = next;
                    touched += 1;
                }
            }
            debug!(
                edit = index,
                rule = edit.rule.name(),
                crs = %edit.crs,
                selected = mask.count(),
                touched = touched,
                "Applied edit"
            );
        }

        let grid = base.with_cells(cells)?;
        info!(
            scenario_id = %scenario.id(),
            scenario = scenario.name(),
            edits = scenario.edits().len(),
            changed_cells = changed.iter().filter(|c| **c).count(),
            "Scenario applied"
        );
        Ok(grid)
    }

    /// Evaluate independent what-if branches against the same base, in
    /// parallel. Results are in the order of `scenarios`; one branch failing
    /// does not affect the others.
    pub fn apply_branches(&self, scenarios: &[Scenario], base: &RasterGrid) -> Vec<Result<RasterGrid>> {
        info!(branches = scenarios.len(), "Evaluating scenario branches");
        scenarios
            .par_iter()
            .map(|scenario| self.apply(scenario, base))
            .collect()
    }
}
