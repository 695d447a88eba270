//! Summary statistics over a grid or a masked subset of it.

use raster_common::{Mask, RasterGrid, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::EngineConfig;

/// One equal-width histogram bucket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistogramBucket {
    pub lower_bound: f64,
    pub count: usize,
}

/// Statistics over the valid cells of a selection: neither no-data nor
/// NaN or infinite.
///
/// With no valid cells, `min`, `max`, `mean` and `std_dev` are `None`,
/// `sum` is zero and the histogram is empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatSummary {
    pub count: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub sum: f64,
    /// Population standard deviation.
    pub std_dev: Option<f64>,
    /// Selected cells skipped as no-data or non-finite.
    pub excluded: usize,
    pub histogram: Vec<HistogramBucket>,
}

impl StatSummary {
    fn empty(excluded: usize) -> Self {
        Self {
            count: 0,
            min: None,
            max: None,
            mean: None,
            sum: 0.0,
            std_dev: None,
            excluded,
            histogram: Vec::new(),
        }
    }
}

/// Computes [`StatSummary`] values with a fixed bucket count.
#[derive(Debug, Clone, Copy)]
pub struct StatisticsEngine {
    buckets: usize,
}

impl Default for StatisticsEngine {
    fn default() -> Self {
        Self { buckets: 10 }
    }
}

impl From<&EngineConfig> for StatisticsEngine {
    fn from(config: &EngineConfig) -> Self {
        Self::new(config.histogram_buckets)
    }
}

impl StatisticsEngine {
    /// `buckets` is raised to at least one.
    pub fn new(buckets: usize) -> Self {
        Self {
            buckets: buckets.max(1),
        }
    }

    pub fn buckets(&self) -> usize {
        self.buckets
    }

    /// Summarize the whole grid, or only the cells selected by `mask`.
    ///
    /// Fails with `InvalidIndex` when the mask shape differs from the grid.
    pub fn summarize(&self, grid: &RasterGrid, mask: Option<&Mask>) -> Result<StatSummary> {
        if let Some(mask) = mask {
            mask.ensure_matches(grid)?;
        }

        let selected: Box<dyn Iterator<Item = f64>> = match mask {
            Some(mask) => Box::new(
                grid.cells()
                    .iter()
                    .zip(mask.as_slice())
                    .filter(|(_, selected)| **selected)
                    .map(|(v, _)| *v),
            ),
            None => Box::new(grid.cells().iter().copied()),
        };

        let mut values = Vec::new();
        let mut excluded = 0;
        for v in selected {
            // Non-finite cells never carry a value, sentinel or not.
            if grid.is_no_data(v) || !v.is_finite() {
                excluded += 1;
            } else {
                values.push(v);
            }
        }

        let summary = self.summarize_values(&values, excluded);
        debug!(
            count = summary.count,
            excluded = summary.excluded,
            masked = mask.is_some(),
            "Computed statistics"
        );
        Ok(summary)
    }

    fn summarize_values(&self, values: &[f64], excluded: usize) -> StatSummary {
        if values.is_empty() {
            return StatSummary::empty(excluded);
        }

        let count = values.len();
        let (mut min, mut max, mut sum) = (f64::INFINITY, f64::NEG_INFINITY, 0.0);
        for &v in values {
            min = min.min(v);
            max = max.max(v);
            sum += v;
        }
        let n = count as f64;
        let mean = if sum.is_finite() {
            sum / n
        } else {
            values.iter().map(|v| v / n).sum()
        };

        // Scaled by the largest magnitude to keep the squares finite.
        let scale = min.abs().max(max.abs());
        let std_dev = if scale > 0.0 {
            let spread = values
                .iter()
                .map(|v| {
                    let d = v / scale - mean / scale;
                    d * d
                })
                .sum::<f64>()
                / n;
            scale * spread.sqrt()
        } else {
            0.0
        };

        StatSummary {
            count,
            min: Some(min),
            max: Some(max),
            mean: Some(mean),
            sum,
            std_dev: Some(std_dev),
            excluded,
            histogram: self.histogram(values, min, max),
        }
    }

    /// Equal-width buckets over `[min, max]`. A value on an internal boundary
    /// belongs to the lower bucket; `min` lands in the first bucket and `max`
    /// in the last.
    fn histogram(&self, values: &[f64], min: f64, max: f64) -> Vec<HistogramBucket> {
        let n = self.buckets;
        // max - min overflows for values of opposite sign near f64::MAX.
        let width = max / n as f64 - min / n as f64;
        let lower = |i: usize| min + i as f64 * width;

        let mut counts = vec![0usize; n];
        if width > 0.0 && width.is_finite() {
            for &v in values {
                let guess = (v / width - min / width).ceil() - 1.0;
                let mut i = guess.clamp(0.0, (n - 1) as f64) as usize;
                // Settle rounding at the boundaries: bucket i holds (lower(i), lower(i+1)].
                while i > 0 && v <= lower(i) {
                    i -= 1;
                }
                while i + 1 < n && v > lower(i + 1) {
                    i += 1;
                }
                counts[i] += 1;
            }
        } else {
            counts[0] = values.len();
        }

        counts
            .into_iter()
            .enumerate()
            .map(|(i, count)| HistogramBucket {
                lower_bound: lower(i),
                count,
            })
            .collect()
    }
}
