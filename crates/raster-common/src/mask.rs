//! Boolean selection masks over a grid's index space.

use crate::error::{Result, ScenarioError};
use crate::RasterGrid;

/// Row-major boolean array with the same shape as a [`RasterGrid`].
///
/// Masks are ephemeral: derived from a geometry and a target grid, never
/// persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    width: usize,
    height: usize,
    bits: Vec<bool>,
}

impl Mask {
    /// All-false mask.
    pub fn empty(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            bits: vec![false; width * height],
        }
    }

    /// All-true mask.
    pub fn full(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            bits: vec![true; width * height],
        }
    }

    /// All-false mask shaped like `grid`.
    pub fn for_grid(grid: &RasterGrid) -> Self {
        Self::empty(grid.width(), grid.height())
    }

    /// Wrap an existing row-major buffer.
    pub fn from_vec(width: usize, height: usize, bits: Vec<bool>) -> Result<Self> {
        if bits.len() != width * height {
            return Err(ScenarioError::invalid_index(format!(
                "mask buffer has {} entries, expected {}x{}",
                bits.len(),
                width,
                height
            )));
        }
        Ok(Self {
            width,
            height,
            bits,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Row-major flags.
    pub fn as_slice(&self) -> &[bool] {
        &self.bits
    }

    /// Mutable row-major flags, for rasterizers filling the mask.
    pub fn as_mut_slice(&mut self) -> &mut [bool] {
        &mut self.bits
    }

    pub fn get(&self, col: usize, row: usize) -> Result<bool> {
        if col >= self.width || row >= self.height {
            return Err(ScenarioError::invalid_index(format!(
                "mask cell ({}, {}) outside {}x{}",
                col, row, self.width, self.height
            )));
        }
        Ok(self.bits[row * self.width + col])
    }

    pub fn set(&mut self, col: usize, row: usize, value: bool) -> Result<()> {
        if col >= self.width || row >= self.height {
            return Err(ScenarioError::invalid_index(format!(
                "mask cell ({}, {}) outside {}x{}",
                col, row, self.width, self.height
            )));
        }
        self.bits[row * self.width + col] = value;
        Ok(())
    }

    /// Number of selected cells.
    pub fn count(&self) -> usize {
        self.bits.iter().filter(|b| **b).count()
    }

    /// True when no cell is selected.
    pub fn is_clear(&self) -> bool {
        !self.bits.iter().any(|b| *b)
    }

    /// True when every cell is selected.
    pub fn is_full(&self) -> bool {
        self.bits.iter().all(|b| *b)
    }

    /// Fails with `InvalidIndex` unless the mask has the grid's shape.
    pub fn ensure_matches(&self, grid: &RasterGrid) -> Result<()> {
        if grid.same_shape(self.width, self.height) {
            Ok(())
        } else {
            Err(ScenarioError::invalid_index(format!(
                "mask is {}x{} but grid is {}x{}",
                self.width,
                self.height,
                grid.width(),
                grid.height()
            )))
        }
    }

    /// Cells selected by either mask.
    pub fn union(&self, other: &Mask) -> Result<Mask> {
        self.combine(other, |a, b| a || b)
    }

    /// Cells selected by both masks.
    pub fn intersection(&self, other: &Mask) -> Result<Mask> {
        self.combine(other, |a, b| a && b)
    }

    fn combine(&self, other: &Mask, op: impl Fn(bool, bool) -> bool) -> Result<Mask> {
        if self.width != other.width || self.height != other.height {
            return Err(ScenarioError::invalid_index(format!(
                "cannot combine {}x{} mask with {}x{} mask",
                self.width, self.height, other.width, other.height
            )));
        }
        let bits = self
            .bits
            .iter()
            .zip(&other.bits)
            .map(|(a, b)| op(*a, *b))
            .collect();
        Ok(Mask {
            width: self.width,
            height: self.height,
            bits,
        })
    }
}
