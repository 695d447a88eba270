//! Interactive editing sessions with undo and redo.

use std::sync::Arc;

use raster_common::{Mask, RasterGrid, Result};
use tracing::{info, warn};

use crate::editor::ScenarioEditor;
use crate::scenario::Scenario;
use crate::stats::{StatSummary, StatisticsEngine};

/// A scenario together with the grid it produced.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub scenario: Arc<Scenario>,
    pub grid: Arc<RasterGrid>,
}

/// Holds the originally loaded grid and every grid derived from it.
///
/// Each applied scenario builds on the current grid. Grids are shared
/// through `Arc` and never modified, so a state handed out by
/// [`EditingSession::current`] stays valid after later edits.
#[derive(Debug)]
pub struct EditingSession {
    editor: ScenarioEditor,
    stats: StatisticsEngine,
    original: Arc<RasterGrid>,
    history: Vec<SessionState>,
    redo: Vec<SessionState>,
    summary: StatSummary,
}

impl EditingSession {
    pub fn new(editor: ScenarioEditor, stats: StatisticsEngine, original: impl Into<Arc<RasterGrid>>) -> Result<Self> {
        let original = original.into();
        let summary = stats.summarize(&original, None)?;
        info!(
            width = original.width(),
            height = original.height(),
            crs = original.crs(),
            "Editing session started"
        );
        Ok(Self {
            editor,
            stats,
            original,
            history: Vec::new(),
            redo: Vec::new(),
            summary,
        })
    }

    /// Apply `scenario` on top of the current grid.
    ///
    /// On failure the session is left exactly as it was.
    pub fn apply(&mut self, scenario: Scenario) -> Result<&StatSummary> {
        let grid = match self.editor.apply(&scenario, self.current()) {
            Ok(grid) => grid,
            Err(e) => {
                warn!(scenario = scenario.name(), error = %e, "Scenario rejected; keeping current grid");
                return Err(e);
            }
        };
        let summary = self.stats.summarize(&grid, None)?;

        self.history.push(SessionState {
            scenario: Arc::new(scenario),
            grid: Arc::new(grid),
        });
        self.redo.clear();
        self.summary = summary;
        info!(depth = self.history.len(), "Session advanced");
        Ok(&self.summary)
    }

    /// Step back one scenario. Returns false when already at the original.
    pub fn undo(&mut self) -> Result<bool> {
        let Some(state) = self.history.pop() else {
            return Ok(false);
        };
        self.redo.push(state);
        self.refresh()?;
        info!(depth = self.history.len(), redo = self.redo.len(), "Undo");
        Ok(true)
    }

    /// Re-apply the most recently undone scenario, reusing its grid.
    pub fn redo(&mut self) -> Result<bool> {
        let Some(state) = self.redo.pop() else {
            return Ok(false);
        };
        self.history.push(state);
        self.refresh()?;
        info!(depth = self.history.len(), redo = self.redo.len(), "Redo");
        Ok(true)
    }

    /// Return to the original grid. The reverted scenarios move to the redo
    /// stack and can be replayed with [`EditingSession::redo`].
    pub fn revert(&mut self) -> Result<()> {
        let reverted = self.history.len();
        self.redo.extend(self.history.drain(..).rev());
        self.refresh()?;
        info!(reverted = reverted, "Reverted to original grid");
        Ok(())
    }

    pub fn current(&self) -> &RasterGrid {
        self.history.last().map_or(&self.original, |state| &state.grid)
    }

    /// Shared handle to the current grid.
    pub fn current_shared(&self) -> Arc<RasterGrid> {
        self.history
            .last()
            .map_or_else(|| Arc::clone(&self.original), |state| Arc::clone(&state.grid))
    }

    pub fn original(&self) -> &RasterGrid {
        &self.original
    }

    /// Statistics of the current grid, kept up to date on every change.
    pub fn summary(&self) -> &StatSummary {
        &self.summary
    }

    /// Statistics of the current grid restricted to `mask`.
    pub fn summary_within(&self, mask: &Mask) -> Result<StatSummary> {
        self.stats.summarize(self.current(), Some(mask))
    }

    /// Applied scenarios, oldest first.
    pub fn history(&self) -> &[SessionState] {
        &self.history
    }

    pub fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn editor(&self) -> &ScenarioEditor {
        &self.editor
    }

    fn refresh(&mut self) -> Result<()> {
        self.summary = self.stats.summarize(self.current(), None)?;
        Ok(())
    }
}
