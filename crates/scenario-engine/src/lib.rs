//! What-if scenario editing over single-band rasters.
//!
//! A [`Scenario`] is an ordered list of edits, each pairing a polygon
//! [`Geometry`] in some CRS with a [`ValueRule`]. The [`ScenarioEditor`]
//! rasterizes every geometry onto the base grid and applies the rules in
//! order, producing a new grid; [`StatisticsEngine`] summarizes the result.
//!
//! # Architecture
//!
//! ```text
//! Scenario ──► GeometryRasterizer ──► Mask per edit
//!                    │                    │
//!          CoordinateTransformer          ▼
//!                               ScenarioEditor::apply(base)
//!                                         │
//!                                         ▼
//!                           RasterGrid ──► StatisticsEngine
//! ```
//!
//! [`EditingSession`] keeps the original grid and every derived grid so
//! edits can be undone, redone or reverted.
//!
//! # Example
//!
//! ```ignore
//! use scenario_engine::{Edit, Geometry, Scenario, ScenarioEditor, ValueRule};
//!
//! let scenario = Scenario::new(
//!     "levee",
//!     vec![Edit::new(Geometry::rectangle(0.0, 0.0, 4.0, 4.0), "EPSG:4326", ValueRule::SetConstant { value: 5.0 })],
//! );
//! let edited = editor.apply(&scenario, &grid)?;
//! ```

pub mod config;
pub mod editor;
pub mod geometry;
pub mod rasterize;
pub mod scenario;
pub mod session;
pub mod stats;

pub use config::EngineConfig;
pub use editor::ScenarioEditor;
pub use geometry::Geometry;
pub use rasterize::GeometryRasterizer;
pub use scenario::{Edit, Scenario, ValueRule};
pub use session::{EditingSession, SessionState};
pub use stats::{HistogramBucket, StatSummary, StatisticsEngine};

