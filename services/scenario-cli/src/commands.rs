//! Subcommand implementations. Each returns the text to print.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::ValueEnum;
use projection::CoordinateTransformer;
use raster_codec::{Compression, EncodeOptions, RasterEncoder, RasterLoader};
use raster_common::{RasterGrid, SampleFormat};
use scenario_engine::{
    EditingSession, EngineConfig, GeometryRasterizer, ScenarioEditor, StatSummary, StatisticsEngine,
};
use tracing::info;

use crate::config;

/// How results are printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Inputs of the `apply` subcommand.
#[derive(Debug, Clone)]
pub struct ApplyOptions {
    pub raster: PathBuf,
    pub scenario: PathBuf,
    pub output: Option<PathBuf>,
    pub format: OutputFormat,
    pub sample_format: Option<SampleFormat>,
    pub compression: Option<Compression>,
    pub allow_lossy: bool,
}

/// Inputs of the `stats` subcommand.
#[derive(Debug, Clone)]
pub struct StatsOptions {
    pub raster: PathBuf,
    pub geometry: Option<PathBuf>,
    pub format: OutputFormat,
}

async fn load_raster(path: &Path) -> Result<RasterGrid> {
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read raster: {}", path.display()))?;
    let grid = RasterLoader::new()
        .load(&data)
        .with_context(|| format!("Failed to decode raster: {}", path.display()))?;
    info!(
        path = %path.display(),
        width = grid.width(),
        height = grid.height(),
        crs = grid.crs(),
        "Loaded raster"
    );
    Ok(grid)
}

/// Load a raster, apply a scenario file to it and optionally export the
/// edited grid.
pub async fn apply(options: &ApplyOptions, engine: &EngineConfig) -> Result<String> {
    let grid = load_raster(&options.raster).await?;
    let file = config::load_scenario(&options.scenario).await?;
    let registry = config::build_registry(&file.crs_definitions)?;

    let editor = ScenarioEditor::new(CoordinateTransformer::new(Arc::new(registry)), engine.clone());
    let mut session = EditingSession::new(editor, StatisticsEngine::from(engine), grid)?;
    let scenario_name = file.scenario.name().to_string();
    session
        .apply(file.scenario)
        .with_context(|| format!("Failed to apply scenario '{}'", scenario_name))?;

    if let Some(output) = &options.output {
        let encode_options = EncodeOptions {
            sample_format: options.sample_format,
            compression: options.compression.unwrap_or(engine.default_compression),
            allow_lossy: options.allow_lossy,
        };
        let bytes = RasterEncoder::new(encode_options)
            .encode(session.current())
            .context("Failed to encode edited raster")?;
        tokio::fs::write(output, &bytes)
            .await
            .with_context(|| format!("Failed to write raster: {}", output.display()))?;
        info!(
            path = %output.display(),
            bytes = bytes.len(),
            compression = %encode_options.compression,
            "Exported edited raster"
        );
    }

    render_summary(session.summary(), options.format)
}

/// Summarize a raster, optionally within a geometry.
pub async fn stats(options: &StatsOptions, engine: &EngineConfig) -> Result<String> {
    let grid = load_raster(&options.raster).await?;

    let mask = match &options.geometry {
        Some(path) => {
            let file = config::load_geometry(path).await?;
            let registry = config::build_registry(&file.crs_definitions)?;
            let rasterizer = GeometryRasterizer::new(CoordinateTransformer::new(Arc::new(registry)), engine.clone());
            Some(
                rasterizer
                    .rasterize(&file.geometry, &file.crs, &grid)
                    .with_context(|| format!("Failed to rasterize geometry: {}", path.display()))?,
            )
        }
        None => None,
    };

    let summary = StatisticsEngine::from(engine).summarize(&grid, mask.as_ref())?;
    render_summary(&summary, options.format)
}

/// Describe a raster's header without decoding its cells.
pub async fn info(raster: &Path, format: OutputFormat) -> Result<String> {
    let data = tokio::fs::read(raster)
        .await
        .with_context(|| format!("Failed to read raster: {}", raster.display()))?;
    let header = RasterLoader::new()
        .read_header(&data)
        .with_context(|| format!("Failed to decode raster header: {}", raster.display()))?;

    match format {
        OutputFormat::Json => {
            let value = serde_json::json!({
                "width": header.width,
                "height": header.height,
                "sample_format": header.sample_format.as_str(),
                "compression": header.compression.as_str(),
                "transform": header.transform.coefficients(),
                "no_data": header.no_data,
                "crs": header.crs,
                "strips": header.strip_count,
            });
            Ok(serde_json::to_string_pretty(&value)?)
        }
        OutputFormat::Text => {
            let mut out = String::new();
            writeln!(out, "size:          {} x {}", header.width, header.height)?;
            writeln!(out, "sample format: {}", header.sample_format)?;
            writeln!(out, "compression:   {}", header.compression)?;
            writeln!(out, "crs:           {}", header.crs)?;
            writeln!(out, "transform:     {:?}", header.transform.coefficients())?;
            match header.no_data {
                Some(nd) => writeln!(out, "no-data:       {}", nd)?,
                None => writeln!(out, "no-data:       none")?,
            }
            write!(out, "strips:        {}", header.strip_count)?;
            Ok(out)
        }
    }
}

/// Human-readable or JSON rendering of a summary.
pub fn render_summary(summary: &StatSummary, format: OutputFormat) -> Result<String> {
    if format == OutputFormat::Json {
        return Ok(serde_json::to_string_pretty(summary)?);
    }

    let opt = |v: Option<f64>| v.map_or_else(|| "n/a".to_string(), |v| format!("{}", v));
    let mut out = String::new();
    writeln!(out, "count:    {}", summary.count)?;
    writeln!(out, "excluded: {}", summary.excluded)?;
    writeln!(out, "min:      {}", opt(summary.min))?;
    writeln!(out, "max:      {}", opt(summary.max))?;
    writeln!(out, "mean:     {}", opt(summary.mean))?;
    writeln!(out, "sum:      {}", summary.sum)?;
    write!(out, "std dev:  {}", opt(summary.std_dev))?;
    if !summary.histogram.is_empty() {
        write!(out, "\nhistogram:")?;
        for bucket in &summary.histogram {
            write!(out, "\n  > {:<14} {}", bucket.lower_bound, bucket.count)?;
        }
    }
    Ok(out)
}
