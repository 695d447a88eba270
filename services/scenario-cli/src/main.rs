//! Raster scenario command-line tool.
//!
//! Loads a GeoTIFF, applies a scenario file to it, prints summary
//! statistics and optionally writes the edited raster back out.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use raster_codec::Compression;
use raster_common::SampleFormat;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use scenario_cli::commands;
use scenario_cli::config::load_engine_config;
use scenario_cli::{ApplyOptions, OutputFormat, StatsOptions};

#[derive(Parser, Debug)]
#[command(name = "scenario-cli")]
#[command(about = "Apply what-if scenarios to single-band rasters")]
struct Args {
    /// Engine configuration file (YAML); overrides environment settings
    #[arg(short, long, env = "SCENARIO_CONFIG")]
    config: Option<PathBuf>,

    /// Number of histogram buckets
    #[arg(long)]
    buckets: Option<usize>,

    /// Log level
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply a scenario file to a raster and summarize the result
    Apply {
        /// Input raster (GeoTIFF)
        raster: PathBuf,

        /// Scenario file (.yaml, .yml or .json)
        scenario: PathBuf,

        /// Write the edited raster here
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output sample format (uint8, uint16, int16, float32); defaults to the input's
        #[arg(long)]
        sample_format: Option<SampleFormat>,

        /// Output compression (none, packbits)
        #[arg(long)]
        compression: Option<Compression>,

        /// Round and saturate values that do not fit an integer sample format
        #[arg(long)]
        allow_lossy: bool,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Summarize a raster, optionally within a geometry file
    Stats {
        raster: PathBuf,

        /// Geometry file with `crs` and `rings`
        #[arg(short, long)]
        geometry: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Print a raster's header
    Info {
        raster: PathBuf,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    // Initialize tracing
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let mut engine = load_engine_config(args.config.as_deref()).await?;
    if let Some(buckets) = args.buckets {
        engine.histogram_buckets = buckets;
    }
    if let Err(e) = engine.validate() {
        bail!("Invalid engine configuration: {}", e);
    }
    info!(?engine, "Loaded configuration");

    let output = match args.command {
        Command::Apply {
            raster,
            scenario,
            output,
            sample_format,
            compression,
            allow_lossy,
            format,
        } => {
            let options = ApplyOptions {
                raster,
                scenario,
                output,
                format,
                sample_format,
                compression,
                allow_lossy,
            };
            commands::apply(&options, &engine).await?
        }
        Command::Stats { raster, geometry, format } => {
            commands::stats(&StatsOptions { raster, geometry, format }, &engine).await?
        }
        Command::Info { raster, format } => commands::info(&raster, format).await?,
    };

    println!("{}", output);
    Ok(())
}
