//! Land-cover archive converter.
//!
//! Converts a directory of classified GeoTIFFs into CF NetCDF archives,
//! either one per date or one stacked time series, or into optimized
//! GeoTIFF copies.

mod config;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use ingestion::{Converter, GdalCommandOptimizer, IngestionError};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use config::{load_config, Args};

fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .json()
        .init();

    netcdf_archive::silence_hdf5_errors();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %format!("{:#}", e), "Conversion failed");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let config = load_config(args)?;
    let options = args.convert_options();

    info!(
        input = %options.input_dir.display(),
        output = %options.output_dir.display(),
        mode = ?options.mode,
        kind = ?options.input_kind,
        "Starting land-cover conversion"
    );

    let optimizer = GdalCommandOptimizer::new(config.gdal_tool_dir.clone());
    let converter = Converter::new(config, Box::new(optimizer));

    let summary = match converter.run(&options) {
        Ok(summary) => summary,
        Err(e @ IngestionError::NoInputs(_)) => {
            error!("Could not find any input files");
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };

    for (path, reason) in &summary.failed {
        warn!(path = %path.display(), reason = %reason, "Skipped input");
    }
    info!(
        archives = summary.written.len(),
        optimized = summary.optimized.len(),
        failed = summary.failed.len(),
        "Conversion finished"
    );
    Ok(())
}
