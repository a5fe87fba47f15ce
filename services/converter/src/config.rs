//! Command line arguments and configuration layering.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use ingestion::{ConvertOptions, InputKind, OutputMode, PipelineConfig};
use projection::AxisMode;

#[derive(Parser, Debug)]
#[command(name = "landcover-converter")]
#[command(about = "Convert classified land-cover GeoTIFFs into CF NetCDF archives")]
pub struct Args {
    /// Input directory
    #[arg(short, long = "indir", env = "LANDCOVER_INDIR")]
    pub indir: PathBuf,

    /// Output directory (created if absent)
    #[arg(short, long = "outdir", env = "LANDCOVER_OUTDIR")]
    pub outdir: PathBuf,

    /// Write NetCDF archives instead of optimized GeoTIFFs
    #[arg(short, long)]
    pub netcdf: bool,

    /// Select *_rgb_classification.tif inputs
    #[arg(short, long)]
    pub rgb: bool,

    /// Stack all inputs into one archive (implies --netcdf)
    #[arg(short, long)]
    pub single: bool,

    /// Debug-level logging
    #[arg(short, long)]
    pub verbose: bool,

    /// YAML configuration file
    #[arg(short, long, env = "LANDCOVER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Reproject every axis sample instead of interpolating between corners
    #[arg(long)]
    pub exact_axes: bool,
}

impl Args {
    pub fn convert_options(&self) -> ConvertOptions {
        ConvertOptions {
            input_dir: self.indir.clone(),
            output_dir: self.outdir.clone(),
            input_kind: if self.rgb {
                InputKind::Rgb
            } else {
                InputKind::Classification
            },
            mode: OutputMode::from_flags(self.netcdf, self.single),
        }
    }
}

/// Defaults, then the YAML file, then `LANDCOVER_*` variables, then flags.
pub fn load_config(args: &Args) -> Result<PipelineConfig> {
    load_config_with(args, |key| std::env::var(key).ok())
}

pub fn load_config_with<F>(args: &Args, lookup: F) -> Result<PipelineConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_yaml_file(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    config
        .apply_overrides(lookup)
        .context("applying environment overrides")?;

    if args.exact_axes {
        config.axis_mode = AxisMode::Exact;
    }
    Ok(config)
}
