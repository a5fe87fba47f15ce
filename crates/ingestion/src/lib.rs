//! Land-cover raster conversion library.
//!
//! Turns classified GeoTIFF tiles into CF NetCDF archives.
//!
//! # Architecture
//!
//! - [`raster`]: GDAL-backed GeoTIFF reading and writing
//! - [`stacker`]: merging a date series into one multi-band raster
//! - [`inputs`]: input discovery and filtering
//! - [`optimizer`]: overview + tiled DEFLATE GeoTIFF copies
//! - [`converter`]: the batch pipeline tying these to `netcdf-archive`

pub mod config;
pub mod converter;
pub mod error;
pub mod inputs;
pub mod optimizer;
pub mod raster;
pub mod stacker;

// Re-exports
pub use config::PipelineConfig;
pub use converter::{ConversionSummary, ConvertOptions, Converter, OutputMode};
pub use error::{IngestionError, Result};
pub use inputs::{discover_inputs, InputKind};
pub use netcdf_archive::archive_path_for;
pub use optimizer::{GdalCommandOptimizer, RasterOptimizer, RecordingOptimizer, OVERVIEW_LEVELS};
pub use raster::{read_raster, write_raster};
pub use stacker::{SeriesStacker, StackedSeries};
