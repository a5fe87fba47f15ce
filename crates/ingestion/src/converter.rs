//! Batch conversion pipeline.

use std::path::{Path, PathBuf};

use netcdf_archive::{ArchiveRequest, ArchiveWriter};
use projection::{SpatialReferenceDescriptor, SpatialReferenceResolver};
use tracing::{error, info, instrument};

use landcover_common::TemporalCoordinate;

use crate::config::PipelineConfig;
use crate::error::{IngestionError, Result};
use crate::inputs::{discover_inputs, InputKind};
use crate::optimizer::RasterOptimizer;
use crate::raster::read_raster;
use crate::stacker::SeriesStacker;

/// What a run produces from the discovered inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Optimised GeoTIFF copies.
    #[default]
    Optimize,
    /// One archive per input.
    PerFile,
    /// One archive for the whole stacked series.
    Stacked,
}

impl OutputMode {
    /// Map the CLI flags; `single` implies `netcdf`.
    pub fn from_flags(netcdf: bool, single: bool) -> Self {
        match (netcdf, single) {
            (_, true) => OutputMode::Stacked,
            (true, false) => OutputMode::PerFile,
            (false, false) => OutputMode::Optimize,
        }
    }
}

/// Options for a single conversion run.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub input_kind: InputKind,
    pub mode: OutputMode,
}

/// Outcome of a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversionSummary {
    /// Archives written.
    pub written: Vec<PathBuf>,
    /// Optimised rasters written.
    pub optimized: Vec<PathBuf>,
    /// Inputs that failed in per-file mode, with the reason.
    pub failed: Vec<(PathBuf, String)>,
}

/// Drives discovery, stacking, archive writing and optimisation.
pub struct Converter {
    config: PipelineConfig,
    optimizer: Box<dyn RasterOptimizer>,
}

impl Converter {
    pub fn new(config: PipelineConfig, optimizer: Box<dyn RasterOptimizer>) -> Self {
        Self { config, optimizer }
    }

    /// Run one batch. Inputs are processed sequentially in name order.
    #[instrument(skip(self, options), fields(input = %options.input_dir.display(), mode = ?options.mode))]
    pub fn run(&self, options: &ConvertOptions) -> Result<ConversionSummary> {
        std::fs::create_dir_all(&options.output_dir)
            .map_err(|e| IngestionError::not_found(&options.output_dir, e))?;

        let inputs = discover_inputs(&options.input_dir, options.input_kind)?;
        if inputs.is_empty() {
            return Err(IngestionError::NoInputs(options.input_dir.clone()));
        }
        info!(count = inputs.len(), "Found input files");

        let mut summary = ConversionSummary::default();
        match options.mode {
            OutputMode::Stacked => {
                let path = self.convert_stack(&inputs, &options.output_dir)?;
                summary.written.push(path);
            }
            OutputMode::PerFile => {
                for input in &inputs {
                    match self.convert_one(input, &options.output_dir, None) {
                        Ok(path) => summary.written.push(path),
                        Err(e) => {
                            error!(path = %input.display(), error = %e, "Conversion failed");
                            summary.failed.push((input.clone(), e.to_string()));
                        }
                    }
                }
            }
            OutputMode::Optimize => {
                for input in &inputs {
                    let Some(name) = input.file_name() else {
                        continue;
                    };
                    let output = options.output_dir.join(name);
                    match self.optimizer.optimize(input, &output) {
                        Ok(()) => summary.optimized.push(output),
                        Err(e) => {
                            error!(path = %input.display(), error = %e, "Optimization failed");
                            summary.failed.push((input.clone(), e.to_string()));
                        }
                    }
                }
            }
        }

        info!(
            written = summary.written.len(),
            optimized = summary.optimized.len(),
            failed = summary.failed.len(),
            "Conversion batch complete"
        );
        Ok(summary)
    }

    /// Stack every input into one raster, then archive it with one slice per date.
    pub fn convert_stack(&self, inputs: &[PathBuf], output_dir: &Path) -> Result<PathBuf> {
        let series = SeriesStacker::new().stack(inputs, output_dir)?;
        self.convert_one(&series.path, output_dir, Some(series.coordinates))
    }

    /// Archive one raster. `temporal_coordinates` is `None` for a single date
    /// taken from the file name.
    #[instrument(skip(self, temporal_coordinates), fields(path = %input.display()))]
    pub fn convert_one(
        &self,
        input: &Path,
        output_dir: &Path,
        temporal_coordinates: Option<Vec<TemporalCoordinate>>,
    ) -> Result<PathBuf> {
        let grid = read_raster(input)?;
        let corners = grid.corners();
        let native_axes = corners.native_axes(grid.rows(), grid.cols());

        let spatial_ref = SpatialReferenceDescriptor::from_wkt(grid.spatial_ref())?;
        let resolver =
            SpatialReferenceResolver::with_central_meridian(&spatial_ref, self.config.central_meridian)?;
        let geographic_axes =
            resolver.geographic_axes(&corners, grid.rows(), grid.cols(), self.config.axis_mode)?;

        let writer = ArchiveWriter::new(
            output_dir,
            self.config.metadata.clone(),
            self.config.writer.clone(),
        );
        let path = writer.write(&ArchiveRequest {
            grid: &grid,
            corners,
            native_axes,
            geographic_axes,
            spatial_ref: &spatial_ref,
            central_meridian: resolver.central_meridian(),
            temporal_coordinates,
        })?;

        info!(archive = %path.display(), "Wrote archive");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_from_flags() {
        assert_eq!(OutputMode::from_flags(false, false), OutputMode::Optimize);
        assert_eq!(OutputMode::from_flags(true, false), OutputMode::PerFile);
        assert_eq!(OutputMode::from_flags(false, true), OutputMode::Stacked);
        assert_eq!(OutputMode::from_flags(true, true), OutputMode::Stacked);
    }
}
