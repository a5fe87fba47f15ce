//! Cloud-optimised GeoTIFF production.
//!
//! The real implementation shells out to the GDAL command line tools; tests
//! use [`RecordingOptimizer`].

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Mutex;

use tracing::{debug, info};

use crate::error::{IngestionError, Result};

/// Overview decimation levels passed to `gdaladdo`.
pub const OVERVIEW_LEVELS: [u32; 9] = [2, 4, 8, 16, 32, 64, 128, 256, 512];

/// Turns one raster into an optimised copy at `output`.
pub trait RasterOptimizer {
    fn optimize(&self, input: &Path, output: &Path) -> Result<()>;
}

/// Builds overviews in place, then writes a tiled DEFLATE copy.
#[derive(Debug, Clone, Default)]
pub struct GdalCommandOptimizer {
    tool_dir: Option<PathBuf>,
}

impl GdalCommandOptimizer {
    /// `tool_dir` holds the GDAL binaries; `None` resolves them through `PATH`.
    pub fn new(tool_dir: Option<PathBuf>) -> Self {
        Self { tool_dir }
    }

    fn tool(&self, name: &str) -> PathBuf {
        match &self.tool_dir {
            Some(dir) => dir.join(name),
            None => PathBuf::from(name),
        }
    }

    fn overview_args(input: &Path) -> Vec<String> {
        let mut args = vec![
            "-r".to_string(),
            "nearest".to_string(),
            input.display().to_string(),
        ];
        args.extend(OVERVIEW_LEVELS.iter().map(|level| level.to_string()));
        args
    }

    fn translate_args(input: &Path, output: &Path) -> Vec<String> {
        let mut args: Vec<String> = [
            "-co",
            "COMPRESS=DEFLATE",
            "-co",
            "BIGTIFF=YES",
            "-co",
            "TILED=YES",
            "-co",
            "BLOCKXSIZE=512",
            "-co",
            "BLOCKYSIZE=512",
            "--config",
            "GDAL_TIFF_OVR_BLOCKSIZE",
            "512",
            "-co",
            "COPY_SRC_OVERVIEWS=YES",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        args.push(input.display().to_string());
        args.push(output.display().to_string());
        args
    }

    fn run(&self, tool: &str, args: &[String]) -> Result<()> {
        let program = self.tool(tool);
        debug!(program = %program.display(), args = ?args, "Running GDAL tool");

        let output = Command::new(&program)
            .args(args)
            .output()
            .map_err(|e| {
                IngestionError::Optimizer(format!("failed to run {}: {}", program.display(), e))
            })?;

        if !output.status.success() {
            return Err(IngestionError::Optimizer(format!(
                "{} exited with {}: {}",
                tool,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }
}

impl RasterOptimizer for GdalCommandOptimizer {
    fn optimize(&self, input: &Path, output: &Path) -> Result<()> {
        self.run("gdaladdo", &Self::overview_args(input))?;

        if output.exists() {
            std::fs::remove_file(output).map_err(|e| {
                IngestionError::Optimizer(format!(
                    "cannot remove stale {}: {}",
                    output.display(),
                    e
                ))
            })?;
        }

        self.run("gdal_translate", &Self::translate_args(input, output))?;
        info!(input = %input.display(), output = %output.display(), "Optimized raster");
        Ok(())
    }
}

/// Test double that records every `(input, output)` pair.
#[derive(Debug, Default)]
pub struct RecordingOptimizer {
    calls: Mutex<Vec<(PathBuf, PathBuf)>>,
}

impl RecordingOptimizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<(PathBuf, PathBuf)> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }
}

impl RasterOptimizer for RecordingOptimizer {
    fn optimize(&self, input: &Path, output: &Path) -> Result<()> {
        let mut calls = self
            .calls
            .lock()
            .map_err(|_| IngestionError::Optimizer("recorder lock poisoned".to_string()))?;
        calls.push((input.to_path_buf(), output.to_path_buf()));
        Ok(())
    }
}

impl<T: RasterOptimizer + ?Sized> RasterOptimizer for std::sync::Arc<T> {
    fn optimize(&self, input: &Path, output: &Path) -> Result<()> {
        (**self).optimize(input, output)
    }
}
