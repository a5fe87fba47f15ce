//! Merging a date-ordered series of single-date rasters into one stack.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use landcover_common::{date_from_path, format_date_token, RasterGrid, TemporalCoordinate};
use tracing::{info, instrument, warn};

use crate::error::{IngestionError, Result};
use crate::raster::{read_raster, write_raster};

/// Result of stacking: the merged raster plus one date per band.
#[derive(Debug, Clone, PartialEq)]
pub struct StackedSeries {
    pub path: PathBuf,
    pub dates: Vec<NaiveDate>,
    pub coordinates: Vec<TemporalCoordinate>,
    /// True when an existing merged artifact was reused.
    pub reused: bool,
}

/// Builds `{first}-{last}_{suffix}` multi-band stacks, one band per input.
#[derive(Debug, Clone, Default)]
pub struct SeriesStacker;

impl SeriesStacker {
    pub fn new() -> Self {
        Self
    }

    /// Merge `inputs` (in the given order) into `output_dir`.
    ///
    /// Every date is parsed before anything is read, so one bad file name
    /// aborts the whole batch. An existing artifact with the same name is
    /// reused as-is; delete it to force a rebuild.
    #[instrument(skip(self, inputs), fields(inputs = inputs.len()))]
    pub fn stack(&self, inputs: &[PathBuf], output_dir: &Path) -> Result<StackedSeries> {
        let (first, last) = match (inputs.first(), inputs.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(IngestionError::NoInputs(output_dir.to_path_buf())),
        };

        let dates = inputs
            .iter()
            .map(|p| date_from_path(p))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let coordinates = dates
            .iter()
            .map(|d| TemporalCoordinate::from_date(*d))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let name = merged_name(first, last, &dates)?;
        let path = output_dir.join(name);

        if path.exists() {
            info!(path = %path.display(), "Reusing existing stacked raster");
            return Ok(StackedSeries {
                path,
                dates,
                coordinates,
                reused: true,
            });
        }

        let merged = merge_bands(inputs, &path)?;
        let partial = output_dir.join(format!(
            ".{}.partial",
            path.file_name().and_then(|n| n.to_str()).unwrap_or("stack.tif")
        ));
        if let Err(e) = write_raster(&partial, &merged) {
            let _ = std::fs::remove_file(&partial);
            return Err(e);
        }
        std::fs::rename(&partial, &path).map_err(|e| IngestionError::unreadable(&path, e))?;

        info!(
            path = %path.display(),
            bands = merged.bands(),
            start = %format_date_token(dates[0]),
            end = %format_date_token(dates[dates.len() - 1]),
            "Stacked rasters"
        );

        Ok(StackedSeries {
            path,
            dates,
            coordinates,
            reused: false,
        })
    }
}

/// `{first date}-{last date}_{rest of the last name after its first '_'}`.
fn merged_name(first: &Path, last: &Path, dates: &[NaiveDate]) -> Result<String> {
    let last_name = last
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| IngestionError::unreadable(last, "file name is not valid UTF-8"))?;
    let suffix = last_name.split_once('_').map(|(_, rest)| rest).unwrap_or("stack.tif");

    let (Some(start), Some(end)) = (dates.first(), dates.last()) else {
        return Err(IngestionError::NoInputs(first.to_path_buf()));
    };
    Ok(format!(
        "{}-{}_{}",
        format_date_token(*start),
        format_date_token(*end),
        suffix
    ))
}

/// Read every input and concatenate their first bands.
fn merge_bands(inputs: &[PathBuf], target: &Path) -> Result<RasterGrid> {
    let mut data = Vec::new();
    let mut reference: Option<RasterGrid> = None;

    for input in inputs {
        let grid = read_raster(input)?;
        if grid.bands() > 1 {
            warn!(path = %input.display(), bands = grid.bands(), "Using first band of multi-band input");
        }

        if let Some(first) = &reference {
            if (grid.rows(), grid.cols()) != (first.rows(), first.cols()) {
                return Err(IngestionError::unreadable(
                    input,
                    format!(
                        "dimensions {}x{} differ from {}x{} of {}",
                        grid.rows(),
                        grid.cols(),
                        first.rows(),
                        first.cols(),
                        first.source().display()
                    ),
                ));
            }
        }

        data.extend_from_slice(grid.band(0).map_err(|e| IngestionError::unreadable(input, e))?);
        if reference.is_none() {
            reference = Some(grid);
        }
    }

    let first = reference.ok_or_else(|| IngestionError::NoInputs(target.to_path_buf()))?;
    RasterGrid::new(
        data,
        (inputs.len(), first.rows(), first.cols()),
        *first.transform(),
        first.spatial_ref(),
        target,
    )
    .map_err(|e| IngestionError::unreadable(target, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merged_name() {
        let dates = [
            NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2023, 1, 2).unwrap(),
        ];
        let name = merged_name(
            Path::new("/in/20230101_classification.tif"),
            Path::new("/in/20230102_classification.tif"),
            &dates,
        )
        .unwrap();
        assert_eq!(name, "20230101-20230102_classification.tif");

        let rgb = merged_name(
            Path::new("20230101_rgb_classification.tif"),
            Path::new("20230102_rgb_classification.tif"),
            &dates,
        )
        .unwrap();
        assert_eq!(rgb, "20230101-20230102_rgb_classification.tif");
    }

    #[test]
    fn test_empty_inputs() {
        let stacker = SeriesStacker::new();
        assert!(matches!(
            stacker.stack(&[], Path::new("/tmp")),
            Err(IngestionError::NoInputs(_))
        ));
    }

    #[test]
    fn test_bad_date_aborts_before_reading() {
        let stacker = SeriesStacker::new();
        let inputs = vec![
            PathBuf::from("/nonexistent/20230101_classification.tif"),
            PathBuf::from("/nonexistent/classification.tif"),
        ];
        assert!(matches!(
            stacker.stack(&inputs, Path::new("/nonexistent")),
            Err(IngestionError::DateParse(_))
        ));
    }
}
