//! Error types for archive writing.

use std::path::PathBuf;

use landcover_common::{DateParseError, GridError};
use thiserror::Error;

/// Result type for archive operations.
pub type ArchiveResult<T> = Result<T, ArchiveError>;

/// Error types for NetCDF archive creation.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// File I/O error (partial file handling, renames)
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error reported by the NetCDF library
    #[error("NetCDF error on {path}: {source}")]
    NetCdf {
        path: PathBuf,
        #[source]
        source: netcdf::Error,
    },

    /// Request shape does not match the grid
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// Grid access failure
    #[error("Invalid grid: {0}")]
    InvalidGrid(#[from] GridError),

    /// Single-slice archive without a usable filename date
    #[error("Invalid date: {0}")]
    InvalidDate(#[from] DateParseError),

    /// Missing required variable or attribute when reading back
    #[error("Missing required data: {0}")]
    MissingData(String),
}
