//! Error types for the ingestion crate.

use std::path::PathBuf;

use landcover_common::DateParseError;
use netcdf_archive::ArchiveError;
use projection::ProjectionError;
use thiserror::Error;

/// Errors that can occur during conversion.
#[derive(Error, Debug)]
pub enum IngestionError {
    #[error("Resource not found: {path}: {reason}")]
    ResourceNotFound { path: PathBuf, reason: String },

    #[error("Unreadable raster {path}: {reason}")]
    UnreadableRaster { path: PathBuf, reason: String },

    #[error("Failed to parse date: {0}")]
    DateParse(#[from] DateParseError),

    #[error("Unsupported projection: {0}")]
    UnsupportedProjection(#[from] ProjectionError),

    #[error("Failed to write archive: {0}")]
    ArchiveWrite(#[from] ArchiveError),

    #[error("Could not find any input files in {0}")]
    NoInputs(PathBuf),

    #[error("Optimizer failed: {0}")]
    Optimizer(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl IngestionError {
    pub(crate) fn unreadable(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::UnreadableRaster {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn not_found(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::ResourceNotFound {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestionError>;
