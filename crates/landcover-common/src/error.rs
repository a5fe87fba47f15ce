//! Error types for grid construction.

use thiserror::Error;

/// Result type alias using GridError.
pub type GridResult<T> = Result<T, GridError>;

/// Errors raised when a raster grid violates its shape invariants.
#[derive(Debug, Error)]
pub enum GridError {
    #[error("grid dimensions must be non-zero, got bands={bands} rows={rows} cols={cols}")]
    EmptyDimension { bands: usize, rows: usize, cols: usize },

    #[error("pixel buffer holds {actual} values, expected {expected} for shape {shape:?}")]
    ShapeMismatch {
        expected: usize,
        actual: usize,
        shape: (usize, usize, usize),
    },

    #[error("band index {index} out of range for grid with {bands} bands")]
    BandOutOfRange { index: usize, bands: usize },
}
