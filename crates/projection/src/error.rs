//! Error types for spatial reference resolution.

use thiserror::Error;

/// Result type for projection operations.
pub type ProjectionResult<T> = Result<T, ProjectionError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProjectionError {
    /// GDAL could not parse the WKT.
    #[error("invalid WKT: {0}")]
    InvalidWkt(String),

    /// Neither a UTM zone nor an EPSG code could be derived, or GDAL has no
    /// transformation to EPSG:4326.
    #[error("unsupported projection: {0}")]
    UnsupportedProjection(String),

    /// A coordinate lies outside the projection's valid domain.
    #[error("coordinate out of range: {0}")]
    OutOfRange(String),
}
