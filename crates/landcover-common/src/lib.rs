//! Common types shared across the land-cover conversion crates.
//!
//! Holds the raster grid model, the geotransform-based geometry calculator
//! and the filename date handling used to build temporal coordinates.

pub mod bbox;
pub mod error;
pub mod grid;
pub mod time;

pub use bbox::CornerSet;
pub use error::{GridError, GridResult};
pub use grid::{AxisSample, GeoTransform, RasterGrid};
pub use time::{
    date_from_path, format_date_token, parse_date_token, DateParseError, TemporalCoordinate,
    TIME_CALENDAR, TIME_UNITS,
};
