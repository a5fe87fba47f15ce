//! Coordinate reference system handling.
//!
//! Reads raster spatial references through GDAL's OGR layer and reprojects
//! native grid corners into geographic (EPSG:4326) coordinates with
//! `CoordTransform`. The series transverse Mercator in [`utm`] carries the
//! UTM zone conventions and serves as an independent check on GDAL's output.

pub mod error;
pub mod resolver;
pub mod utm;
pub mod wkt;

pub use error::{ProjectionError, ProjectionResult};
pub use resolver::{AxisMode, GeographicExtent, Reprojector, SpatialReferenceResolver};
pub use utm::{Ellipsoid, TransverseMercator, UtmZone};
pub use wkt::{CrsKind, SpatialReferenceDescriptor};
