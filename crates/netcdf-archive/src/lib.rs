//! NetCDF-4 archive output for classified rasters.
//!
//! Writes one CF-attributed archive per invocation: a time axis (one slice
//! per date), native and geographic spatial axes, a `u8` data variable and a
//! scalar `crs` grid-mapping variable.
//!
//! # Example
//!
//! ```ignore
//! use netcdf_archive::{ArchiveMetadata, ArchiveWriter, WriterOptions};
//!
//! let writer = ArchiveWriter::new("out", ArchiveMetadata::default(), WriterOptions::default());
//! let path = writer.write(&request)?;
//! ```

pub mod crs;
pub mod error;
pub mod metadata;
pub mod native;
pub mod writer;

pub use crs::{CrsDescriptor, CrsValue};
pub use error::{ArchiveError, ArchiveResult};
pub use metadata::{clamp_slice, ArchiveMetadata, ClassRange, WriterOptions};
pub use native::{silence_hdf5_errors, ArchiveInfo};
pub use writer::{archive_path_for, ArchiveRequest, ArchiveWriter};
