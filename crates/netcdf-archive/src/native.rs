//! Native NetCDF library helpers.
//!
//! HDF5 diagnostics silencing plus a small read-back view of a written
//! archive, used for post-write logging and by tests.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Once;

use netcdf::AttributeValue;

use crate::error::{ArchiveError, ArchiveResult};

/// Silence HDF5's automatic error printing to stderr.
///
/// The HDF5 C library prints verbose error messages to stderr even when errors
/// are handled gracefully by the Rust code (e.g., when checking for optional
/// attributes that don't exist). This disables that output by calling
/// H5Eset_auto2 with null handlers. Safe to call multiple times.
pub fn silence_hdf5_errors() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        // SAFETY: H5Eset_auto2 is thread-safe and we're passing null pointers
        // to disable error output, which is a documented valid use.
        unsafe {
            hdf5_metno_sys::h5e::H5Eset_auto2(
                hdf5_metno_sys::h5e::H5E_DEFAULT,
                None,
                std::ptr::null_mut(),
            );
        }
    });
}

/// Contents of an archive as read back from disk.
#[derive(Debug, Clone)]
pub struct ArchiveInfo {
    pub time: Vec<f64>,
    pub x0: Vec<f64>,
    pub y0: Vec<f64>,
    pub lon: Vec<f64>,
    pub lat: Vec<f64>,
    /// `(time, y0, x0)` flattened.
    pub data: Vec<u8>,
    pub globals: BTreeMap<String, String>,
    pub crs: BTreeMap<String, AttributeValue>,
    pub data_attributes: BTreeMap<String, AttributeValue>,
    pub time_attributes: BTreeMap<String, AttributeValue>,
    pub y0_attributes: BTreeMap<String, AttributeValue>,
    pub lat_attributes: BTreeMap<String, AttributeValue>,
}

impl ArchiveInfo {
    pub fn open(path: &Path) -> ArchiveResult<Self> {
        silence_hdf5_errors();

        let nc = |source: netcdf::Error| ArchiveError::NetCdf {
            path: path.to_path_buf(),
            source,
        };
        let file = netcdf::open(path).map_err(nc)?;

        let variable = |name: &str| {
            file.variable(name)
                .ok_or_else(|| ArchiveError::MissingData(format!("{} variable", name)))
        };
        let values = |name: &str| -> ArchiveResult<Vec<f64>> {
            let values: Vec<f64> = variable(name)?.get_values(..).map_err(nc)?;
            Ok(values)
        };

        let mut globals = BTreeMap::new();
        for attr in file.attributes() {
            if let Ok(AttributeValue::Str(s)) = attr.value() {
                globals.insert(attr.name().to_string(), s);
            }
        }

        let data: Vec<u8> = variable("data")?.get_values(..).map_err(nc)?;

        Ok(Self {
            time: values("time")?,
            x0: values("x0")?,
            y0: values("y0")?,
            lon: values("lon")?,
            lat: values("lat")?,
            data,
            globals,
            crs: attributes(&variable("crs")?),
            data_attributes: attributes(&variable("data")?),
            time_attributes: attributes(&variable("time")?),
            y0_attributes: attributes(&variable("y0")?),
            lat_attributes: attributes(&variable("lat")?),
        })
    }

    pub fn slices(&self) -> usize {
        self.time.len()
    }

    /// Pixels of slice `t`, row-major.
    pub fn slice(&self, t: usize) -> Option<&[u8]> {
        let len = self.x0.len() * self.y0.len();
        self.data.get(t * len..(t + 1) * len)
    }

    pub fn global(&self, name: &str) -> Option<&str> {
        self.globals.get(name).map(String::as_str)
    }

    pub fn crs_f64(&self, name: &str) -> Option<f64> {
        self.crs.get(name).cloned().and_then(|v| f64::try_from(v).ok())
    }

    pub fn crs_str(&self, name: &str) -> Option<&str> {
        match self.crs.get(name)? {
            AttributeValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

fn attributes(var: &netcdf::Variable) -> BTreeMap<String, AttributeValue> {
    var.attributes()
        .filter_map(|attr| Some((attr.name().to_string(), attr.value().ok()?)))
        .collect()
}
