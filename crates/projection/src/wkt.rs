//! Spatial reference descriptor backed by GDAL's OGR spatial reference.
//!
//! WKT1 and WKT2 are both accepted; GDAL normalises them into one node tree,
//! from which the CRS kind, names, authority code, ellipsoid and projection
//! parameters are read once. The original text is kept verbatim for the
//! archive's `spatial_ref` attribute and for building transformations.

use std::ffi::CString;

use gdal::spatial_ref::SpatialRef;
use tracing::debug;

use crate::error::{ProjectionError, ProjectionResult};
use crate::utm::{Ellipsoid, UtmZone};

/// Projection parameters captured from the CRS (OGR WKT1 names).
const PARAMETER_NAMES: [&str; 5] = [
    "latitude_of_origin",
    "central_meridian",
    "scale_factor",
    "false_easting",
    "false_northing",
];

/// Top-level kind of a coordinate reference system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrsKind {
    Projected,
    Geographic,
}

/// Parsed, immutable view of a raster's spatial reference.
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialReferenceDescriptor {
    wkt: String,
    kind: CrsKind,
    name: String,
    geographic_name: Option<String>,
    datum: Option<String>,
    method: Option<String>,
    epsg: Option<u32>,
    utm_zone: Option<UtmZone>,
    ellipsoid: Option<Ellipsoid>,
    parameters: Vec<(&'static str, f64)>,
}

impl SpatialReferenceDescriptor {
    /// Parse a WKT1 or WKT2 string.
    pub fn from_wkt(wkt: &str) -> ProjectionResult<Self> {
        // OSRNewSpatialReference accepts "" as an empty CRS.
        if wkt.trim().is_empty() {
            return Err(ProjectionError::InvalidWkt("empty WKT".to_string()));
        }
        let srs = SpatialRef::from_wkt(wkt).map_err(|e| ProjectionError::InvalidWkt(e.to_string()))?;

        let kind = if srs.is_projected() {
            CrsKind::Projected
        } else if srs.is_geographic() {
            CrsKind::Geographic
        } else {
            return Err(ProjectionError::UnsupportedProjection(format!(
                "'{}' is neither projected nor geographic",
                attr(&srs, "LOCAL_CS", 0).unwrap_or_else(|| wkt.chars().take(40).collect())
            )));
        };

        let geographic_name = attr(&srs, "GEOGCS", 0);
        let name = match kind {
            CrsKind::Projected => attr(&srs, "PROJCS", 0),
            CrsKind::Geographic => geographic_name.clone(),
        }
        .unwrap_or_default();

        let epsg = match srs.auth_name() {
            Ok(authority) if authority.eq_ignore_ascii_case("EPSG") => {
                srs.auth_code().ok().and_then(|c| u32::try_from(c).ok())
            }
            _ => None,
        };

        let ellipsoid = match (attr_f64(&srs, "SPHEROID", 1), attr_f64(&srs, "SPHEROID", 2)) {
            (Some(semi_major_axis), Some(inverse_flattening)) => Some(Ellipsoid {
                semi_major_axis,
                inverse_flattening,
            }),
            _ => None,
        };

        let parameters = match kind {
            CrsKind::Projected => PARAMETER_NAMES
                .iter()
                .filter_map(|&p| projection_parameter(&srs, p).map(|v| (p, v)))
                .collect(),
            CrsKind::Geographic => Vec::new(),
        };

        let utm_zone = match kind {
            CrsKind::Geographic => None,
            CrsKind::Projected => zone_from_name(&name).or_else(|| epsg.and_then(UtmZone::from_epsg)),
        };

        debug!(
            name = %name,
            epsg = ?epsg,
            utm_zone = ?utm_zone.map(|z| z.signed()),
            "Parsed spatial reference"
        );

        Ok(Self {
            wkt: wkt.to_string(),
            kind,
            name,
            geographic_name,
            datum: attr(&srs, "DATUM", 0),
            method: attr(&srs, "PROJECTION", 0),
            epsg,
            utm_zone,
            ellipsoid,
            parameters,
        })
    }

    /// Original WKT text.
    pub fn wkt(&self) -> &str {
        &self.wkt
    }

    pub fn kind(&self) -> CrsKind {
        self.kind
    }

    /// Name of the top-level CRS (e.g. `WGS 84 / UTM zone 37S`).
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn geographic_name(&self) -> Option<&str> {
        self.geographic_name.as_deref()
    }

    /// Projection method in OGR naming (`Transverse_Mercator`, `Mercator_1SP`).
    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    pub fn epsg(&self) -> Option<u32> {
        self.epsg
    }

    pub fn utm_zone(&self) -> Option<UtmZone> {
        self.utm_zone
    }

    pub fn ellipsoid(&self) -> Option<Ellipsoid> {
        self.ellipsoid
    }

    /// Look up a projection parameter by name, ignoring case and `_`/space.
    pub fn parameter(&self, name: &str) -> Option<f64> {
        let wanted = normalize_name(name);
        self.parameters
            .iter()
            .find(|(n, _)| normalize_name(n) == wanted)
            .map(|(_, v)| *v)
    }

    pub fn central_meridian(&self) -> Option<f64> {
        self.parameter("central_meridian")
    }

    /// True for a geographic CRS on the WGS 84 datum.
    pub fn is_geographic_wgs84(&self) -> bool {
        self.kind == CrsKind::Geographic
            && (self.epsg == Some(4326)
                || (self.epsg.is_none() && self.datum.as_deref() == Some("WGS_1984")))
    }
}

/// Text of `child` under the first node matching `path`.
fn attr(srs: &SpatialRef, path: &str, child: usize) -> Option<String> {
    srs.get_attr_value(path, child as _).ok().flatten()
}

fn attr_f64(srs: &SpatialRef, path: &str, child: usize) -> Option<f64> {
    attr(srs, path, child)?.trim().parse().ok()
}

/// `OSRGetProjParm`, which the safe wrapper does not expose.
fn projection_parameter(srs: &SpatialRef, name: &str) -> Option<f64> {
    let c_name = CString::new(name).ok()?;
    let mut err = gdal_sys::OGRErr::OGRERR_NONE;
    // SAFETY: the handle is owned by `srs` for the duration of the call and
    // `c_name` is a valid NUL-terminated string.
    let value =
        unsafe { gdal_sys::OSRGetProjParm(srs.to_c_hsrs(), c_name.as_ptr(), 0.0, &mut err) };
    (err == gdal_sys::OGRErr::OGRERR_NONE).then_some(value)
}

/// `OSRSetProjParm` on a projected CRS.
pub(crate) fn set_projection_parameter(
    srs: &mut SpatialRef,
    name: &str,
    value: f64,
) -> ProjectionResult<()> {
    let c_name =
        CString::new(name).map_err(|e| ProjectionError::UnsupportedProjection(e.to_string()))?;
    // SAFETY: as in `projection_parameter`; `srs` is borrowed mutably so no
    // other reference observes the change mid-call.
    let err = unsafe { gdal_sys::OSRSetProjParm(srs.to_c_hsrs(), c_name.as_ptr(), value) };
    if err != gdal_sys::OGRErr::OGRERR_NONE {
        return Err(ProjectionError::UnsupportedProjection(format!(
            "cannot set {} = {} (OGR error {})",
            name, value, err
        )));
    }
    Ok(())
}

fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '_' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Zone token from a name such as `WGS 84 / UTM zone 37S`.
fn zone_from_name(name: &str) -> Option<UtmZone> {
    if !name.to_ascii_uppercase().contains("UTM") {
        return None;
    }
    name.split_whitespace().rev().find_map(UtmZone::from_token)
}
