//! Reprojection of native corners and axes into geographic coordinates.

use std::fmt;

use gdal::spatial_ref::{CoordTransform, SpatialRef};
use landcover_common::{AxisSample, CornerSet};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::error::{ProjectionError, ProjectionResult};
use crate::utm::UtmZone;
use crate::wkt::{set_projection_parameter, CrsKind, SpatialReferenceDescriptor};

/// How geographic axis samples are derived from a native extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisMode {
    /// Linear interpolation between the reprojected extremes.
    #[default]
    Linear,
    /// Reproject every native sample along the grid's centre row/column.
    Exact,
}

/// Bounding box in degrees (EPSG:4326).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeographicExtent {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

/// Native-to-geographic coordinate mapping.
pub enum Reprojector {
    /// Native CRS already is geographic WGS 84.
    Identity,
    /// GDAL transformation from the native CRS to EPSG:4326, datum shift included.
    Transform {
        source: String,
        transform: CoordTransform,
    },
}

impl fmt::Debug for Reprojector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reprojector::Identity => f.write_str("Identity"),
            Reprojector::Transform { source, .. } => {
                f.debug_struct("Transform").field("source", source).finish()
            }
        }
    }
}

impl Reprojector {
    /// Native (x, y) to (lon, lat) degrees.
    pub fn to_geographic(&self, x: f64, y: f64) -> ProjectionResult<(f64, f64)> {
        let mut xs = [x];
        let mut ys = [y];
        self.to_geographic_in_place(&mut xs, &mut ys)?;
        Ok((xs[0], ys[0]))
    }

    /// Reproject paired native coordinates in place; `xs` become longitudes.
    pub fn to_geographic_in_place(&self, xs: &mut [f64], ys: &mut [f64]) -> ProjectionResult<()> {
        if xs.len() != ys.len() {
            return Err(ProjectionError::OutOfRange(format!(
                "{} x values paired with {} y values",
                xs.len(),
                ys.len()
            )));
        }
        if let Reprojector::Transform { source, transform } = self {
            let mut zs = vec![0.0; xs.len()];
            transform.transform_coords(xs, ys, &mut zs).map_err(|e| {
                ProjectionError::OutOfRange(format!("{} to EPSG:4326: {}", source, e))
            })?;
        }

        for (lon, lat) in xs.iter().zip(ys.iter()) {
            if !lon.is_finite() || !lat.is_finite() || !(-90.0..=90.0).contains(lat) {
                return Err(ProjectionError::OutOfRange(format!(
                    "({}, {}) is not a valid geographic position",
                    lon, lat
                )));
            }
        }
        Ok(())
    }
}

/// Resolves a [`SpatialReferenceDescriptor`] into a reprojection to EPSG:4326.
#[derive(Debug)]
pub struct SpatialReferenceResolver {
    reprojector: Reprojector,
    zone: Option<UtmZone>,
    central_meridian: Option<f64>,
}

impl SpatialReferenceResolver {
    /// Build the reprojection for a descriptor.
    ///
    /// Geographic WGS 84 maps through unchanged. Any other CRS needs a UTM
    /// zone or an EPSG code and is handed to GDAL, which applies the datum
    /// shift to WGS 84.
    pub fn new(descriptor: &SpatialReferenceDescriptor) -> ProjectionResult<Self> {
        Self::with_central_meridian(descriptor, None)
    }

    /// Like [`Self::new`], but forcing the central meridian of a projected CRS.
    pub fn with_central_meridian(
        descriptor: &SpatialReferenceDescriptor,
        central_meridian: Option<f64>,
    ) -> ProjectionResult<Self> {
        if descriptor.is_geographic_wgs84() {
            debug!(reprojector = "identity", "Resolved spatial reference");
            return Ok(Self {
                reprojector: Reprojector::Identity,
                zone: None,
                central_meridian: None,
            });
        }

        let zone = descriptor.utm_zone();
        if zone.is_none() && descriptor.epsg().is_none() {
            return Err(ProjectionError::UnsupportedProjection(format!(
                "no UTM zone or EPSG code in '{}'",
                descriptor.name()
            )));
        }

        let mut source = SpatialRef::from_wkt(descriptor.wkt())
            .map_err(|e| ProjectionError::InvalidWkt(e.to_string()))?;

        let central_meridian = match descriptor.kind() {
            CrsKind::Geographic => None,
            CrsKind::Projected => match (central_meridian, descriptor.central_meridian()) {
                (Some(forced), Some(_)) => {
                    set_projection_parameter(&mut source, "central_meridian", forced)?;
                    Some(forced)
                }
                (Some(forced), None) => {
                    warn!(
                        crs = %descriptor.name(),
                        central_meridian = forced,
                        "Projection has no central meridian; override ignored"
                    );
                    None
                }
                (None, native) => native.or_else(|| zone.map(|z| z.central_meridian())),
            },
        };

        let mut target = SpatialRef::from_epsg(4326)
            .map_err(|e| ProjectionError::UnsupportedProjection(e.to_string()))?;
        traditional_gis_order(&mut source);
        traditional_gis_order(&mut target);

        let label = match descriptor.epsg() {
            Some(code) => format!("EPSG:{}", code),
            None => descriptor.name().to_string(),
        };
        let transform = CoordTransform::new(&source, &target).map_err(|e| {
            ProjectionError::UnsupportedProjection(format!(
                "no transformation from {} to EPSG:4326: {}",
                label, e
            ))
        })?;

        debug!(
            source = %label,
            utm_zone = ?zone.map(|z| z.signed()),
            central_meridian = ?central_meridian,
            "Resolved spatial reference"
        );
        Ok(Self {
            reprojector: Reprojector::Transform {
                source: label,
                transform,
            },
            zone,
            central_meridian,
        })
    }

    pub fn reprojector(&self) -> &Reprojector {
        &self.reprojector
    }

    pub fn zone(&self) -> Option<UtmZone> {
        self.zone
    }

    /// Central meridian used by the projection, if projected.
    pub fn central_meridian(&self) -> Option<f64> {
        self.central_meridian
    }

    /// Reproject the (min_x, min_y) and (max_x, max_y) corners and order them.
    #[instrument(skip(self), level = "debug")]
    pub fn reproject_corners(&self, corners: &CornerSet) -> ProjectionResult<GeographicExtent> {
        let mut xs = [corners.min_x, corners.max_x];
        let mut ys = [corners.min_y, corners.max_y];
        self.reprojector.to_geographic_in_place(&mut xs, &mut ys)?;

        Ok(GeographicExtent {
            min_lon: xs[0].min(xs[1]),
            min_lat: ys[0].min(ys[1]),
            max_lon: xs[0].max(xs[1]),
            max_lat: ys[0].max(ys[1]),
        })
    }

    /// Longitude samples over `cols` and latitude samples over `rows`.
    pub fn geographic_axes(
        &self,
        corners: &CornerSet,
        rows: usize,
        cols: usize,
        mode: AxisMode,
    ) -> ProjectionResult<(AxisSample, AxisSample)> {
        match mode {
            AxisMode::Linear => {
                let extent = self.reproject_corners(corners)?;
                Ok((
                    AxisSample::linspace(extent.min_lon, extent.max_lon, cols),
                    AxisSample::linspace(extent.min_lat, extent.max_lat, rows),
                ))
            }
            AxisMode::Exact => {
                let (native_x, native_y) = corners.native_axes(rows, cols);
                let (center_x, center_y) = corners.center();

                let mut lons = native_x.values().to_vec();
                let mut row_y = vec![center_y; lons.len()];
                self.reprojector.to_geographic_in_place(&mut lons, &mut row_y)?;

                let mut col_x = vec![center_x; native_y.len()];
                let mut lats = native_y.values().to_vec();
                self.reprojector.to_geographic_in_place(&mut col_x, &mut lats)?;

                lons.sort_by(f64::total_cmp);
                lats.sort_by(f64::total_cmp);
                Ok((AxisSample::from_values(lons), AxisSample::from_values(lats)))
            }
        }
    }
}

/// Longitude/easting first, whatever the CRS's authority axis order.
fn traditional_gis_order(srs: &mut SpatialRef) {
    srs.set_axis_mapping_strategy(gdal_sys::OSRAxisMappingStrategy::OAMS_TRADITIONAL_GIS_ORDER);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utm::{Ellipsoid, TransverseMercator};
    use test_utils::fixtures::{
        ARC1960_UTM_37S_WKT1, NAD83_WKT1, PSEUDO_MERCATOR_WKT1, UTM_37S_WKT1, WGS84_WKT1,
    };
    use test_utils::{assert_approx_eq, assert_coords_approx_eq};

    fn resolver_for(wkt: &str) -> SpatialReferenceResolver {
        let srd = SpatialReferenceDescriptor::from_wkt(wkt).unwrap();
        SpatialReferenceResolver::new(&srd).unwrap()
    }

    #[test]
    fn test_identity_for_geographic() {
        let resolver = resolver_for(WGS84_WKT1);
        assert!(matches!(resolver.reprojector(), Reprojector::Identity));

        let corners = CornerSet::from_points([(36.0, -4.0), (37.0, -3.0)]).unwrap();
        let extent = resolver.reproject_corners(&corners).unwrap();
        assert_eq!(extent.min_lon, 36.0);
        assert_eq!(extent.max_lat, -3.0);

        let (lons, lats) = resolver
            .geographic_axes(&corners, 5, 11, AxisMode::Exact)
            .unwrap();
        assert_eq!(lons.values(), corners.native_axes(5, 11).0.values());
        assert_eq!(lats.values(), corners.native_axes(5, 11).1.values());
    }

    #[test]
    fn test_utm_corners_land_in_zone() {
        let resolver = resolver_for(UTM_37S_WKT1);
        assert_eq!(resolver.zone().map(|z| z.signed()), Some(-37));
        assert_eq!(resolver.central_meridian(), Some(39.0));

        let corners = CornerSet::from_points([(500_000.0, 9_000_000.0), (510_000.0, 9_010_000.0)])
            .unwrap();
        let extent = resolver.reproject_corners(&corners).unwrap();

        assert!(extent.min_lon <= extent.max_lon);
        assert!(extent.min_lat <= extent.max_lat);
        assert_approx_eq!(extent.min_lon, 39.0, 1e-6);
        // 1,000 km south of the equator is roughly 9.04 degrees S.
        assert!(extent.min_lat > -9.1 && extent.min_lat < -9.0, "lat {}", extent.min_lat);
        assert!(extent.max_lon > 39.08 && extent.max_lon < 39.1, "lon {}", extent.max_lon);
    }

    #[test]
    fn test_utm_agrees_with_series_transverse_mercator() {
        let resolver = resolver_for(UTM_37S_WKT1);
        let zone = resolver.zone().unwrap();
        let series = TransverseMercator::utm(zone, Ellipsoid::WGS84);

        for (x, y) in [(500_000.0, 9_000_000.0), (612_345.0, 9_456_789.0), (420_000.0, 9_800_000.0)] {
            let (lon, lat) = resolver.reprojector().to_geographic(x, y).unwrap();
            assert_coords_approx_eq!((lon, lat), series.inverse(x, y), 1e-5);
            let (fx, fy) = series.forward(lon, lat).unwrap();
            assert_coords_approx_eq!((fx, fy), (x, y), 1.0);
        }
    }

    #[test]
    fn test_linear_and_exact_axes_agree_for_small_grid() {
        let resolver = resolver_for(UTM_37S_WKT1);
        let corners = CornerSet::from_points([(500_000.0, 9_000_000.0), (502_000.0, 9_001_000.0)])
            .unwrap();

        let (lin_lon, lin_lat) = resolver
            .geographic_axes(&corners, 100, 200, AxisMode::Linear)
            .unwrap();
        let (ex_lon, ex_lat) = resolver
            .geographic_axes(&corners, 100, 200, AxisMode::Exact)
            .unwrap();

        assert_eq!(lin_lon.len(), 200);
        assert_eq!(lin_lat.len(), 100);
        assert_eq!(ex_lon.len(), 200);
        assert_eq!(ex_lat.len(), 100);
        assert!(ex_lon.is_non_decreasing());
        assert!(ex_lat.is_non_decreasing());

        for (a, b) in lin_lon.values().iter().zip(ex_lon.values()) {
            assert_approx_eq!(*a, *b, 1e-4);
        }
        for (a, b) in lin_lat.values().iter().zip(ex_lat.values()) {
            assert_approx_eq!(*a, *b, 1e-4);
        }
    }

    #[test]
    fn test_central_meridian_override() {
        let srd = SpatialReferenceDescriptor::from_wkt(UTM_37S_WKT1).unwrap();
        let resolver = SpatialReferenceResolver::with_central_meridian(&srd, Some(40.0)).unwrap();
        assert_eq!(resolver.central_meridian(), Some(40.0));
        let (lon, _) = resolver
            .reprojector()
            .to_geographic(500_000.0, 9_000_000.0)
            .unwrap();
        assert_approx_eq!(lon, 40.0, 1e-7);
    }

    #[test]
    fn test_non_utm_projected_code_resolves() {
        let resolver = resolver_for(PSEUDO_MERCATOR_WKT1);
        assert!(resolver.zone().is_none());
        assert_eq!(resolver.central_meridian(), Some(0.0));

        // One degree of longitude and latitude on the Web Mercator sphere.
        let corners =
            CornerSet::from_points([(0.0, 0.0), (111_319.490_793_273_6, 111_325.142_866_384_9)])
                .unwrap();
        let extent = resolver.reproject_corners(&corners).unwrap();
        assert_coords_approx_eq!((extent.min_lon, extent.min_lat), (0.0, 0.0), 1e-9);
        assert_coords_approx_eq!((extent.max_lon, extent.max_lat), (1.0, 1.0), 1e-6);
    }

    #[test]
    fn test_non_wgs84_geographic_code_resolves() {
        let resolver = resolver_for(NAD83_WKT1);
        assert!(matches!(resolver.reprojector(), Reprojector::Transform { .. }));
        assert!(resolver.central_meridian().is_none());

        // Longitude stays first even though EPSG:4269 is latitude-first.
        let (lon, lat) = resolver.reprojector().to_geographic(-100.0, 40.0).unwrap();
        assert_coords_approx_eq!((lon, lat), (-100.0, 40.0), 1e-4);
    }

    #[test]
    fn test_datum_shift_applied_for_other_datum() {
        let arc = resolver_for(ARC1960_UTM_37S_WKT1);
        let wgs = resolver_for(UTM_37S_WKT1);
        assert_eq!(arc.zone(), wgs.zone());

        let (arc_lon, arc_lat) = arc.reprojector().to_geographic(500_000.0, 9_000_000.0).unwrap();
        let (wgs_lon, wgs_lat) = wgs.reprojector().to_geographic(500_000.0, 9_000_000.0).unwrap();

        // Clarke 1880 plus the Helmert shift moves the point a few hundred metres.
        assert!((arc_lat - wgs_lat).abs() > 1.5e-3, "lat {} vs {}", arc_lat, wgs_lat);
        assert!(arc_lon - wgs_lon > 5e-4, "lon {} vs {}", arc_lon, wgs_lon);
        assert_coords_approx_eq!((arc_lon, arc_lat), (39.000_87, -9.049_29), 1e-3);

        // The ellipsoid alone, without the shift, lands elsewhere.
        let clarke = TransverseMercator::utm(arc.zone().unwrap(), Ellipsoid {
            semi_major_axis: 6_378_249.145,
            inverse_flattening: 293.465,
        });
        let (_, no_shift_lat) = clarke.inverse(500_000.0, 9_000_000.0);
        assert!((arc_lat - no_shift_lat).abs() > 1e-3);
    }

    #[test]
    fn test_unsupported_projection() {
        let wkt = r#"PROJCS["Custom Albers",GEOGCS["NAD83",DATUM["North_American_Datum_1983",SPHEROID["GRS 1980",6378137,298.257222101]],PRIMEM["Greenwich",0],UNIT["degree",0.0174532925199433]],PROJECTION["Albers_Conic_Equal_Area"],PARAMETER["latitude_of_center",23],PARAMETER["longitude_of_center",-96],PARAMETER["standard_parallel_1",29.5],PARAMETER["standard_parallel_2",45.5],PARAMETER["false_easting",0],PARAMETER["false_northing",0],UNIT["metre",1]]"#;
        let srd = SpatialReferenceDescriptor::from_wkt(wkt).unwrap();
        let err = SpatialReferenceResolver::new(&srd).unwrap_err();
        assert!(matches!(err, ProjectionError::UnsupportedProjection(_)));
        assert!(err.to_string().contains("Custom Albers"));
    }
}
