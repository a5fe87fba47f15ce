//! Attributes of the scalar `crs` grid-mapping variable.

use landcover_common::GeoTransform;
use projection::utm::{UTM_FALSE_EASTING, UTM_SCALE_FACTOR};
use projection::{CrsKind, Ellipsoid, SpatialReferenceDescriptor};

/// A single attribute value on the `crs` variable.
#[derive(Debug, Clone, PartialEq)]
pub enum CrsValue {
    Text(String),
    Double(f64),
    Int(i32),
    Doubles(Vec<f64>),
}

/// Ordered attribute list describing the archive's coordinate system.
#[derive(Debug, Clone, PartialEq)]
pub struct CrsDescriptor {
    attributes: Vec<(&'static str, CrsValue)>,
}

impl CrsDescriptor {
    /// Build the descriptor for a resolved spatial reference.
    ///
    /// `central_meridian` is the meridian actually used for reprojection; the
    /// zone's own meridian is used when it is `None`.
    pub fn new(
        srd: &SpatialReferenceDescriptor,
        central_meridian: Option<f64>,
        transform: &GeoTransform,
    ) -> Self {
        let ellipsoid = srd.ellipsoid().unwrap_or(Ellipsoid::WGS84);
        let mut attributes = Vec::new();

        match srd.kind() {
            CrsKind::Projected if is_transverse_mercator(srd) => {
                attributes.push(("grid_mapping_name", CrsValue::Text("transverse_mercator".into())));
                attributes.push(("crs_type", CrsValue::Text("projected_2d".into())));
                push_false_origin(&mut attributes, srd, UTM_FALSE_EASTING);
                attributes.push((
                    "latitude_of_projection_origin",
                    CrsValue::Double(srd.parameter("latitude_of_origin").unwrap_or(0.0)),
                ));
                attributes.push((
                    "scale_factor_at_central_meridian",
                    CrsValue::Double(srd.parameter("scale_factor").unwrap_or(UTM_SCALE_FACTOR)),
                ));
                if let Some(cm) = central_meridian
                    .or_else(|| srd.central_meridian())
                    .or_else(|| srd.utm_zone().map(|z| z.central_meridian()))
                {
                    attributes.push(("longitude_of_central_meridian", CrsValue::Double(cm)));
                }
                if let Some(zone) = srd.utm_zone() {
                    attributes.push(("utm_zone_number", CrsValue::Int(zone.signed())));
                }
            }
            CrsKind::Projected => {
                if let Some(name) = srd.method().and_then(cf_grid_mapping_name) {
                    attributes.push(("grid_mapping_name", CrsValue::Text(name.into())));
                }
                attributes.push(("crs_type", CrsValue::Text("projected_2d".into())));
                push_false_origin(&mut attributes, srd, 0.0);
                if let Some(cm) = central_meridian.or_else(|| srd.central_meridian()) {
                    attributes.push(("longitude_of_projection_origin", CrsValue::Double(cm)));
                }
                if let Some(k) = srd.parameter("scale_factor") {
                    attributes.push(("scale_factor_at_projection_origin", CrsValue::Double(k)));
                }
            }
            CrsKind::Geographic => {
                attributes.push(("grid_mapping_name", CrsValue::Text("latitude_longitude".into())));
                attributes.push(("crs_type", CrsValue::Text("geographic_2d".into())));
            }
        }

        attributes.push(("semi_major_axis", CrsValue::Double(ellipsoid.semi_major_axis)));
        attributes.push(("inverse_flattening", CrsValue::Double(ellipsoid.inverse_flattening)));
        if let Some(code) = srd.epsg().and_then(|c| i32::try_from(c).ok()) {
            attributes.push(("epsg_code", CrsValue::Int(code)));
        }
        attributes.push(("crs_wkt", CrsValue::Text(srd.wkt().to_string())));
        attributes.push(("spatial_ref", CrsValue::Text(srd.wkt().to_string())));
        attributes.push(("GeoTransform", CrsValue::Doubles(transform.coefficients().to_vec())));

        Self { attributes }
    }

    pub fn attributes(&self) -> &[(&'static str, CrsValue)] {
        &self.attributes
    }

    pub fn get(&self, name: &str) -> Option<&CrsValue> {
        self.attributes
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v)
    }

    /// Value of a `grid_mapping_name` / other text attribute.
    pub fn text(&self, name: &str) -> Option<&str> {
        match self.get(name)? {
            CrsValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn double(&self, name: &str) -> Option<f64> {
        match self.get(name)? {
            CrsValue::Double(v) => Some(*v),
            _ => None,
        }
    }
}

fn is_transverse_mercator(srd: &SpatialReferenceDescriptor) -> bool {
    srd.utm_zone().is_some() || srd.method() == Some("Transverse_Mercator")
}

fn push_false_origin(
    attributes: &mut Vec<(&'static str, CrsValue)>,
    srd: &SpatialReferenceDescriptor,
    default_easting: f64,
) {
    attributes.push((
        "false_easting",
        CrsValue::Double(srd.parameter("false_easting").unwrap_or(default_easting)),
    ));
    let false_northing = srd
        .parameter("false_northing")
        .or_else(|| srd.utm_zone().map(|z| z.false_northing()))
        .unwrap_or(0.0);
    attributes.push(("false_northing", CrsValue::Double(false_northing)));
}

/// CF `grid_mapping_name` for an OGR projection method, where CF has one.
fn cf_grid_mapping_name(method: &str) -> Option<&'static str> {
    match method {
        "Mercator_1SP" | "Mercator_2SP" => Some("mercator"),
        "Lambert_Conformal_Conic_1SP" | "Lambert_Conformal_Conic_2SP" => {
            Some("lambert_conformal_conic")
        }
        "Albers_Conic_Equal_Area" => Some("albers_conical_equal_area"),
        "Lambert_Azimuthal_Equal_Area" => Some("lambert_azimuthal_equal_area"),
        "Polar_Stereographic" => Some("polar_stereographic"),
        "Oblique_Stereographic" | "Stereographic" => Some("stereographic"),
        _ => None,
    }
}
