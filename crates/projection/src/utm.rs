//! Universal Transverse Mercator projection.
//!
//! Series expansion of the ellipsoidal transverse Mercator (USGS Professional
//! Paper 1395, Snyder 1987, pp. 60-64). Accurate to well under a metre within
//! a zone. Reprojection itself goes through GDAL; the zone conventions here
//! feed the archive's grid-mapping attributes.

use crate::error::{ProjectionError, ProjectionResult};

/// UTM scale factor on the central meridian.
pub const UTM_SCALE_FACTOR: f64 = 0.9996;

/// UTM false easting (metres).
pub const UTM_FALSE_EASTING: f64 = 500_000.0;

/// UTM false northing for the southern hemisphere (metres).
pub const UTM_FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

/// Reference ellipsoid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipsoid {
    /// Semi-major axis (metres)
    pub semi_major_axis: f64,
    /// Inverse flattening (1/f)
    pub inverse_flattening: f64,
}

impl Ellipsoid {
    pub const WGS84: Ellipsoid = Ellipsoid {
        semi_major_axis: 6_378_137.0,
        inverse_flattening: 298.257_223_563,
    };

    pub fn flattening(&self) -> f64 {
        if self.inverse_flattening == 0.0 {
            0.0
        } else {
            1.0 / self.inverse_flattening
        }
    }

    /// First eccentricity squared.
    pub fn e2(&self) -> f64 {
        let f = self.flattening();
        f * (2.0 - f)
    }
}

/// A UTM zone: number 1-60 plus hemisphere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UtmZone {
    pub number: u8,
    pub north: bool,
}

impl UtmZone {
    pub fn new(number: u8, north: bool) -> ProjectionResult<Self> {
        if !(1..=60).contains(&number) {
            return Err(ProjectionError::OutOfRange(format!(
                "UTM zone {} out of range (1-60)",
                number
            )));
        }
        Ok(Self { number, north })
    }

    /// Parse a `37S` / `33N` style token.
    pub fn from_token(token: &str) -> Option<Self> {
        let hemisphere = token.chars().last()?;
        let digits = &token[..token.len() - hemisphere.len_utf8()];
        let north = match hemisphere {
            'N' | 'n' => true,
            'S' | 's' => false,
            _ => return None,
        };
        let number: u8 = digits.parse().ok()?;
        Self::new(number, north).ok()
    }

    /// Zone implied by an EPSG code in the WGS 84 UTM ranges 32601-32660 / 32701-32760.
    pub fn from_epsg(code: u32) -> Option<Self> {
        match code {
            32601..=32660 => Self::new((code - 32600) as u8, true).ok(),
            32701..=32760 => Self::new((code - 32700) as u8, false).ok(),
            _ => None,
        }
    }

    /// `+zone` for north, `-zone` for south.
    pub fn signed(&self) -> i32 {
        if self.north {
            self.number as i32
        } else {
            -(self.number as i32)
        }
    }

    /// Central meridian of the zone in degrees.
    pub fn central_meridian(&self) -> f64 {
        -183.0 + 6.0 * self.number as f64
    }

    pub fn false_northing(&self) -> f64 {
        if self.north {
            0.0
        } else {
            UTM_FALSE_NORTHING_SOUTH
        }
    }
}

/// Transverse Mercator parameters with precomputed series constants.
#[derive(Debug, Clone)]
pub struct TransverseMercator {
    /// Central meridian in degrees
    pub central_meridian: f64,
    /// Scale factor on the central meridian
    pub scale_factor: f64,
    /// False easting (metres)
    pub false_easting: f64,
    /// False northing (metres)
    pub false_northing: f64,
    pub ellipsoid: Ellipsoid,
    e2: f64,
    ep2: f64,
    /// Meridional arc coefficients
    m1: f64,
    m2: f64,
    m3: f64,
    m4: f64,
    /// Footpoint latitude coefficients
    e1: f64,
}

impl TransverseMercator {
    pub fn new(
        central_meridian: f64,
        scale_factor: f64,
        false_easting: f64,
        false_northing: f64,
        ellipsoid: Ellipsoid,
    ) -> Self {
        let e2 = ellipsoid.e2();
        let e4 = e2 * e2;
        let e6 = e4 * e2;
        let sqrt_1me2 = (1.0 - e2).sqrt();

        Self {
            central_meridian,
            scale_factor,
            false_easting,
            false_northing,
            ellipsoid,
            e2,
            ep2: e2 / (1.0 - e2),
            m1: 1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0,
            m2: 3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0,
            m3: 15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0,
            m4: 35.0 * e6 / 3072.0,
            e1: (1.0 - sqrt_1me2) / (1.0 + sqrt_1me2),
        }
    }

    /// Standard UTM projection for a zone on the given ellipsoid.
    pub fn utm(zone: UtmZone, ellipsoid: Ellipsoid) -> Self {
        Self::new(
            zone.central_meridian(),
            UTM_SCALE_FACTOR,
            UTM_FALSE_EASTING,
            zone.false_northing(),
            ellipsoid,
        )
    }

    /// Meridional arc length from the equator to latitude `phi` (radians).
    fn meridional_arc(&self, phi: f64) -> f64 {
        self.ellipsoid.semi_major_axis
            * (self.m1 * phi - self.m2 * (2.0 * phi).sin() + self.m3 * (4.0 * phi).sin()
                - self.m4 * (6.0 * phi).sin())
    }

    /// Geographic (lon, lat) degrees to projected (easting, northing) metres.
    pub fn forward(&self, lon: f64, lat: f64) -> ProjectionResult<(f64, f64)> {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(ProjectionError::OutOfRange(format!(
                "latitude {} out of range [-90, 90]",
                lat
            )));
        }

        let a = self.ellipsoid.semi_major_axis;
        let k0 = self.scale_factor;
        let phi = lat.to_radians();
        let mut dlon = lon - self.central_meridian;
        if dlon > 180.0 {
            dlon -= 360.0;
        } else if dlon < -180.0 {
            dlon += 360.0;
        }
        let dlon = dlon.to_radians();

        let (sin_phi, cos_phi) = phi.sin_cos();
        let n = a / (1.0 - self.e2 * sin_phi * sin_phi).sqrt();
        let t = phi.tan().powi(2);
        let c = self.ep2 * cos_phi * cos_phi;
        let big_a = dlon * cos_phi;
        let m = self.meridional_arc(phi);

        let x = k0
            * n
            * (big_a
                + (1.0 - t + c) * big_a.powi(3) / 6.0
                + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * self.ep2) * big_a.powi(5) / 120.0);
        let y = k0
            * (m + n
                * phi.tan()
                * (big_a.powi(2) / 2.0
                    + (5.0 - t + 9.0 * c + 4.0 * c * c) * big_a.powi(4) / 24.0
                    + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * self.ep2) * big_a.powi(6)
                        / 720.0));

        Ok((x + self.false_easting, y + self.false_northing))
    }

    /// Projected (easting, northing) metres to geographic (lon, lat) degrees.
    pub fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        let a = self.ellipsoid.semi_major_axis;
        let k0 = self.scale_factor;
        let e1 = self.e1;

        let m = (y - self.false_northing) / k0;
        let mu = m / (a * self.m1);

        let phi1 = mu
            + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
            + (21.0 * e1 * e1 / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
            + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
            + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();

        let (sin_phi1, cos_phi1) = phi1.sin_cos();
        let tan_phi1 = phi1.tan();
        let denom = 1.0 - self.e2 * sin_phi1 * sin_phi1;
        let c1 = self.ep2 * cos_phi1 * cos_phi1;
        let t1 = tan_phi1 * tan_phi1;
        let n1 = a / denom.sqrt();
        let r1 = a * (1.0 - self.e2) / denom.powf(1.5);
        let d = (x - self.false_easting) / (n1 * k0);

        let lat = phi1
            - (n1 * tan_phi1 / r1)
                * (d * d / 2.0
                    - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * self.ep2) * d.powi(4)
                        / 24.0
                    + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1
                        - 252.0 * self.ep2
                        - 3.0 * c1 * c1)
                        * d.powi(6)
                        / 720.0);

        let lon = (d - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
            + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * self.ep2 + 24.0 * t1 * t1)
                * d.powi(5)
                / 120.0)
            / cos_phi1;

        (self.central_meridian + lon.to_degrees(), lat.to_degrees())
    }
}
