//! Common test fixtures for land-cover conversion tests.
//!
//! Spatial references are the exact WKT GDAL reports for the CRSs the
//! classifier produces, so parsing tests exercise real-world text.

/// WGS 84 / UTM zone 37S as GDAL writes it (WKT1).
pub const UTM_37S_WKT1: &str = r#"PROJCS["WGS 84 / UTM zone 37S",GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563,AUTHORITY["EPSG","7030"]],AUTHORITY["EPSG","6326"]],PRIMEM["Greenwich",0,AUTHORITY["EPSG","8901"]],UNIT["degree",0.0174532925199433,AUTHORITY["EPSG","9122"]],AUTHORITY["EPSG","4326"]],PROJECTION["Transverse_Mercator"],PARAMETER["latitude_of_origin",0],PARAMETER["central_meridian",39],PARAMETER["scale_factor",0.9996],PARAMETER["false_easting",500000],PARAMETER["false_northing",10000000],UNIT["metre",1,AUTHORITY["EPSG","9001"]],AXIS["Easting",EAST],AXIS["Northing",NORTH],AUTHORITY["EPSG","32737"]]"#;

/// WGS 84 / UTM zone 37S in WKT2-2019.
pub const UTM_37S_WKT2: &str = r#"PROJCRS["WGS 84 / UTM zone 37S",
    BASEGEOGCRS["WGS 84",
        DATUM["World Geodetic System 1984",
            ELLIPSOID["WGS 84",6378137,298.257223563,
                LENGTHUNIT["metre",1]]],
        PRIMEM["Greenwich",0,
            ANGLEUNIT["degree",0.0174532925199433]],
        ID["EPSG",4326]],
    CONVERSION["UTM zone 37S",
        METHOD["Transverse Mercator",
            ID["EPSG",9807]],
        PARAMETER["Latitude of natural origin",0,
            ANGLEUNIT["degree",0.0174532925199433],
            ID["EPSG",8801]],
        PARAMETER["Longitude of natural origin",39,
            ANGLEUNIT["degree",0.0174532925199433],
            ID["EPSG",8802]],
        PARAMETER["Scale factor at natural origin",0.9996,
            SCALEUNIT["unity",1],
            ID["EPSG",8805]],
        PARAMETER["False easting",500000,
            LENGTHUNIT["metre",1],
            ID["EPSG",8806]],
        PARAMETER["False northing",10000000,
            LENGTHUNIT["metre",1],
            ID["EPSG",8807]]],
    CS[Cartesian,2],
        AXIS["(E)",east,
            ORDER[1],
            LENGTHUNIT["metre",1]],
        AXIS["(N)",north,
            ORDER[2],
            LENGTHUNIT["metre",1]],
    ID["EPSG",32737]]"#;

/// WGS 84 / UTM zone 33N (WKT1), for northern-hemisphere cases.
pub const UTM_33N_WKT1: &str = r#"PROJCS["WGS 84 / UTM zone 33N",GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563,AUTHORITY["EPSG","7030"]],AUTHORITY["EPSG","6326"]],PRIMEM["Greenwich",0],UNIT["degree",0.0174532925199433],AUTHORITY["EPSG","4326"]],PROJECTION["Transverse_Mercator"],PARAMETER["latitude_of_origin",0],PARAMETER["central_meridian",15],PARAMETER["scale_factor",0.9996],PARAMETER["false_easting",500000],PARAMETER["false_northing",0],UNIT["metre",1],AUTHORITY["EPSG","32633"]]"#;

/// Geographic WGS 84 (EPSG:4326), WKT1.
pub const WGS84_WKT1: &str = r#"GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563,AUTHORITY["EPSG","7030"]],AUTHORITY["EPSG","6326"]],PRIMEM["Greenwich",0,AUTHORITY["EPSG","8901"]],UNIT["degree",0.0174532925199433,AUTHORITY["EPSG","9122"]],AXIS["Latitude",NORTH],AXIS["Longitude",EAST],AUTHORITY["EPSG","4326"]]"#;

/// WGS 84 / Pseudo-Mercator (EPSG:3857), WKT1.
pub const PSEUDO_MERCATOR_WKT1: &str = r#"PROJCS["WGS 84 / Pseudo-Mercator",GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563,AUTHORITY["EPSG","7030"]],AUTHORITY["EPSG","6326"]],PRIMEM["Greenwich",0,AUTHORITY["EPSG","8901"]],UNIT["degree",0.0174532925199433,AUTHORITY["EPSG","9122"]],AUTHORITY["EPSG","4326"]],PROJECTION["Mercator_1SP"],PARAMETER["central_meridian",0],PARAMETER["scale_factor",1],PARAMETER["false_easting",0],PARAMETER["false_northing",0],UNIT["metre",1,AUTHORITY["EPSG","9001"]],AXIS["Easting",EAST],AXIS["Northing",NORTH],EXTENSION["PROJ4","+proj=merc +a=6378137 +b=6378137 +lat_ts=0 +lon_0=0 +x_0=0 +y_0=0 +k=1 +units=m +nadgrids=@null +wktext +no_defs"],AUTHORITY["EPSG","3857"]]"#;

/// Geographic NAD83 (EPSG:4269), WKT1.
pub const NAD83_WKT1: &str = r#"GEOGCS["NAD83",DATUM["North_American_Datum_1983",SPHEROID["GRS 1980",6378137,298.257222101,AUTHORITY["EPSG","7019"]],AUTHORITY["EPSG","6269"]],PRIMEM["Greenwich",0,AUTHORITY["EPSG","8901"]],UNIT["degree",0.0174532925199433,AUTHORITY["EPSG","9122"]],AXIS["Latitude",NORTH],AXIS["Longitude",EAST],AUTHORITY["EPSG","4269"]]"#;

/// Arc 1960 / UTM zone 37S (EPSG:21037), WKT1 with its Helmert shift to WGS 84.
pub const ARC1960_UTM_37S_WKT1: &str = r#"PROJCS["Arc 1960 / UTM zone 37S",GEOGCS["Arc 1960",DATUM["Arc_1960",SPHEROID["Clarke 1880 (RGS)",6378249.145,293.465,AUTHORITY["EPSG","7012"]],TOWGS84[-160,-6,-302,0,0,0,0],AUTHORITY["EPSG","6210"]],PRIMEM["Greenwich",0,AUTHORITY["EPSG","8901"]],UNIT["degree",0.0174532925199433,AUTHORITY["EPSG","9122"]],AUTHORITY["EPSG","4210"]],PROJECTION["Transverse_Mercator"],PARAMETER["latitude_of_origin",0],PARAMETER["central_meridian",39],PARAMETER["scale_factor",0.9996],PARAMETER["false_easting",500000],PARAMETER["false_northing",10000000],UNIT["metre",1,AUTHORITY["EPSG","9001"]],AXIS["Easting",EAST],AXIS["Northing",NORTH],AUTHORITY["EPSG","21037"]]"#;

/// Common tile layouts for testing.
pub mod tiles {
    /// Layout of a synthetic classification tile.
    #[derive(Debug, Clone, Copy)]
    pub struct TileSpec {
        pub rows: usize,
        pub cols: usize,
        /// GDAL-ordered geotransform.
        pub transform: [f64; 6],
    }

    impl TileSpec {
        /// Returns the number of pixels per band.
        pub fn size(&self) -> usize {
            self.rows * self.cols
        }

        /// Native extent as (min_x, min_y, max_x, max_y) for a north-up tile.
        pub fn extent(&self) -> (f64, f64, f64, f64) {
            let gt = &self.transform;
            let max_x = gt[0] + self.cols as f64 * gt[1];
            let min_y = gt[3] + self.rows as f64 * gt[5];
            (gt[0], min_y, max_x, gt[3])
        }
    }

    /// 100x100 tile of 10 m pixels in UTM 37S, 1000 km south of the equator.
    pub const UTM_37S_100: TileSpec = TileSpec {
        rows: 100,
        cols: 100,
        transform: [500_000.0, 10.0, 0.0, 9_000_000.0, 0.0, -10.0],
    };

    /// Non-square 100 rows x 200 cols tile in UTM 37S.
    pub const UTM_37S_100X200: TileSpec = TileSpec {
        rows: 100,
        cols: 200,
        transform: [500_000.0, 10.0, 0.0, 9_000_000.0, 0.0, -10.0],
    };

    /// Small geographic tile in degrees.
    pub const WGS84_SMALL: TileSpec = TileSpec {
        rows: 20,
        cols: 40,
        transform: [36.0, 0.025, 0.0, -3.0, 0.0, -0.025],
    };
}

/// Input file names as the classifier writes them.
pub mod names {
    pub const CLASSIFICATION_DAY1: &str = "20230101_classification.tif";
    pub const CLASSIFICATION_DAY2: &str = "20230102_classification.tif";
    pub const RGB_DAY1: &str = "20230101_rgb_classification.tif";
    pub const STACKED: &str = "20230101-20230102_classification.tif";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_spec_size_and_extent() {
        assert_eq!(tiles::UTM_37S_100X200.size(), 20_000);
        assert_eq!(
            tiles::UTM_37S_100X200.extent(),
            (500_000.0, 8_999_000.0, 502_000.0, 9_000_000.0)
        );
    }

    #[test]
    fn test_wkt_fixtures_name_their_zone() {
        assert!(UTM_37S_WKT1.contains("UTM zone 37S"));
        assert!(UTM_37S_WKT2.contains("ID[\"EPSG\",32737]"));
        assert!(UTM_33N_WKT1.contains("32633"));
    }
}
