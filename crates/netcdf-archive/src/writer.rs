//! CF-attributed NetCDF-4 archive writer.

use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};
use landcover_common::{
    format_date_token, AxisSample, CornerSet, GeoTransform, RasterGrid, TemporalCoordinate,
    TIME_CALENDAR, TIME_UNITS,
};
use netcdf::AttributeValue;
use projection::{CrsKind, SpatialReferenceDescriptor};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::crs::{CrsDescriptor, CrsValue};
use crate::error::{ArchiveError, ArchiveResult};
use crate::metadata::{
    clamp_slice, ArchiveMetadata, ClassRange, WriterOptions, CONVENTIONS,
    ISO19115_TOPIC_CATEGORIES, STANDARD_NAME_VOCABULARY,
};
use crate::native::silence_hdf5_errors;

/// Everything needed to persist one archive.
#[derive(Debug, Clone)]
pub struct ArchiveRequest<'a> {
    pub grid: &'a RasterGrid,
    pub corners: CornerSet,
    /// Native `(x over cols, y over rows)` samples.
    pub native_axes: (AxisSample, AxisSample),
    /// Geographic `(lon over cols, lat over rows)` samples.
    pub geographic_axes: (AxisSample, AxisSample),
    pub spatial_ref: &'a SpatialReferenceDescriptor,
    /// Central meridian used for reprojection, if projected.
    pub central_meridian: Option<f64>,
    /// One coordinate per band for a stacked archive; `None` writes a single
    /// slice dated from the grid's file name.
    pub temporal_coordinates: Option<Vec<TemporalCoordinate>>,
}

/// Output path of the archive for an input raster:
/// `out_dir/{file name up to the first '.'}.nc`.
pub fn archive_path_for(input: &Path, out_dir: &Path) -> PathBuf {
    let name = input
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let stem = name.split('.').next().unwrap_or(name);
    out_dir.join(format!("{}.nc", stem))
}

fn partial_path_for(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("archive.nc");
    target.with_file_name(format!(".{}.partial", name))
}

/// Writes archives into one output directory.
#[derive(Debug, Clone)]
pub struct ArchiveWriter {
    output_dir: PathBuf,
    metadata: ArchiveMetadata,
    options: WriterOptions,
}

impl ArchiveWriter {
    pub fn new(output_dir: impl Into<PathBuf>, metadata: ArchiveMetadata, options: WriterOptions) -> Self {
        Self {
            output_dir: output_dir.into(),
            metadata,
            options,
        }
    }

    /// Validate, write to a hidden partial file, then rename into place.
    ///
    /// A failed write removes the partial file; nothing is ever left under the
    /// final name unless the archive was written completely.
    #[instrument(skip(self, request), fields(source = %request.grid.source().display()))]
    pub fn write(&self, request: &ArchiveRequest<'_>) -> ArchiveResult<PathBuf> {
        silence_hdf5_errors();

        let coordinates = self.time_axis(request)?;
        let (start, end) = coverage(&coordinates)?;

        let target = archive_path_for(request.grid.source(), &self.output_dir);
        let partial = partial_path_for(&target);
        if partial.exists() {
            warn!(path = %partial.display(), "Removing stale partial archive");
            std::fs::remove_file(&partial)?;
        }

        let layout = Layout {
            coordinates: &coordinates,
            start,
            end,
        };
        let written = self.write_file(&partial, request, &layout);
        commit(&partial, &target, written)?;

        info!(
            path = %target.display(),
            slices = coordinates.len(),
            rows = request.grid.rows(),
            cols = request.grid.cols(),
            start = %format_date_token(start),
            end = %format_date_token(end),
            "Wrote archive"
        );
        Ok(target)
    }

    /// Time coordinates after checking every axis against the grid.
    fn time_axis(&self, request: &ArchiveRequest<'_>) -> ArchiveResult<Vec<TemporalCoordinate>> {
        let grid = request.grid;
        let (x, y) = &request.native_axes;
        let (lon, lat) = &request.geographic_axes;

        for (name, len, expected) in [
            ("x0", x.len(), grid.cols()),
            ("y0", y.len(), grid.rows()),
            ("lon", lon.len(), grid.cols()),
            ("lat", lat.len(), grid.rows()),
        ] {
            if len != expected {
                return Err(ArchiveError::DimensionMismatch(format!(
                    "{} axis has {} samples, grid dimension is {}",
                    name, len, expected
                )));
            }
        }

        match &request.temporal_coordinates {
            Some(coords) => {
                if coords.is_empty() || coords.len() != grid.bands() {
                    return Err(ArchiveError::DimensionMismatch(format!(
                        "{} temporal coordinates for {} bands",
                        coords.len(),
                        grid.bands()
                    )));
                }
                Ok(coords.clone())
            }
            None => Ok(vec![TemporalCoordinate::from_path(grid.source())?]),
        }
    }

    fn write_file(
        &self,
        path: &Path,
        request: &ArchiveRequest<'_>,
        layout: &Layout<'_>,
    ) -> ArchiveResult<()> {
        let nc = |source: netcdf::Error| ArchiveError::NetCdf {
            path: path.to_path_buf(),
            source,
        };
        let grid = request.grid;
        let slices = layout.coordinates.len();

        let mut file = netcdf::create(path).map_err(nc)?;

        for (name, value) in self.global_attributes(slices, layout) {
            file.add_attribute(name, value.as_str()).map_err(nc)?;
        }

        file.add_dimension("time", slices).map_err(nc)?;
        file.add_dimension("y0", grid.rows()).map_err(nc)?;
        file.add_dimension("x0", grid.cols()).map_err(nc)?;

        let srd = request.spatial_ref;
        let (native_units_x, native_units_y, datum) = match srd.kind() {
            CrsKind::Projected if srd.utm_zone().is_some() => {
                ("m", "m", "cartesian coordinates, UTM projection".to_string())
            }
            CrsKind::Projected => ("m", "m", format!("cartesian coordinates, {}", srd.name())),
            CrsKind::Geographic => (
                "degree_east",
                "degree_north",
                format!("geographic coordinates, {}", srd.name()),
            ),
        };
        let row_order = row_order_comment(grid.transform());

        let (native_x, native_y) = &request.native_axes;
        {
            let mut x = file.add_variable::<f64>("x0", &["x0"]).map_err(nc)?;
            x.put_values(native_x.values(), ..).map_err(nc)?;
            x.put_attribute("long_name", "x coordinate of projection").map_err(nc)?;
            x.put_attribute("standard_name", "projection_x_coordinate").map_err(nc)?;
            x.put_attribute("units", native_units_x).map_err(nc)?;
            x.put_attribute("axis", "X").map_err(nc)?;
            x.put_attribute("reference_datum", datum.as_str()).map_err(nc)?;
        }
        {
            let mut y = file.add_variable::<f64>("y0", &["y0"]).map_err(nc)?;
            y.put_values(native_y.values(), ..).map_err(nc)?;
            y.put_attribute("long_name", "y coordinate of projection").map_err(nc)?;
            y.put_attribute("standard_name", "projection_y_coordinate").map_err(nc)?;
            y.put_attribute("units", native_units_y).map_err(nc)?;
            y.put_attribute("axis", "Y").map_err(nc)?;
            y.put_attribute("reference_datum", datum.as_str()).map_err(nc)?;
            if let Some(comment) = row_order {
                y.put_attribute("comment", comment).map_err(nc)?;
            }
        }

        {
            let hours: Vec<f64> = layout.coordinates.iter().map(|c| c.hours()).collect();
            let mut time = file.add_variable::<f64>("time", &["time"]).map_err(nc)?;
            time.put_values(hours.as_slice(), ..).map_err(nc)?;
            time.put_attribute("units", TIME_UNITS).map_err(nc)?;
            time.put_attribute("calendar", TIME_CALENDAR).map_err(nc)?;
            time.put_attribute("axis", "T").map_err(nc)?;
            time.put_attribute("standard_name", "time").map_err(nc)?;
        }

        let (lons, lats) = &request.geographic_axes;
        {
            let mut lon = file.add_variable::<f64>("lon", &["x0"]).map_err(nc)?;
            lon.put_values(lons.values(), ..).map_err(nc)?;
            lon.put_attribute("long_name", "longitude").map_err(nc)?;
            lon.put_attribute("standard_name", "longitude").map_err(nc)?;
            lon.put_attribute("units", "degree_east").map_err(nc)?;
        }
        {
            let mut lat = file.add_variable::<f64>("lat", &["y0"]).map_err(nc)?;
            lat.put_values(lats.values(), ..).map_err(nc)?;
            lat.put_attribute("long_name", "latitude").map_err(nc)?;
            lat.put_attribute("standard_name", "latitude").map_err(nc)?;
            lat.put_attribute("units", "degree_north").map_err(nc)?;
            if let Some(comment) = row_order {
                lat.put_attribute("comment", comment).map_err(nc)?;
            }
        }

        {
            let descriptor =
                CrsDescriptor::new(request.spatial_ref, request.central_meridian, grid.transform());
            let mut crs = file.add_variable::<i32>("crs", &[]).map_err(nc)?;
            for (name, value) in descriptor.attributes() {
                crs.put_attribute(name, attribute_value(value)).map_err(nc)?;
            }
        }

        {
            let mut data = file
                .add_variable::<u8>("data", &["time", "y0", "x0"])
                .map_err(nc)?;
            if self.options.deflate_level > 0 {
                data.set_compression(self.options.deflate_level, false)
                    .map_err(nc)?;
            }
            data.set_fill_value(self.options.background).map_err(nc)?;
            data.put_attribute("long_name", self.metadata.description.as_str())
                .map_err(nc)?;
            data.put_attribute("units", "None").map_err(nc)?;
            data.put_attribute("level_desc", self.metadata.level_description.as_str())
                .map_err(nc)?;
            data.put_attribute("var_desc", self.metadata.variable_description.as_str())
                .map_err(nc)?;
            data.put_attribute("grid_mapping", "crs").map_err(nc)?;

            for t in 0..slices {
                let band = grid.band(t)?;
                let slice = clamp_slice(band, self.options.background, self.options.class_range);
                if let Some(range) = ClassRange::observed(&slice, self.options.background) {
                    debug!(slice = t, min = range.min, max = range.max, "Slice value range");
                }
                data.put_values(slice.as_slice(), (t, .., ..)).map_err(nc)?;
            }
        }

        // Dropping the file swallows nc_close errors; HDF5 flushes chunks here.
        file.close().map_err(nc)
    }

    fn global_attributes(&self, slices: usize, layout: &Layout<'_>) -> Vec<(&'static str, String)> {
        let now = Utc::now();
        let meta = &self.metadata;
        let duration = if slices > 1 {
            format!("{} days", slices)
        } else {
            "1 day".to_string()
        };

        vec![
            ("title", meta.title()),
            ("summary", meta.summary.clone()),
            ("description", meta.description.clone()),
            ("history", format!("Created {}", now.format("%a %b %e %H:%M:%S %Y"))),
            ("date_created", now.to_rfc3339()),
            ("time_coverage_start", format_date_token(layout.start)),
            ("time_coverage_end", format_date_token(layout.end)),
            ("time_coverage_duration", duration),
            ("source", meta.source.clone()),
            ("product_version", meta.product_version.clone()),
            ("uuid", Uuid::new_v4().to_string()),
            ("Conventions", CONVENTIONS.to_string()),
            ("iso19115_topic_categories", ISO19115_TOPIC_CATEGORIES.to_string()),
            ("standard_name_vocabulary", STANDARD_NAME_VOCABULARY.to_string()),
            ("acknowledgment", meta.acknowledgment.clone()),
            ("creator_name", meta.creator_name.clone()),
            ("creator_email", meta.creator_email.clone()),
            ("creator_url", meta.creator_url.clone()),
        ]
    }
}

/// Move a partial archive onto its final name once `written` succeeded.
///
/// Any failure, including the final close, removes the partial file and
/// leaves `target` untouched.
fn commit(partial: &Path, target: &Path, written: ArchiveResult<()>) -> ArchiveResult<()> {
    if let Err(e) = written {
        let _ = std::fs::remove_file(partial);
        return Err(e);
    }
    std::fs::rename(partial, target).inspect_err(|_| {
        let _ = std::fs::remove_file(partial);
    })?;
    Ok(())
}

/// Note for the `y0`/`lat` axes when they ascend but rows run north to south.
fn row_order_comment(transform: &GeoTransform) -> Option<&'static str> {
    (transform.pixel_height() < 0.0).then_some(
        "Ascending south to north; data rows are stored north to south, row 0 is the northern edge",
    )
}

struct Layout<'a> {
    coordinates: &'a [TemporalCoordinate],
    start: NaiveDate,
    end: NaiveDate,
}

fn coverage(coordinates: &[TemporalCoordinate]) -> ArchiveResult<(NaiveDate, NaiveDate)> {
    let to_date = |c: Option<&TemporalCoordinate>| {
        c.and_then(TemporalCoordinate::to_date).ok_or_else(|| {
            ArchiveError::DimensionMismatch(format!(
                "time coordinate {:?} is not a calendar date",
                c.map(|c| c.hours())
            ))
        })
    };
    Ok((to_date(coordinates.first())?, to_date(coordinates.last())?))
}

fn attribute_value(value: &CrsValue) -> AttributeValue {
    match value {
        CrsValue::Text(s) => AttributeValue::Str(s.clone()),
        CrsValue::Double(v) => AttributeValue::Double(*v),
        CrsValue::Int(v) => AttributeValue::Int(*v),
        CrsValue::Doubles(v) => AttributeValue::Doubles(v.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archive_path_for() {
        let out = Path::new("/out");
        assert_eq!(
            archive_path_for(Path::new("/in/20230101_classification.tif"), out),
            PathBuf::from("/out/20230101_classification.nc")
        );
        assert_eq!(
            archive_path_for(Path::new("20230101_x.aux.tif"), out),
            PathBuf::from("/out/20230101_x.nc")
        );
    }

    #[test]
    fn test_partial_path_is_hidden_sibling() {
        let partial = partial_path_for(Path::new("/out/a.nc"));
        assert_eq!(partial, PathBuf::from("/out/.a.nc.partial"));
    }

    #[test]
    fn test_failed_write_is_never_committed() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("20230101_classification.nc");
        let partial = partial_path_for(&target);
        std::fs::write(&partial, b"half written").unwrap();

        let closed = Err(ArchiveError::DimensionMismatch("close failed".into()));
        assert!(commit(&partial, &target, closed).is_err());
        assert!(!partial.exists());
        assert!(!target.exists());

        std::fs::write(&partial, b"complete").unwrap();
        commit(&partial, &target, Ok(())).unwrap();
        assert!(!partial.exists());
        assert_eq!(std::fs::read(&target).unwrap(), b"complete");
    }

    #[test]
    fn test_row_order_comment_only_for_north_up() {
        let north_up = GeoTransform::north_up(500_000.0, 9_001_000.0, 10.0, 10.0);
        assert!(row_order_comment(&north_up).unwrap().contains("north to south"));

        let south_up = GeoTransform::new([500_000.0, 10.0, 0.0, 9_000_000.0, 0.0, 10.0]);
        assert!(row_order_comment(&south_up).is_none());
    }

    #[test]
    fn test_coverage_spans_first_and_last() {
        let d1 = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2023, 1, 5).unwrap();
        let coords = vec![
            TemporalCoordinate::from_date(d1).unwrap(),
            TemporalCoordinate::from_date(d2).unwrap(),
        ];
        assert_eq!(coverage(&coords).unwrap(), (d1, d2));
        assert!(coverage(&[]).is_err());
    }
}
