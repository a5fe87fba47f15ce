//! GeoTIFF reading and writing through GDAL.

use std::path::Path;

use gdal::raster::Buffer;
use gdal::{Dataset, DriverManager};
use landcover_common::{GeoTransform, RasterGrid};
use tracing::debug;

use crate::error::{IngestionError, Result};

/// Read every band of a raster as `u8`, with its geotransform and WKT.
pub fn read_raster(path: &Path) -> Result<RasterGrid> {
    if !path.is_file() {
        return Err(IngestionError::not_found(path, "no such file"));
    }
    let dataset = Dataset::open(path).map_err(|e| IngestionError::not_found(path, e))?;

    let (cols, rows) = dataset.raster_size();
    let bands = usize::try_from(dataset.raster_count()).unwrap_or(0);
    if bands == 0 || rows == 0 || cols == 0 {
        return Err(IngestionError::unreadable(
            path,
            format!("empty raster ({} bands, {}x{})", bands, rows, cols),
        ));
    }

    let transform = dataset
        .geo_transform()
        .map_err(|e| IngestionError::unreadable(path, format!("no geotransform: {}", e)))?;
    let wkt = dataset.projection();
    if wkt.trim().is_empty() {
        return Err(IngestionError::unreadable(path, "no spatial reference"));
    }

    let mut data = Vec::with_capacity(bands * rows * cols);
    for index in 1..=bands {
        let band = dataset
            .rasterband(index as isize)
            .map_err(|e| IngestionError::unreadable(path, e))?;
        let buffer = band
            .read_as::<u8>((0, 0), (cols, rows), (cols, rows), None)
            .map_err(|e| IngestionError::unreadable(path, e))?;
        data.extend_from_slice(&buffer.data);
    }

    debug!(path = %path.display(), bands, rows, cols, "Read raster");

    RasterGrid::new(
        data,
        (bands, rows, cols),
        GeoTransform::new(transform),
        wkt,
        path,
    )
    .map_err(|e| IngestionError::unreadable(path, e))
}

/// Write a grid as a multi-band `u8` GeoTIFF.
pub fn write_raster(path: &Path, grid: &RasterGrid) -> Result<()> {
    let fail = |e: gdal::errors::GdalError| IngestionError::unreadable(path, e);
    let (bands, rows, cols) = grid.shape();

    let driver = DriverManager::get_driver_by_name("GTiff").map_err(fail)?;
    let mut dataset = driver
        .create_with_band_type::<u8, _>(path, cols as isize, rows as isize, bands as isize)
        .map_err(fail)?;
    dataset
        .set_geo_transform(&grid.transform().coefficients())
        .map_err(fail)?;
    dataset.set_projection(grid.spatial_ref()).map_err(fail)?;

    for index in 0..bands {
        let mut band = dataset.rasterband(index as isize + 1).map_err(fail)?;
        let pixels = grid
            .band(index)
            .map_err(|e| IngestionError::unreadable(path, e))?;
        let buffer = Buffer::new((cols, rows), pixels.to_vec());
        band.write((0, 0), (cols, rows), &buffer).map_err(fail)?;
    }

    // GDALClose writes pending blocks; the dataset's Drop ignores its status.
    drop(dataset);
    verify_written(path, grid)?;

    debug!(path = %path.display(), bands, rows, cols, "Wrote raster");
    Ok(())
}

/// Re-open a freshly written raster and check it holds exactly `grid`.
fn verify_written(path: &Path, grid: &RasterGrid) -> Result<()> {
    let written = read_raster(path)?;
    if written.shape() != grid.shape() || written.data() != grid.data() {
        return Err(IngestionError::unreadable(
            path,
            format!(
                "written raster {:?} does not match the {:?} grid it was built from",
                written.shape(),
                grid.shape()
            ),
        ));
    }
    Ok(())
}
