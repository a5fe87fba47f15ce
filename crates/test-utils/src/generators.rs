//! Test data generators for synthetic classification rasters.
//!
//! Grids are row-major `u8` buffers; the GeoTIFF writers put them on disk
//! with a geotransform and WKT so the reader and stacker can be exercised
//! without shipping binary fixtures.

use std::path::{Path, PathBuf};

use gdal::raster::Buffer;
use gdal::DriverManager;
use tempfile::TempDir;

use crate::fixtures::tiles::TileSpec;

/// Creates a classification grid cycling through classes `1..=classes`.
///
/// Each cell value is `(row + col) % classes + 1`, so no cell is background.
///
/// # Example
///
/// ```
/// use test_utils::create_classification_grid;
///
/// let grid = create_classification_grid(2, 3, 4);
/// assert_eq!(grid, vec![1, 2, 3, 2, 3, 4]);
/// ```
pub fn create_classification_grid(rows: usize, cols: usize, classes: u8) -> Vec<u8> {
    let classes = classes.max(1) as usize;
    let mut data = Vec::with_capacity(rows * cols);
    for row in 0..rows {
        for col in 0..cols {
            data.push(((row + col) % classes + 1) as u8);
        }
    }
    data
}

/// Creates a grid filled with a single value.
pub fn create_constant_grid(rows: usize, cols: usize, value: u8) -> Vec<u8> {
    vec![value; rows * cols]
}

/// Creates a background (0) grid with the given `(row, col, value)` cells set.
///
/// Out-of-range cells are ignored.
pub fn create_sparse_grid(rows: usize, cols: usize, cells: &[(usize, usize, u8)]) -> Vec<u8> {
    let mut data = vec![0u8; rows * cols];
    for &(row, col, value) in cells {
        if row < rows && col < cols {
            data[row * cols + col] = value;
        }
    }
    data
}

/// Writes a multi-band uint8 GeoTIFF, one buffer per band.
pub fn write_geotiff(
    path: &Path,
    tile: &TileSpec,
    wkt: &str,
    bands: &[Vec<u8>],
) -> gdal::errors::Result<()> {
    let driver = DriverManager::get_driver_by_name("GTiff")?;
    let mut dataset = driver.create_with_band_type::<u8, _>(
        path,
        tile.cols as isize,
        tile.rows as isize,
        bands.len() as isize,
    )?;

    dataset.set_geo_transform(&tile.transform)?;
    if !wkt.is_empty() {
        dataset.set_projection(wkt)?;
    }

    for (index, data) in bands.iter().enumerate() {
        let mut band = dataset.rasterband(index as isize + 1)?;
        let buffer = Buffer::new((tile.cols, tile.rows), data.clone());
        band.write((0, 0), (tile.cols, tile.rows), &buffer)?;
    }

    Ok(())
}

/// Writes a single-band tile named `name` into `dir` and returns its path.
///
/// Panics on failure; intended for test setup only.
pub fn write_classification_tile(
    dir: &Path,
    name: &str,
    tile: &TileSpec,
    wkt: &str,
    data: Vec<u8>,
) -> PathBuf {
    let path = dir.join(name);
    write_geotiff(&path, tile, wkt, &[data])
        .unwrap_or_else(|e| panic!("failed to write test tile {}: {}", path.display(), e));
    path
}

/// Creates a fresh scratch directory removed on drop.
pub fn scratch_dir() -> TempDir {
    tempfile::tempdir().expect("failed to create scratch directory")
}
