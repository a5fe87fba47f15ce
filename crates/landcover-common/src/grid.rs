//! Raster grid model and the geotransform-based geometry calculator.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::bbox::CornerSet;
use crate::error::{GridError, GridResult};

/// Affine mapping from pixel (col, row) to projected (x, y).
///
/// Coefficients follow the GDAL ordering:
/// `x = gt0 + col*gt1 + row*gt2`, `y = gt3 + col*gt4 + row*gt5`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform(pub [f64; 6]);

impl GeoTransform {
    pub fn new(coefficients: [f64; 6]) -> Self {
        Self(coefficients)
    }

    /// North-up transform with no rotation terms.
    pub fn north_up(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self([origin_x, pixel_width, 0.0, origin_y, 0.0, -pixel_height.abs()])
    }

    /// Row step in y; negative for north-up rasters.
    pub fn pixel_height(&self) -> f64 {
        self.0[5]
    }

    pub fn coefficients(&self) -> [f64; 6] {
        self.0
    }

    /// Map a (possibly fractional) pixel position to projected coordinates.
    pub fn apply(&self, col: f64, row: f64) -> (f64, f64) {
        let gt = &self.0;
        (
            gt[0] + col * gt[1] + row * gt[2],
            gt[3] + col * gt[4] + row * gt[5],
        )
    }

    /// Corner set of a `rows` x `cols` grid.
    ///
    /// Evaluates all four pixel-space extremes and takes the arithmetic
    /// min/max, so south-up or rotated transforms never produce an inverted
    /// extent.
    pub fn corners(&self, rows: usize, cols: usize) -> CornerSet {
        let (r, c) = (rows as f64, cols as f64);
        let (x0, y0) = self.apply(0.0, 0.0);
        let init = CornerSet {
            min_x: x0,
            min_y: y0,
            max_x: x0,
            max_y: y0,
        };

        [self.apply(c, 0.0), self.apply(0.0, r), self.apply(c, r)]
            .into_iter()
            .fold(init, |acc, (x, y)| CornerSet {
                min_x: acc.min_x.min(x),
                min_y: acc.min_y.min(y),
                max_x: acc.max_x.max(x),
                max_y: acc.max_y.max(y),
            })
    }
}

/// Evenly spaced coordinate values along one spatial axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisSample(Vec<f64>);

impl AxisSample {
    /// `n` samples from `start` to `end` inclusive.
    ///
    /// A single sample yields `[start]`; zero samples yield an empty axis.
    pub fn linspace(start: f64, end: f64, n: usize) -> Self {
        match n {
            0 => Self(Vec::new()),
            1 => Self(vec![start]),
            _ => {
                let step = (end - start) / (n - 1) as f64;
                let mut values: Vec<f64> = (0..n).map(|i| start + i as f64 * step).collect();
                // Pin the last sample to avoid accumulated rounding drift.
                values[n - 1] = end;
                Self(values)
            }
        }
    }

    pub fn from_values(values: Vec<f64>) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first(&self) -> Option<f64> {
        self.0.first().copied()
    }

    pub fn last(&self) -> Option<f64> {
        self.0.last().copied()
    }

    pub fn is_non_decreasing(&self) -> bool {
        self.0.windows(2).all(|w| w[0] <= w[1])
    }
}

/// A band-major uint8 raster: `data[band][row][col]` flattened.
#[derive(Debug, Clone)]
pub struct RasterGrid {
    data: Vec<u8>,
    bands: usize,
    rows: usize,
    cols: usize,
    transform: GeoTransform,
    spatial_ref: String,
    source: PathBuf,
}

impl RasterGrid {
    /// Create a grid, checking that every dimension is non-zero and the
    /// buffer length matches `bands * rows * cols`.
    pub fn new(
        data: Vec<u8>,
        (bands, rows, cols): (usize, usize, usize),
        transform: GeoTransform,
        spatial_ref: impl Into<String>,
        source: impl Into<PathBuf>,
    ) -> GridResult<Self> {
        if bands == 0 || rows == 0 || cols == 0 {
            return Err(GridError::EmptyDimension { bands, rows, cols });
        }

        let expected = bands * rows * cols;
        if data.len() != expected {
            return Err(GridError::ShapeMismatch {
                expected,
                actual: data.len(),
                shape: (bands, rows, cols),
            });
        }

        Ok(Self {
            data,
            bands,
            rows,
            cols,
            transform,
            spatial_ref: spatial_ref.into(),
            source: source.into(),
        })
    }

    pub fn bands(&self) -> usize {
        self.bands
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(bands, rows, cols)`
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.bands, self.rows, self.cols)
    }

    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    /// Spatial reference as well-known text.
    pub fn spatial_ref(&self) -> &str {
        &self.spatial_ref
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Row-major pixels of one band.
    pub fn band(&self, index: usize) -> GridResult<&[u8]> {
        if index >= self.bands {
            return Err(GridError::BandOutOfRange {
                index,
                bands: self.bands,
            });
        }
        let len = self.rows * self.cols;
        Ok(&self.data[index * len..(index + 1) * len])
    }

    /// Pixel value at `(band, row, col)`, if in range.
    pub fn value(&self, band: usize, row: usize, col: usize) -> Option<u8> {
        if band >= self.bands || row >= self.rows || col >= self.cols {
            return None;
        }
        self.data
            .get(band * self.rows * self.cols + row * self.cols + col)
            .copied()
    }

    /// All bands, `(band, row, col)` flattened.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn corners(&self) -> CornerSet {
        self.transform.corners(self.rows, self.cols)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_grid(bands: usize) -> RasterGrid {
        let data = (0..bands * 2 * 3).map(|v| v as u8).collect();
        RasterGrid::new(
            data,
            (bands, 2, 3),
            GeoTransform::north_up(500000.0, 9000000.0, 10.0, 10.0),
            "",
            "20230101_classification.tif",
        )
        .unwrap()
    }

    #[test]
    fn test_north_up_corners() {
        let gt = GeoTransform::north_up(500000.0, 9000000.0, 10.0, 10.0);
        let corners = gt.corners(100, 200);
        assert_eq!(corners.min_x, 500000.0);
        assert_eq!(corners.max_x, 502000.0);
        assert_eq!(corners.max_y, 9000000.0);
        assert_eq!(corners.min_y, 8999000.0);
    }

    #[test]
    fn test_corners_ordered_for_every_sign() {
        for &sx in &[1.0, -1.0] {
            for &sy in &[1.0, -1.0] {
                for &rot in &[0.0, 0.5, -0.5] {
                    let gt = GeoTransform::new([100.0, 30.0 * sx, rot, 200.0, -rot, 30.0 * sy]);
                    let c = gt.corners(17, 23);
                    assert!(c.min_x <= c.max_x, "x inverted for {:?}", gt);
                    assert!(c.min_y <= c.max_y, "y inverted for {:?}", gt);
                }
            }
        }
    }

    #[test]
    fn test_south_up_origin_is_min() {
        let gt = GeoTransform::new([0.0, 1.0, 0.0, 50.0, 0.0, 2.0]);
        let c = gt.corners(10, 10);
        assert_eq!(c.min_y, 50.0);
        assert_eq!(c.max_y, 70.0);
    }

    #[test]
    fn test_linspace_endpoints_and_monotonic() {
        let axis = AxisSample::linspace(-3.5, 12.25, 37);
        assert_eq!(axis.len(), 37);
        assert_eq!(axis.first(), Some(-3.5));
        assert_eq!(axis.last(), Some(12.25));
        assert!(axis.is_non_decreasing());
    }

    #[test]
    fn test_linspace_degenerate() {
        assert!(AxisSample::linspace(1.0, 2.0, 0).is_empty());
        assert_eq!(AxisSample::linspace(1.0, 2.0, 1).values(), &[1.0]);
    }

    #[test]
    fn test_grid_rejects_empty_and_mismatched() {
        let gt = GeoTransform::north_up(0.0, 0.0, 1.0, 1.0);
        assert!(matches!(
            RasterGrid::new(vec![], (0, 1, 1), gt, "", "x.tif"),
            Err(GridError::EmptyDimension { .. })
        ));
        assert!(matches!(
            RasterGrid::new(vec![0; 5], (1, 2, 3), gt, "", "x.tif"),
            Err(GridError::ShapeMismatch { expected: 6, actual: 5, .. })
        ));
    }

    #[test]
    fn test_band_access() {
        let grid = sample_grid(2);
        assert_eq!(grid.band(1).unwrap(), &[6, 7, 8, 9, 10, 11]);
        assert_eq!(grid.value(1, 1, 2), Some(11));
        assert_eq!(grid.value(2, 0, 0), None);
        assert!(matches!(
            grid.band(2),
            Err(GridError::BandOutOfRange { index: 2, bands: 2 })
        ));
    }
}
