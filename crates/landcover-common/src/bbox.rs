//! Corner sets (native bounding boxes) derived from raster geotransforms.

use serde::{Deserialize, Serialize};

use crate::grid::AxisSample;

/// The four-corner extent of a raster in its native projected units.
///
/// Always satisfies `min_x <= max_x` and `min_y <= max_y`; construct through
/// [`CornerSet::from_points`] or [`crate::GeoTransform::corners`] so the
/// ordering holds regardless of the raster's axis direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CornerSet {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl CornerSet {
    /// Build the tightest corner set containing every given point.
    ///
    /// Returns `None` for an empty iterator.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let mut iter = points.into_iter();
        let (x0, y0) = iter.next()?;
        let init = Self {
            min_x: x0,
            min_y: y0,
            max_x: x0,
            max_y: y0,
        };

        Some(iter.fold(init, |acc, (x, y)| Self {
            min_x: acc.min_x.min(x),
            min_y: acc.min_y.min(y),
            max_x: acc.max_x.max(x),
            max_y: acc.max_y.max(y),
        }))
    }

    /// Centre point of the extent.
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Evenly spaced native axis samples: `(x over cols, y over rows)`.
    pub fn native_axes(&self, rows: usize, cols: usize) -> (AxisSample, AxisSample) {
        (
            AxisSample::linspace(self.min_x, self.max_x, cols),
            AxisSample::linspace(self.min_y, self.max_y, rows),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_points_orders_extremes() {
        let corners =
            CornerSet::from_points([(10.0, 5.0), (-2.0, 8.0), (4.0, -1.0)]).unwrap();
        assert_eq!(corners.min_x, -2.0);
        assert_eq!(corners.max_x, 10.0);
        assert_eq!(corners.min_y, -1.0);
        assert_eq!(corners.max_y, 8.0);
    }

    #[test]
    fn test_from_points_empty() {
        assert!(CornerSet::from_points(std::iter::empty()).is_none());
    }

    #[test]
    fn test_native_axes_lengths() {
        let corners = CornerSet::from_points([(0.0, 0.0), (300.0, 200.0)]).unwrap();
        let (xs, ys) = corners.native_axes(20, 30);
        assert_eq!(xs.len(), 30);
        assert_eq!(ys.len(), 20);
        assert_eq!(xs.first(), Some(0.0));
        assert_eq!(xs.last(), Some(300.0));
        assert_eq!(corners.center(), (150.0, 100.0));
    }
}
