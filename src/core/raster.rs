//! In-memory raster model shared by all processing steps.
use ndarray::{Array3, ArrayView2, ArrayViewMut2, Axis};
use serde::{Deserialize, Serialize};

use crate::core::geometry::Extent;
use crate::error::{Error, Result};
use crate::types::SampleType;

/// Affine geotransform coefficients
/// (`[origin_x, pixel_width, rot_x, origin_y, rot_y, pixel_height]`).
/// North-up rasters store a negative `pixel_height`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform(pub [f64; 6]);

impl GeoTransform {
    /// North-up transform with the top-left corner at `(min_x, max_y)`.
    pub fn north_up(min_x: f64, max_y: f64, x_res: f64, y_res: f64) -> Self {
        GeoTransform([min_x, x_res.abs(), 0.0, max_y, 0.0, -y_res.abs()])
    }

    pub fn origin(&self) -> (f64, f64) {
        (self.0[0], self.0[3])
    }

    pub fn x_res(&self) -> f64 {
        self.0[1]
    }

    /// Signed pixel height (negative for north-up rasters).
    pub fn y_res(&self) -> f64 {
        self.0[5]
    }

    /// Positive pixel size `(x, y)`.
    pub fn pixel_size(&self) -> (f64, f64) {
        (self.0[1].abs(), self.0[5].abs())
    }

    pub fn pixel_to_geo(&self, col: f64, row: f64) -> (f64, f64) {
        let g = &self.0;
        (
            g[0] + col * g[1] + row * g[2],
            g[3] + col * g[4] + row * g[5],
        )
    }

    /// Inverse mapping, geographic `(x, y)` to fractional `(col, row)`.
    pub fn geo_to_pixel(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        let g = &self.0;
        let det = g[1] * g[5] - g[2] * g[4];
        if det == 0.0 || !det.is_finite() {
            return Err(Error::InvalidArgument {
                arg: "geotransform",
                value: format!("{:?}", g),
            });
        }
        let dx = x - g[0];
        let dy = y - g[3];
        Ok(((dx * g[5] - dy * g[2]) / det, (dy * g[1] - dx * g[4]) / det))
    }

    /// Transform of a window whose top-left pixel is `(col_off, row_off)` of this grid.
    pub fn window(&self, col_off: usize, row_off: usize) -> Self {
        let (x, y) = self.pixel_to_geo(col_off as f64, row_off as f64);
        let mut gt = self.0;
        gt[0] = x;
        gt[3] = y;
        GeoTransform(gt)
    }

    /// Bounding extent of a `width` x `height` grid.
    pub fn extent(&self, width: usize, height: usize) -> Extent {
        let corners = [
            self.pixel_to_geo(0.0, 0.0),
            self.pixel_to_geo(width as f64, 0.0),
            self.pixel_to_geo(0.0, height as f64),
            self.pixel_to_geo(width as f64, height as f64),
        ];
        Extent::from_points(corners.iter().copied()).unwrap_or(Extent {
            min_x: self.0[0],
            max_x: self.0[0],
            min_y: self.0[3],
            max_y: self.0[3],
        })
    }
}

impl From<[f64; 6]> for GeoTransform {
    fn from(value: [f64; 6]) -> Self {
        GeoTransform(value)
    }
}

/// A multi-band grid plus its georeferencing. Samples are stored as
/// `(band, row, col)`; `nodata` applies uniformly to every band.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterDataset {
    pub data: Array3<f64>,
    pub geotransform: GeoTransform,
    /// CRS definition (WKT or `AUTHORITY:CODE`).
    pub crs: String,
    pub nodata: Option<f64>,
    pub sample_type: SampleType,
}

impl RasterDataset {
    pub fn new(
        data: Array3<f64>,
        geotransform: GeoTransform,
        crs: impl Into<String>,
        nodata: Option<f64>,
        sample_type: SampleType,
    ) -> Self {
        Self {
            data,
            geotransform,
            crs: crs.into(),
            nodata,
            sample_type,
        }
    }

    pub fn band_count(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    pub fn height(&self) -> usize {
        self.data.len_of(Axis(1))
    }

    pub fn width(&self) -> usize {
        self.data.len_of(Axis(2))
    }

    pub fn extent(&self) -> Extent {
        self.geotransform.extent(self.width(), self.height())
    }

    /// Zero-based band view.
    pub fn band(&self, index: usize) -> ArrayView2<'_, f64> {
        self.data.index_axis(Axis(0), index)
    }

    pub fn band_mut(&mut self, index: usize) -> ArrayViewMut2<'_, f64> {
        self.data.index_axis_mut(Axis(0), index)
    }

    /// True when `value` is the nodata sentinel (NaN sentinels compare by NaN-ness).
    pub fn is_nodata(&self, value: f64) -> bool {
        match self.nodata {
            Some(nd) if nd.is_nan() => value.is_nan(),
            Some(nd) => value == nd,
            None => false,
        }
    }
}
