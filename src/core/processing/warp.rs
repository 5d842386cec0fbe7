//! Nearest-neighbour warp onto a destination grid.
//!
//! Each destination pixel centre is moved into the source CRS and takes the
//! value of the source pixel it lands in. Nothing is interpolated, so radar
//! backscatter values survive unchanged.
use ndarray::{Array3, Axis};
use tracing::debug;

use crate::core::crs::CoordinateTransform;
use crate::core::geometry::{Cutline, Extent};
use crate::core::raster::{GeoTransform, RasterDataset};
use crate::error::{Error, Result};

/// Upper bound on `width * height` of a destination grid.
pub const MAX_GRID_CELLS: f64 = 1.0e9;

/// Destination pixel grid of a warp.
#[derive(Debug, Clone, PartialEq)]
pub struct WarpGrid {
    pub geotransform: GeoTransform,
    pub width: usize,
    pub height: usize,
    pub crs: String,
}

impl WarpGrid {
    /// Grid covering `extent` at `(x_res, y_res)`, anchored at `(min_x, max_y)`.
    /// Pixel counts are rounded to the nearest integer, at least one. Grids
    /// above [`MAX_GRID_CELLS`] are rejected before anything is allocated.
    pub fn covering(extent: &Extent, x_res: f64, y_res: f64, crs: &str) -> Result<Self> {
        let (x_res, y_res) = (x_res.abs(), y_res.abs());
        if !(x_res > 0.0 && y_res > 0.0 && x_res.is_finite() && y_res.is_finite()) {
            return Err(Error::InvalidArgument {
                arg: "resolution",
                value: format!("{}x{}", x_res, y_res),
            });
        }
        if extent.is_degenerate() {
            return Err(Error::Geometry(format!("cannot build a grid over {:?}", extent)));
        }
        let width = ((extent.width() / x_res) + 0.5).floor().max(1.0);
        let height = ((extent.height() / y_res) + 0.5).floor().max(1.0);
        if width * height > MAX_GRID_CELLS {
            return Err(Error::InvalidArgument {
                arg: "resolution",
                value: format!(
                    "{}x{} gives a {}x{} px grid over {:?}",
                    x_res, y_res, width, height, extent
                ),
            });
        }
        let (width, height) = (width as usize, height as usize);
        Ok(Self {
            geotransform: GeoTransform::north_up(extent.min_x, extent.max_y, x_res, y_res),
            width,
            height,
            crs: crs.to_string(),
        })
    }
}

/// Extent of `src` once moved through `transform`, sampled along its edges.
pub fn transformed_extent(
    src: &RasterDataset,
    transform: &dyn CoordinateTransform,
) -> Result<Extent> {
    const STEPS: usize = 20;
    let (w, h) = (src.width() as f64, src.height() as f64);
    let mut xs = Vec::with_capacity(4 * (STEPS + 1));
    let mut ys = Vec::with_capacity(4 * (STEPS + 1));
    for i in 0..=STEPS {
        let t = i as f64 / STEPS as f64;
        for (col, row) in [(t * w, 0.0), (t * w, h), (0.0, t * h), (w, t * h)] {
            let (x, y) = src.geotransform.pixel_to_geo(col, row);
            xs.push(x);
            ys.push(y);
        }
    }
    transform.transform(&mut xs, &mut ys)?;
    Extent::from_points(xs.into_iter().zip(ys)).ok_or_else(|| {
        Error::Geometry("source extent could not be transformed into the target CRS".to_string())
    })
}

/// Square pixel size that keeps roughly the source pixel count along the
/// diagonal once the raster is moved into the target CRS.
pub fn suggested_resolution(
    src: &RasterDataset,
    transform: &dyn CoordinateTransform,
) -> Result<f64> {
    let extent = transformed_extent(src, transform)?;
    let diag_map = extent.width().hypot(extent.height());
    let diag_px = (src.width() as f64).hypot(src.height() as f64);
    let res = diag_map / diag_px;
    if !(res > 0.0 && res.is_finite()) {
        return Err(Error::Geometry(format!(
            "cannot derive a resolution from transformed extent {:?}",
            extent
        )));
    }
    Ok(res)
}

/// Resample `src` onto `grid`.
///
/// `dst_to_src` moves destination coordinates into the source CRS. Cells
/// falling outside the source, on source nodata, or (when `cutline` is given,
/// in the destination CRS) outside the polygons are set to `nodata`.
pub fn warp_nearest(
    src: &RasterDataset,
    grid: &WarpGrid,
    dst_to_src: &dyn CoordinateTransform,
    cutline: Option<&Cutline>,
    nodata: f64,
) -> Result<RasterDataset> {
    let bands = src.band_count();
    let (src_w, src_h) = (src.width() as i64, src.height() as i64);
    let mut out = Array3::<f64>::from_elem((bands, grid.height, grid.width), nodata);

    debug!(
        "Warping {}x{} -> {}x{} ({} band(s))",
        src_w, src_h, grid.width, grid.height, bands
    );

    let mut xs = vec![0.0; grid.width];
    let mut ys = vec![0.0; grid.width];
    let mut inside = vec![true; grid.width];
    for row in 0..grid.height {
        for col in 0..grid.width {
            let (x, y) = grid
                .geotransform
                .pixel_to_geo(col as f64 + 0.5, row as f64 + 0.5);
            xs[col] = x;
            ys[col] = y;
            inside[col] = cutline.is_none_or(|c| c.contains(x, y));
        }
        dst_to_src.transform(&mut xs, &mut ys)?;

        for col in 0..grid.width {
            if !inside[col] || !xs[col].is_finite() || !ys[col].is_finite() {
                continue;
            }
            let (sc, sr) = src.geotransform.geo_to_pixel(xs[col], ys[col])?;
            let (sc, sr) = (sc.floor() as i64, sr.floor() as i64);
            if sc < 0 || sr < 0 || sc >= src_w || sr >= src_h {
                continue;
            }
            for band in 0..bands {
                let v = src.data[[band, sr as usize, sc as usize]];
                if !src.is_nodata(v) {
                    out[[band, row, col]] = v;
                }
            }
        }
    }

    Ok(RasterDataset::new(
        out,
        grid.geotransform,
        grid.crs.clone(),
        Some(nodata),
        src.sample_type,
    ))
}

/// Share of first-band cells holding nodata; used in stage logs.
pub fn nodata_fraction(raster: &RasterDataset) -> f64 {
    if raster.band_count() == 0 || raster.data.is_empty() {
        return 0.0;
    }
    let band = raster.data.index_axis(Axis(0), 0);
    let empty = band.iter().filter(|v| raster.is_nodata(**v)).count();
    empty as f64 / band.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::crs::IdentityTransform;
    use crate::types::SampleType;
    use geo::{MultiPolygon, polygon};
    use ndarray::Array3;

    /// Adds a constant offset, standing in for a CRS change.
    struct Shift(f64, f64);

    impl CoordinateTransform for Shift {
        fn transform(&self, xs: &mut [f64], ys: &mut [f64]) -> Result<()> {
            xs.iter_mut().for_each(|x| *x += self.0);
            ys.iter_mut().for_each(|y| *y += self.1);
            Ok(())
        }
    }

    fn ramp(width: usize, height: usize) -> RasterDataset {
        let data = Array3::from_shape_fn((1, height, width), |(_, r, c)| (r * width + c) as f64);
        RasterDataset::new(
            data,
            GeoTransform::north_up(0.0, height as f64, 1.0, 1.0),
            "EPSG:25832",
            Some(-9999.0),
            SampleType::Float32,
        )
    }

    #[test]
    fn identity_warp_onto_own_grid_is_a_copy() {
        let src = ramp(8, 6);
        let grid = WarpGrid {
            geotransform: src.geotransform,
            width: 8,
            height: 6,
            crs: src.crs.clone(),
        };
        let out = warp_nearest(&src, &grid, &IdentityTransform, None, -9999.0).unwrap();
        assert_eq!(out.data, src.data);
    }

    #[test]
    fn outside_source_becomes_nodata() {
        let src = ramp(4, 4);
        let grid = WarpGrid::covering(&Extent::new(2.0, 6.0, 0.0, 4.0), 1.0, 1.0, "EPSG:25832")
            .unwrap();
        let out = warp_nearest(&src, &grid, &IdentityTransform, None, -9999.0).unwrap();
        assert_eq!(out.data[[0, 0, 0]], 2.0);
        assert_eq!(out.data[[0, 0, 1]], 3.0);
        assert_eq!(out.data[[0, 0, 2]], -9999.0);
        assert_eq!(out.data[[0, 3, 3]], -9999.0);
    }

    #[test]
    fn shifted_transform_moves_samples() {
        let src = ramp(4, 4);
        let grid = WarpGrid {
            geotransform: src.geotransform,
            width: 4,
            height: 4,
            crs: "EPSG:25832".into(),
        };
        let out = warp_nearest(&src, &grid, &Shift(1.0, 0.0), None, -9999.0).unwrap();
        assert_eq!(out.data[[0, 0, 0]], 1.0);
        assert_eq!(out.data[[0, 0, 3]], -9999.0);
    }

    #[test]
    fn cutline_masks_outside_cells() {
        let src = ramp(4, 4);
        let tri = polygon![(x: 0.0, y: 0.0), (x: 4.0, y: 0.0), (x: 0.0, y: 4.0), (x: 0.0, y: 0.0)];
        let cutline = Cutline::new("EPSG:25832", MultiPolygon(vec![tri]));
        let grid = WarpGrid {
            geotransform: src.geotransform,
            width: 4,
            height: 4,
            crs: "EPSG:25832".into(),
        };
        let out = warp_nearest(&src, &grid, &IdentityTransform, Some(&cutline), -9999.0).unwrap();
        // bottom-left is inside the triangle, top-right is not
        assert_eq!(out.data[[0, 3, 0]], 12.0);
        assert_eq!(out.data[[0, 0, 3]], -9999.0);
    }

    #[test]
    fn source_nodata_is_carried() {
        let mut src = ramp(2, 2);
        src.data[[0, 0, 0]] = -9999.0;
        let grid = WarpGrid {
            geotransform: src.geotransform,
            width: 2,
            height: 2,
            crs: "EPSG:25832".into(),
        };
        let out = warp_nearest(&src, &grid, &IdentityTransform, None, -1.0).unwrap();
        assert_eq!(out.data[[0, 0, 0]], -1.0);
        assert_eq!(out.nodata, Some(-1.0));
    }

    #[test]
    fn grid_rounds_pixel_counts() {
        let grid =
            WarpGrid::covering(&Extent::new(0.0, 25.4, 0.0, 10.6), 10.0, 10.0, "EPSG:1").unwrap();
        assert_eq!((grid.width, grid.height), (3, 1));
        assert!(WarpGrid::covering(&Extent::new(0.0, 1.0, 0.0, 1.0), 0.0, 1.0, "EPSG:1").is_err());
    }

    #[test]
    fn grid_over_the_cell_limit_is_rejected() {
        let extent = Extent::new(0.0, 100_000.0, 0.0, 100_000.0);
        let err = WarpGrid::covering(&extent, 1.0, 1.0, "EPSG:1").unwrap_err();
        assert_eq!(err.kind(), "ArgumentError");
        let grid = WarpGrid::covering(&extent, 10.0, 10.0, "EPSG:1").unwrap();
        assert_eq!((grid.width, grid.height), (10_000, 10_000));
    }

    #[test]
    fn suggested_resolution_matches_source_when_untransformed() {
        let src = ramp(30, 40);
        let res = suggested_resolution(&src, &IdentityTransform).unwrap();
        approx::assert_abs_diff_eq!(res, 1.0, epsilon = 1e-9);
    }
}
