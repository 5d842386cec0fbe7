//! Cutline clipping onto the fixed working CRS of a run.
use tracing::{debug, info};

use crate::core::crs::{self, CoordinateTransform};
use crate::core::geometry::{Cutline, Extent};
use crate::core::processing::reproject::{default_resolution, reproject_cutline};
use crate::core::processing::warp::{WarpGrid, nodata_fraction, warp_nearest};
use crate::core::raster::RasterDataset;
use crate::error::Result;

/// Bounding box the raster is resampled onto: the cutline extent with
/// `margin` added to max-X and max-Y, leaving slack for tile-grid truncation.
pub fn clip_bounds(cutline: &Cutline, margin: f64) -> Result<Extent> {
    Ok(cutline.extent()?.pad_max(margin))
}

/// Clip `src` to `cutline` (already expressed in `target_crs`).
///
/// The result covers `clip_bounds(cutline, margin)` at `resolution`; cells whose
/// centre is outside the polygons, or outside the source, hold `nodata`.
pub fn clip_to_cutline_with(
    src: &RasterDataset,
    cutline: &Cutline,
    target_crs: &str,
    margin: f64,
    resolution: (f64, f64),
    dst_to_src: &dyn CoordinateTransform,
    nodata: f64,
) -> Result<RasterDataset> {
    let bounds = clip_bounds(cutline, margin)?;
    let grid = WarpGrid::covering(&bounds, resolution.0, resolution.1, target_crs)?;
    debug!(
        "Clip bounds ({}, {}, {}, {}) -> {}x{} px",
        bounds.min_x, bounds.max_x, bounds.min_y, bounds.max_y, grid.width, grid.height
    );
    let out = warp_nearest(src, &grid, dst_to_src, Some(cutline), nodata)?;
    info!(
        "Clipped to {}x{} px in {} ({:.1}% nodata)",
        out.width(),
        out.height(),
        crs::label(target_crs),
        nodata_fraction(&out) * 100.0
    );
    Ok(out)
}

/// Clip `src` to `cutline` in `target_crs`, reprojecting whatever is needed.
///
/// Source pixel size is kept when the source already is in `target_crs`;
/// otherwise a square pixel preserving the diagonal pixel count is used.
pub fn clip_to_cutline(
    src: &RasterDataset,
    cutline: &Cutline,
    target_crs: &str,
    margin: f64,
    nodata: f64,
) -> Result<RasterDataset> {
    crs::validate_crs(target_crs)?;
    let cutline = if crs::same_crs(&cutline.crs, target_crs)? {
        cutline.clone()
    } else {
        reproject_cutline(cutline, target_crs)?
    };
    let forward = crs::transformer(&src.crs, target_crs)?;
    let resolution = default_resolution(src, target_crs, forward.as_ref())?;
    let inverse = crs::transformer(target_crs, &src.crs)?;
    clip_to_cutline_with(
        src,
        &cutline,
        target_crs,
        margin,
        resolution,
        inverse.as_ref(),
        nodata,
    )
}
