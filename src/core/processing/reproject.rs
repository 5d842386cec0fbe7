//! CRS reprojection of rasters and cutlines.
use tracing::info;

use crate::core::crs::{self, CoordinateTransform};
use crate::core::geometry::Cutline;
use crate::core::processing::warp::{
    WarpGrid, suggested_resolution, transformed_extent, warp_nearest,
};
use crate::core::raster::RasterDataset;
use crate::error::Result;

/// Output pixel size when none is requested.
///
/// Within one CRS this is the source pixel size. Across CRSs the source pixel
/// count along the diagonal is kept, so a degree-based grid does not turn into
/// a metre-based grid with the same numeric resolution.
pub fn default_resolution(
    src: &RasterDataset,
    target_crs: &str,
    src_to_dst: &dyn CoordinateTransform,
) -> Result<(f64, f64)> {
    if crs::same_crs(&src.crs, target_crs)? {
        return Ok(src.geotransform.pixel_size());
    }
    let res = suggested_resolution(src, src_to_dst)?;
    Ok((res, res))
}

/// Reproject `src` into `target_crs` with explicit transforms.
///
/// `resolution` defaults to [`default_resolution`] so the sampling density is
/// not changed implicitly. Resampling is nearest-neighbour.
pub fn reproject_with(
    src: &RasterDataset,
    target_crs: &str,
    resolution: Option<(f64, f64)>,
    src_to_dst: &dyn CoordinateTransform,
    dst_to_src: &dyn CoordinateTransform,
    nodata: f64,
) -> Result<RasterDataset> {
    let (x_res, y_res) = match resolution {
        Some(res) => res,
        None => default_resolution(src, target_crs, src_to_dst)?,
    };
    let extent = transformed_extent(src, src_to_dst)?;
    let grid = WarpGrid::covering(&extent, x_res, y_res, target_crs)?;
    info!(
        "Reprojecting {} -> {} at {}x{} ({}x{} px)",
        crs::label(&src.crs),
        crs::label(target_crs),
        x_res,
        y_res,
        grid.width,
        grid.height
    );
    warp_nearest(src, &grid, dst_to_src, None, src.nodata.unwrap_or(nodata))
}

/// Reproject `src` into `target_crs` using GDAL/PROJ transforms.
pub fn reproject(
    src: &RasterDataset,
    target_crs: &str,
    resolution: Option<(f64, f64)>,
    nodata: f64,
) -> Result<RasterDataset> {
    crs::validate_crs(target_crs)?;
    crs::validate_crs(&src.crs)?;
    let forward = crs::transformer(&src.crs, target_crs)?;
    let inverse = crs::transformer(target_crs, &src.crs)?;
    reproject_with(
        src,
        target_crs,
        resolution,
        forward.as_ref(),
        inverse.as_ref(),
        nodata,
    )
}

/// Reproject every vertex of `cutline` into `target_crs`.
pub fn reproject_cutline(cutline: &Cutline, target_crs: &str) -> Result<Cutline> {
    let forward = crs::transformer(&cutline.crs, target_crs)?;
    cutline.reprojected(target_crs, forward.as_ref())
}
