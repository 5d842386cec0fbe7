//! Re-warping rasters of one scene onto a shared reference pixel grid.
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::core::crs::{self, CoordinateTransform};
use crate::core::geometry::Extent;
use crate::core::processing::warp::{WarpGrid, transformed_extent, warp_nearest};
use crate::core::raster::{GeoTransform, RasterDataset};
use crate::error::{Error, Result};

// Tolerance (in pixels) when snapping extents that already sit on grid lines.
const SNAP_EPSILON: f64 = 1e-6;

/// Projection and geotransform every raster of a scene is aligned to.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceGeometry {
    pub projection: String,
    pub geotransform: GeoTransform,
}

impl ReferenceGeometry {
    pub fn new(projection: impl Into<String>, geotransform: GeoTransform) -> Self {
        Self {
            projection: projection.into(),
            geotransform,
        }
    }

    pub fn from_raster(raster: &RasterDataset) -> Self {
        Self::new(raster.crs.clone(), raster.geotransform)
    }
}

/// Grid at the reference resolution whose cell edges fall on the reference
/// lattice (`origin + k * resolution`) and which covers `extent`.
pub fn aligned_grid(extent: &Extent, reference: &ReferenceGeometry) -> Result<WarpGrid> {
    let gt = &reference.geotransform;
    if gt.0[2] != 0.0 || gt.0[4] != 0.0 {
        return Err(Error::InvalidArgument {
            arg: "reference geotransform",
            value: format!("{:?} (rotated grids cannot be aligned)", gt.0),
        });
    }
    let (x_res, y_res) = gt.pixel_size();
    let (ox, oy) = gt.origin();
    let snap_down = |v: f64, o: f64, r: f64| o + ((v - o) / r + SNAP_EPSILON).floor() * r;
    let snap_up = |v: f64, o: f64, r: f64| o + ((v - o) / r - SNAP_EPSILON).ceil() * r;

    let min_x = snap_down(extent.min_x, ox, x_res);
    let max_x = snap_up(extent.max_x, ox, x_res);
    let min_y = snap_down(extent.min_y, oy, y_res);
    let max_y = snap_up(extent.max_y, oy, y_res);

    let width = ((max_x - min_x) / x_res).round().max(1.0) as usize;
    let height = ((max_y - min_y) / y_res).round().max(1.0) as usize;
    Ok(WarpGrid {
        geotransform: GeoTransform::north_up(min_x, max_y, x_res, y_res),
        width,
        height,
        crs: reference.projection.clone(),
    })
}

/// Align `src` onto the reference grid with explicit transforms
/// (`src_to_ref` into the reference projection, `ref_to_src` back).
pub fn align_with(
    src: &RasterDataset,
    reference: &ReferenceGeometry,
    src_to_ref: &dyn CoordinateTransform,
    ref_to_src: &dyn CoordinateTransform,
    nodata: f64,
) -> Result<RasterDataset> {
    let extent = transformed_extent(src, src_to_ref)?;
    let grid = aligned_grid(&extent, reference)?;
    let (x_res, y_res) = reference.geotransform.pixel_size();
    info!(
        "Aligning {}x{} onto {}x{} reference grid ({} x {})",
        src.width(),
        src.height(),
        grid.width,
        grid.height,
        x_res,
        y_res
    );
    warp_nearest(src, &grid, ref_to_src, None, src.nodata.unwrap_or(nodata))
}

/// Align `src` onto `reference`, reprojecting into the reference projection if needed.
pub fn align_to_reference(
    src: &RasterDataset,
    reference: &ReferenceGeometry,
    nodata: f64,
) -> Result<RasterDataset> {
    let forward = crs::transformer(&src.crs, &reference.projection)?;
    let inverse = crs::transformer(&reference.projection, &src.crs)?;
    align_with(src, reference, forward.as_ref(), inverse.as_ref(), nodata)
}

/// Largest file by byte size. The assumption is that it covers the whole
/// area of interest; it is a heuristic, not a guarantee.
pub fn select_largest(candidates: &[PathBuf]) -> Result<PathBuf> {
    let mut best: Option<(u64, &PathBuf)> = None;
    for path in candidates {
        let size = std::fs::metadata(path)?.len();
        if best.is_none_or(|(s, _)| size > s) {
            best = Some((size, path));
        }
    }
    let (size, path) = best.ok_or_else(|| Error::MissingArgument {
        arg: "reference candidates".to_string(),
    })?;
    info!("Reference raster (largest, {} bytes): {:?}", size, path);
    Ok(path.clone())
}

/// Candidate whose extent overlaps `aoi` the most (all extents in the same CRS).
pub fn select_best_coverage(candidates: &[(PathBuf, Extent)], aoi: &Extent) -> Result<PathBuf> {
    let mut best: Option<(f64, &Path)> = None;
    for (path, extent) in candidates {
        let overlap = extent.intersection_area(aoi);
        if best.is_none_or(|(o, _)| overlap > o) {
            best = Some((overlap, path.as_path()));
        }
    }
    let (overlap, path) = best.ok_or_else(|| Error::MissingArgument {
        arg: "reference candidates".to_string(),
    })?;
    if overlap <= 0.0 {
        warn!("No candidate overlaps the area of interest; using {:?}", path);
    } else {
        info!(
            "Reference raster (best coverage, {:.1}% of AOI): {:?}",
            overlap / (aoi.width() * aoi.height()) * 100.0,
            path
        );
    }
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::crs::IdentityTransform;
    use crate::types::SampleType;
    use ndarray::Array3;

    fn offset_raster() -> RasterDataset {
        RasterDataset::new(
            Array3::from_shape_fn((1, 10, 10), |(_, r, c)| (r * 10 + c) as f64),
            GeoTransform::north_up(3.0, 97.0, 1.0, 1.0),
            "EPSG:25832",
            Some(-9999.0),
            SampleType::Float32,
        )
    }

    fn reference() -> ReferenceGeometry {
        ReferenceGeometry::new("EPSG:25832", GeoTransform::north_up(0.0, 100.0, 2.0, 2.0))
    }

    #[test]
    fn grid_snaps_to_reference_lattice() {
        let grid = aligned_grid(&Extent::new(3.0, 13.0, 87.0, 97.0), &reference()).unwrap();
        assert_eq!(grid.geotransform, GeoTransform([2.0, 2.0, 0.0, 98.0, 0.0, -2.0]));
        assert_eq!((grid.width, grid.height), (6, 6));
    }

    #[test]
    fn already_aligned_extent_is_unchanged() {
        let grid = aligned_grid(&Extent::new(4.0, 20.0, 80.0, 96.0), &reference()).unwrap();
        assert_eq!(grid.geotransform.origin(), (4.0, 96.0));
        assert_eq!((grid.width, grid.height), (8, 8));
    }

    #[test]
    fn alignment_is_deterministic_and_idempotent() {
        let src = offset_raster();
        let first =
            align_with(&src, &reference(), &IdentityTransform, &IdentityTransform, -9999.0).unwrap();
        let second =
            align_with(&src, &reference(), &IdentityTransform, &IdentityTransform, -9999.0).unwrap();
        assert_eq!(first, second);

        let again =
            align_with(&first, &reference(), &IdentityTransform, &IdentityTransform, -9999.0)
                .unwrap();
        assert_eq!(again, first);
    }

    #[test]
    fn rotated_reference_is_rejected() {
        let rotated = ReferenceGeometry::new("EPSG:25832", GeoTransform([0.0, 1.0, 0.5, 0.0, 0.0, -1.0]));
        assert!(aligned_grid(&Extent::new(0.0, 1.0, 0.0, 1.0), &rotated).is_err());
    }

    #[test]
    fn largest_file_wins() {
        let dir = tempfile::tempdir().unwrap();
        let small = dir.path().join("a.tif");
        let big = dir.path().join("b.tif");
        std::fs::write(&small, vec![0u8; 10]).unwrap();
        std::fs::write(&big, vec![0u8; 100]).unwrap();
        assert_eq!(select_largest(&[small, big.clone()]).unwrap(), big);
        assert!(select_largest(&[]).is_err());
    }

    #[test]
    fn coverage_prefers_overlap_over_size() {
        let aoi = Extent::new(0.0, 10.0, 0.0, 10.0);
        let candidates = vec![
            (PathBuf::from("far.tif"), Extent::new(100.0, 1000.0, 100.0, 1000.0)),
            (PathBuf::from("near.tif"), Extent::new(-5.0, 8.0, -5.0, 8.0)),
        ];
        assert_eq!(
            select_best_coverage(&candidates, &aoi).unwrap(),
            PathBuf::from("near.tif")
        );
    }
}
