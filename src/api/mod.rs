//! High-level library API: per-file stages that read a raster, transform it and
//! atomically replace it, plus batch helpers running those stages over file
//! lists. Prefer these entrypoints over the low-level processing modules.
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::core::classify::BandClassifier;
use crate::core::crs;
use crate::core::geometry::{Cutline, Extent};
use crate::core::params::PipelineParams;
use crate::core::processing::align::{
    ReferenceGeometry, align_to_reference, select_best_coverage, select_largest,
};
use crate::core::processing::clip::clip_to_cutline;
use crate::core::processing::radiometric::{band_to_db, band_to_linear};
use crate::core::processing::reproject::{reproject, reproject_cutline};
use crate::core::processing::tile::crop_to_tile_grid;
use crate::error::{Error, Result};
use crate::io::gdal::{GdalRasterReader, read_raster};
use crate::io::sorted::{create_sorted_outputs, sort_output};
use crate::io::subdatasets::extract_polarization_bands;
use crate::io::vector::{read_cutline, reprojected_cutline_path, write_cutline_geojson};
use crate::io::writers::write_raster_atomically;
use crate::observer::{PipelineObserver, Stage};
use crate::types::{NonPositivePolicy, RadiometricDirection, ReferenceStrategy};

mod batch;
pub use batch::{BatchFailure, BatchReport, run_batch};

fn is_raster_file(path: &Path) -> bool {
    path.extension()
        .map(|e| {
            let e = e.to_string_lossy();
            e.eq_ignore_ascii_case("tif") || e.eq_ignore_ascii_case("tiff")
        })
        .unwrap_or(false)
}

/// Expand directories into their `*.tif` / `*.tiff` files (sorted); files are
/// kept as given. Nonexistent inputs are an error.
pub fn collect_rasters(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut found = Vec::new();
            for entry in std::fs::read_dir(input)? {
                let path = entry?.path();
                if path.is_file() && is_raster_file(&path) {
                    found.push(path);
                }
            }
            found.sort();
            files.extend(found);
        } else if input.is_file() {
            files.push(input.clone());
        } else {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("input {:?} does not exist", input),
            )));
        }
    }
    Ok(files)
}

/// Reproject `input` to `target_crs`, writing to `output` (or replacing
/// `input` when `output` is `None`).
pub fn reproject_file(
    input: &Path,
    output: Option<&Path>,
    target_crs: &str,
    resolution: Option<(f64, f64)>,
    nodata: f64,
) -> Result<()> {
    let src = read_raster(input)?;
    let out = reproject(&src, target_crs, resolution, nodata)?;
    write_raster_atomically(output.unwrap_or(input), &out)
}

/// Clip `path` to `cutline` (already in the run's target CRS), truncate it to
/// the tile grid and replace it.
pub fn clip_file(path: &Path, cutline: &Cutline, params: &PipelineParams) -> Result<()> {
    let src = read_raster(path)?;
    let clipped = clip_to_cutline(
        &src,
        cutline,
        &params.target_crs,
        params.clip_margin,
        params.nodata_value,
    )?;
    let tiled = crop_to_tile_grid(clipped, params.tile_size)?;
    write_raster_atomically(path, &tiled)
}

/// Projection and geotransform of the raster at `path`, without reading pixels.
pub fn read_reference(path: &Path) -> Result<ReferenceGeometry> {
    let reader = GdalRasterReader::open(path)?;
    crs::validate_crs(&reader.metadata.projection)?;
    Ok(ReferenceGeometry::new(
        reader.metadata.projection.clone(),
        reader.metadata.geotransform,
    ))
}

/// Re-warp `path` onto the reference grid and replace it.
pub fn align_file(path: &Path, reference: &ReferenceGeometry, nodata: f64) -> Result<()> {
    let src = read_raster(path)?;
    let out = align_to_reference(&src, reference, nodata)?;
    write_raster_atomically(path, &out)
}

/// Convert the first band of `path` between dB and linear and replace it.
/// Further bands are carried unchanged. Integer rasters are promoted to Float32.
pub fn convert_file(
    path: &Path,
    direction: RadiometricDirection,
    policy: NonPositivePolicy,
) -> Result<()> {
    let mut raster = read_raster(path)?;
    let nodata = raster.nodata;
    let band = raster.band_mut(0);
    match direction {
        RadiometricDirection::ToLinear => band_to_linear(band, nodata),
        RadiometricDirection::ToDb => band_to_db(band, nodata, policy)?,
    };
    raster.sample_type = raster.sample_type.floating();
    write_raster_atomically(path, &raster)
}

fn extent_in(path: &Path, target_crs: &str) -> Result<Extent> {
    let reader = GdalRasterReader::open(path)?;
    let m = &reader.metadata;
    let extent = m.geotransform.extent(m.size_x, m.size_y);
    let transform = crs::transformer(&m.projection, target_crs)?;
    let mut xs = [extent.min_x, extent.max_x, extent.max_x, extent.min_x];
    let mut ys = [extent.max_y, extent.max_y, extent.min_y, extent.min_y];
    transform.transform(&mut xs, &mut ys)?;
    Extent::from_points(xs.into_iter().zip(ys))
        .ok_or_else(|| Error::Geometry(format!("{:?} has no finite extent", path)))
}

/// Pick the reference raster for a scene according to `params.reference`.
/// `BestCoverage` needs the cutline.
pub fn resolve_reference(
    params: &PipelineParams,
    files: &[PathBuf],
    cutline: Option<&Cutline>,
) -> Result<PathBuf> {
    match &params.reference {
        ReferenceStrategy::LargestFile => select_largest(files),
        ReferenceStrategy::Explicit(path) => {
            info!("Reference raster (explicit): {:?}", path);
            Ok(path.clone())
        }
        ReferenceStrategy::BestCoverage => {
            let cutline = cutline.ok_or_else(|| Error::MissingArgument {
                arg: "cutline (required by best_coverage reference)".to_string(),
            })?;
            let aoi = cutline.extent()?;
            let mut candidates = Vec::with_capacity(files.len());
            for path in files {
                match extent_in(path, &cutline.crs) {
                    Ok(extent) => candidates.push((path.clone(), extent)),
                    Err(e) => warn!("Ignoring {:?} as reference candidate: {}", path, e),
                }
            }
            select_best_coverage(&candidates, &aoi)
        }
    }
}

/// Reproject every file into the target CRS (in place, or into `output_dir`).
pub fn reproject_batch(
    files: &[PathBuf],
    params: &PipelineParams,
    output_dir: Option<&Path>,
    observer: &dyn PipelineObserver,
) -> Result<BatchReport> {
    params.validate()?;
    if let Some(dir) = output_dir {
        std::fs::create_dir_all(dir)?;
    }
    run_batch(Stage::Reproject, files, params.concurrency, observer, |path| {
        let output = output_dir.map(|dir| dir.join(path.file_name().unwrap_or_default()));
        reproject_file(path, output.as_deref(), &params.target_crs, None, params.nodata_value)
    })
}

/// Read the cutline, move it into the target CRS and write it as
/// `new_<stem>.geojson` into the output directory.
pub fn prepare_cutline(cutline_path: &Path, params: &PipelineParams) -> Result<Cutline> {
    let cutline = read_cutline(cutline_path)?;
    let reprojected = if crs::same_crs(&cutline.crs, &params.target_crs)? {
        Cutline::new(params.target_crs.clone(), cutline.into_polygons())
    } else {
        reproject_cutline(&cutline, &params.target_crs)?
    };
    reprojected.extent()?;
    std::fs::create_dir_all(&params.output_directory)?;
    let output = reprojected_cutline_path(cutline_path, &params.output_directory);
    write_cutline_geojson(&output, &reprojected)?;
    Ok(reprojected)
}

/// Clip and tile-crop every file against `cutline` (in the target CRS).
pub fn clip_batch(
    files: &[PathBuf],
    cutline: &Cutline,
    params: &PipelineParams,
    observer: &dyn PipelineObserver,
) -> Result<BatchReport> {
    params.validate()?;
    run_batch(Stage::Clip, files, params.concurrency, observer, |path| {
        clip_file(path, cutline, params)
    })
}

/// Align all files of one scene onto the reference picked by `params.reference`.
pub fn align_batch(
    files: &[PathBuf],
    params: &PipelineParams,
    cutline: Option<&Cutline>,
    observer: &dyn PipelineObserver,
) -> Result<BatchReport> {
    params.validate()?;
    if files.is_empty() {
        return Ok(BatchReport::default());
    }
    let reference_path = resolve_reference(params, files, cutline)?;
    let reference = read_reference(&reference_path)?;
    run_batch(Stage::Align, files, params.concurrency, observer, |path| {
        align_file(path, &reference, params.nodata_value)
    })
}

pub fn radiometric_batch(
    files: &[PathBuf],
    direction: RadiometricDirection,
    params: &PipelineParams,
    observer: &dyn PipelineObserver,
) -> Result<BatchReport> {
    let stage = match direction {
        RadiometricDirection::ToLinear => Stage::ToLinear,
        RadiometricDirection::ToDb => Stage::ToDb,
    };
    run_batch(stage, files, params.concurrency, observer, |path| {
        convert_file(path, direction, params.non_positive_linear)
    })
}

/// Extract whitelisted polarization bands of each product into `output_dir`.
pub fn extract_batch(
    products: &[PathBuf],
    output_dir: &Path,
    params: &PipelineParams,
    observer: &dyn PipelineObserver,
) -> Result<BatchReport> {
    let classifier = BandClassifier::from_params(params);
    run_batch(Stage::Extract, products, params.concurrency, observer, |path| {
        let written = extract_polarization_bands(path, output_dir, &classifier)?;
        if written.is_empty() {
            warn!("No whitelisted polarization found in {:?}", path);
        }
        Ok(())
    })
}

/// Create the sorted tree and copy each file into its bucket.
pub fn sort_batch(
    files: &[PathBuf],
    params: &PipelineParams,
    observer: &dyn PipelineObserver,
) -> Result<BatchReport> {
    let root = params.sorted_root();
    create_sorted_outputs(&root, &params.polarization_whitelist)?;
    run_batch(Stage::Sort, files, params.concurrency, observer, |path| {
        sort_output(path, &params.polarization_whitelist, &root).map(|_| ())
    })
}

/// Reproject, align, clip + tile, then convert to linear. Each stage only
/// sees the files that survived the previous one.
pub fn prepare_scene(
    files: &[PathBuf],
    cutline_path: &Path,
    params: &PipelineParams,
    observer: &dyn PipelineObserver,
) -> Result<BatchReport> {
    params.validate()?;
    let cutline = prepare_cutline(cutline_path, params)?;

    let mut report = reproject_batch(files, params, None, observer)?;
    let aligned = align_batch(&report.completed, params, Some(&cutline), observer)?;
    report.merge(aligned);
    let clipped = clip_batch(&report.completed, &cutline, params, observer)?;
    report.merge(clipped);
    let linear = radiometric_batch(
        &report.completed,
        RadiometricDirection::ToLinear,
        params,
        observer,
    )?;
    report.merge(linear);
    Ok(report)
}

/// Convert denoised outputs back to dB and sort them.
pub fn finish_scene(
    files: &[PathBuf],
    params: &PipelineParams,
    observer: &dyn PipelineObserver,
) -> Result<BatchReport> {
    let mut report = radiometric_batch(files, RadiometricDirection::ToDb, params, observer)?;
    let sorted = sort_batch(&report.completed, params, observer)?;
    report.merge(sorted);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collect_expands_directories() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.tif", "a.TIFF", "notes.txt"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        let files = collect_rasters(&[dir.path().to_path_buf()]).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.TIFF", "b.tif"]);
    }

    #[test]
    fn collect_rejects_missing_input() {
        let err = collect_rasters(&[PathBuf::from("/definitely/not/here.tif")]).unwrap_err();
        assert_eq!(err.kind(), "IOError");
    }

    #[test]
    fn best_coverage_needs_cutline() {
        let params = PipelineParams {
            reference: ReferenceStrategy::BestCoverage,
            ..Default::default()
        };
        let err = resolve_reference(&params, &[PathBuf::from("a.tif")], None).unwrap_err();
        assert_eq!(err.kind(), "ArgumentError");
    }

    #[test]
    fn explicit_reference_is_used_as_given() {
        let params = PipelineParams {
            reference: ReferenceStrategy::Explicit(PathBuf::from("ref.tif")),
            ..Default::default()
        };
        let path = resolve_reference(&params, &[], None).unwrap();
        assert_eq!(path, PathBuf::from("ref.tif"));
    }
}
