#![allow(dead_code)]

use std::path::{Path, PathBuf};

use floodprep::io::writers::write_geotiff;
use floodprep::{GeoTransform, RasterDataset, SampleType};
use ndarray::Array3;

pub const EPSG: &str = "EPSG:25832";
pub const ORIGIN: (f64, f64) = (500_000.0, 5_600_000.0);

/// Single-band raster whose samples encode their position: `row * 1000 + col`.
pub fn position_raster(
    width: usize,
    height: usize,
    origin: (f64, f64),
    res: f64,
    sample_type: SampleType,
) -> RasterDataset {
    let data = Array3::from_shape_fn((1, height, width), |(_, r, c)| (r * 1000 + c) as f64);
    RasterDataset::new(
        data,
        GeoTransform::north_up(origin.0, origin.1, res, res),
        EPSG,
        Some(-9999.0),
        sample_type,
    )
}

pub fn write_raster(dir: &Path, name: &str, raster: &RasterDataset) -> PathBuf {
    let path = dir.join(name);
    write_geotiff(&path, raster).expect("write test raster");
    path
}

/// Names of the entries of `dir`, sorted.
pub fn entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// `position_raster` in EPSG:4326, `origin` as (lon, lat) and `res` in degrees.
pub fn geographic_raster(width: usize, height: usize, origin: (f64, f64), res: f64) -> RasterDataset {
    RasterDataset {
        crs: "EPSG:4326".to_string(),
        ..position_raster(width, height, origin, res, SampleType::Float32)
    }
}
