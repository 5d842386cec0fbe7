//! Per-polarization band extraction from multi-subdataset products
//! (e.g. NetCDF exports holding one amplitude variable per polarization).
use std::path::{Path, PathBuf};

use gdal::{Dataset, Metadata};
use tracing::{debug, info};

use crate::core::classify::{BandClassifier, SubdatasetInfo};
use crate::error::Result;
use crate::io::gdal::{GdalError, metadata_map, read_raster};
use crate::io::writers::{COMPRESSED_TILED, write_raster_atomically_with_options};

fn open(path: &Path) -> std::result::Result<Dataset, GdalError> {
    Dataset::open(path).map_err(|source| GdalError::Open {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse `SUBDATASET_<n>_NAME=<name>` entries, ordered by `n`.
pub fn parse_subdataset_names(entries: &[String]) -> Vec<String> {
    let mut named: Vec<(usize, String)> = entries
        .iter()
        .filter_map(|entry| {
            let (key, value) = entry.split_once('=')?;
            let index = key.strip_prefix("SUBDATASET_")?.strip_suffix("_NAME")?;
            Some((index.parse().ok()?, value.to_string()))
        })
        .collect();
    named.sort_by_key(|(index, _)| *index);
    named.into_iter().map(|(_, name)| name).collect()
}

/// Names of all subdatasets of `path`; a plain raster is its own only subdataset.
pub fn list_subdatasets(path: &Path) -> Result<Vec<String>> {
    let dataset = open(path)?;
    let names = dataset
        .metadata_domain("SUBDATASETS")
        .map(|entries| parse_subdataset_names(&entries))
        .unwrap_or_default();
    if names.is_empty() {
        return Ok(vec![path.to_string_lossy().into_owned()]);
    }
    Ok(names)
}

pub fn read_subdataset_info(name: &str) -> Result<SubdatasetInfo> {
    let dataset = open(Path::new(name))?;
    Ok(SubdatasetInfo {
        name: name.to_string(),
        metadata: metadata_map(&dataset),
    })
}

/// `<output_dir>/<stem>_<POL>_<ORB>_band.tif`
pub fn band_output_path(product: &Path, output_dir: &Path, tag: &str) -> PathBuf {
    let stem = product
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    output_dir.join(format!("{}_{}_band.tif", stem, tag))
}

/// Write one tiled, LZW-compressed GeoTIFF per whitelisted polarization
/// subdataset of `product`.
/// Unknown orbit metadata aborts the whole product.
pub fn extract_polarization_bands(
    product: &Path,
    output_dir: &Path,
    classifier: &BandClassifier,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)?;
    let mut written = Vec::new();
    for name in list_subdatasets(product)? {
        let info = read_subdataset_info(&name)?;
        let Some(descriptor) = classifier.classify(&info)? else {
            debug!("Skipping subdataset {}", name);
            continue;
        };
        let raster = read_raster(Path::new(&name))?;
        let output = band_output_path(product, output_dir, &descriptor.tag());
        write_raster_atomically_with_options(&output, &raster, COMPRESSED_TILED)?;
        info!("Extracted {} -> {:?}", descriptor.tag(), output);
        written.push(output);
    }
    Ok(written)
}
