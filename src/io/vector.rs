//! Cutline vectors: read the first layer of any OGR source, write GeoJSON.
use std::path::{Path, PathBuf};

use gdal::Dataset;
use gdal::vector::{LayerAccess, ToGdal};
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::core::crs;
use crate::core::geometry::Cutline;
use crate::error::{Error, Result};
use crate::io::gdal::GdalError;
use crate::io::writers::replace_atomically;

/// Read every polygon of the first layer of `path` with the layer's CRS.
pub fn read_cutline(path: &Path) -> Result<Cutline> {
    let dataset = Dataset::open(path).map_err(|source| GdalError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    if dataset.layer_count() == 0 {
        return Err(Error::Geometry(format!("{} contains no layers", path.display())));
    }
    let mut layer = dataset.layer(0).map_err(GdalError::from)?;
    let crs = match layer.spatial_ref() {
        Some(srs) => srs.to_wkt().map_err(GdalError::from)?,
        None => {
            return Err(Error::crs(
                &path.display().to_string(),
                "cutline layer has no spatial reference",
            ));
        }
    };

    let mut geometries = Vec::new();
    for feature in layer.features() {
        if let Some(geometry) = feature.geometry() {
            geometries.push(geometry.to_geo().map_err(GdalError::from)?);
        }
    }
    debug!("Read {} feature geometries from {:?}", geometries.len(), path);
    Cutline::from_geometries(crs, geometries)
}

/// GeoJSON FeatureCollection with one feature per polygon.
pub fn cutline_to_geojson(cutline: &Cutline) -> Result<Value> {
    let mut features = Vec::with_capacity(cutline.polygons().0.len());
    for polygon in &cutline.polygons().0 {
        let geometry = polygon.to_gdal().map_err(GdalError::from)?;
        let text = geometry.json().map_err(GdalError::from)?;
        let geometry: Value = serde_json::from_str(&text)?;
        features.push(json!({ "type": "Feature", "properties": {}, "geometry": geometry }));
    }
    let mut collection = json!({ "type": "FeatureCollection", "features": features });
    if let Some(code) = crs::label(&cutline.crs).strip_prefix("EPSG:") {
        collection["crs"] = json!({
            "type": "name",
            "properties": { "name": format!("urn:ogc:def:crs:EPSG::{}", code) }
        });
    }
    Ok(collection)
}

/// Write `cutline` as GeoJSON at `path`.
pub fn write_cutline_geojson(path: &Path, cutline: &Cutline) -> Result<()> {
    let collection = cutline_to_geojson(cutline)?;
    let bytes = serde_json::to_vec_pretty(&collection)?;
    replace_atomically(path, |tmp| Ok(std::fs::write(tmp, &bytes)?))?;
    info!("Wrote reprojected cutline to {:?}", path);
    Ok(())
}

/// `<output_dir>/new_<stem>.geojson`
pub fn reprojected_cutline_path(cutline_path: &Path, output_dir: &Path) -> PathBuf {
    let stem = cutline_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "cutline".to_string());
    output_dir.join(format!("new_{}.geojson", stem))
}
