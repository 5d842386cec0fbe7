use gdal::raster::{GdalDataType, ResampleAlg};
use gdal::{Dataset, Metadata, errors::GdalError as GdalCrateError};
use ndarray::{Array2, Array3, Axis};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::core::raster::{GeoTransform, RasterDataset};
use crate::types::SampleType;

/// Errors encountered when using the GDAL raster store
#[derive(Debug, Error)]
pub enum GdalError {
    #[error("GDAL error: {0}")]
    Gdal(#[from] GdalCrateError),
    #[error("Cannot open {path:?}: {source}")]
    Open {
        path: PathBuf,
        source: GdalCrateError,
    },
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("Dimension mismatch: expected {0}x{1}, got {2} samples")]
    DimensionMismatch(usize, usize, usize),
}

/// Metadata extracted from a GDAL-supported raster
#[derive(Debug, Clone)]
pub struct GdalMetadata {
    /// Width (pixels) of the raster
    pub size_x: usize,
    /// Height (lines) of the raster
    pub size_y: usize,
    /// Number of raster bands
    pub bands: usize,
    pub geotransform: GeoTransform,
    /// Projection as reported by GDAL (WKT); empty when the file has none
    pub projection: String,
    /// Nodata of the first band, applied to all bands
    pub nodata: Option<f64>,
    pub sample_type: SampleType,
}

/// Reader for single- or multi-band georeferenced rasters via GDAL
pub struct GdalRasterReader {
    pub dataset: Dataset,
    pub metadata: GdalMetadata,
}

fn sample_type_of(data_type: GdalDataType) -> Result<SampleType, GdalError> {
    match data_type {
        GdalDataType::Int16 | GdalDataType::UInt8 => Ok(SampleType::Int16),
        GdalDataType::Float32 => Ok(SampleType::Float32),
        GdalDataType::Float64 | GdalDataType::UInt16 | GdalDataType::Int32 | GdalDataType::UInt32 => {
            Ok(SampleType::Float64)
        }
        other => Err(GdalError::UnsupportedFormat(format!(
            "sample type {:?}",
            other
        ))),
    }
}

/// Default-domain metadata of a dataset as a map
pub fn metadata_map(dataset: &Dataset) -> HashMap<String, String> {
    let mut map = HashMap::new();
    if let Some(entries) = dataset.metadata_domain("") {
        for entry in entries {
            if let Some((key, val)) = entry.split_once('=') {
                map.insert(key.to_string(), val.to_string());
            }
        }
    }
    map
}

impl GdalRasterReader {
    /// Open a GDAL-supported raster (GeoTIFF, NetCDF subdataset, ...)
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, GdalError> {
        let path = path.as_ref();
        let dataset = Dataset::open(path).map_err(|source| GdalError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let (size_x, size_y) = dataset.raster_size();
        let bands = dataset.raster_count() as usize;
        if bands == 0 {
            return Err(GdalError::UnsupportedFormat(format!(
                "no raster bands in {:?}",
                path
            )));
        }
        let geotransform = dataset.geo_transform().map_err(|_| {
            GdalError::UnsupportedFormat(format!("{:?} has no geotransform", path))
        })?;
        let first = dataset.rasterband(1)?;
        let nodata = first.no_data_value();
        let sample_type = sample_type_of(first.band_type())?;
        let projection = dataset.projection();
        debug!(
            "Opened {:?}: {}x{} px, {} band(s), {}",
            path, size_x, size_y, bands, sample_type
        );
        Ok(GdalRasterReader {
            metadata: GdalMetadata {
                size_x,
                size_y,
                bands,
                geotransform: GeoTransform(geotransform),
                projection,
                nodata,
                sample_type,
            },
            dataset,
        })
    }

    /// Read a single band (1-based index) as an f64 ndarray of shape (height, width)
    pub fn read_band(&self, index: usize) -> Result<Array2<f64>, GdalError> {
        if index == 0 || index > self.metadata.bands {
            return Err(GdalError::UnsupportedFormat(format!(
                "Band index {} out of range",
                index
            )));
        }
        let band = self.dataset.rasterband(index)?;
        let window = (self.metadata.size_x, self.metadata.size_y);
        let buf = band.read_as::<f64>((0, 0), window, window, Some(ResampleAlg::NearestNeighbour))?;
        let data_vec = buf.data().to_vec();
        let len = data_vec.len();
        Array2::from_shape_vec((self.metadata.size_y, self.metadata.size_x), data_vec).map_err(|_| {
            GdalError::DimensionMismatch(self.metadata.size_x, self.metadata.size_y, len)
        })
    }

    /// Read every band into an in-memory `RasterDataset`
    pub fn read_all(&self) -> Result<RasterDataset, GdalError> {
        let m = &self.metadata;
        let mut data = Array3::<f64>::zeros((m.bands, m.size_y, m.size_x));
        for idx in 1..=m.bands {
            let band = self.read_band(idx)?;
            data.index_axis_mut(Axis(0), idx - 1).assign(&band);
        }
        Ok(RasterDataset::new(
            data,
            m.geotransform,
            m.projection.clone(),
            m.nodata,
            m.sample_type,
        ))
    }
}

/// Open `path` and read it whole
pub fn read_raster<P: AsRef<Path>>(path: P) -> Result<RasterDataset, GdalError> {
    GdalRasterReader::open(path)?.read_all()
}
