use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::crs;
use crate::core::processing::tile::DEFAULT_TILE_SIZE;
use crate::error::{Error, Result};
use crate::types::{NonPositivePolicy, Polarization, ReferenceStrategy};

pub const DEFAULT_TARGET_CRS: &str = "EPSG:25832";
pub const DEFAULT_CLIP_MARGIN: f64 = 2560.0;
pub const DEFAULT_NODATA: f64 = -9999.0;
pub const DEFAULT_ORBIT_KEY: &str = "/Metadata_Group/Abstracted_Metadata/NC_GLOBAL#PASS";

/// Pipeline parameters suitable for config files; CLI flags override them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineParams {
    /// Root for all derived artifacts (reprojected cutline, sorted tree).
    pub output_directory: PathBuf,
    pub polarization_whitelist: Vec<Polarization>,
    /// Projected CRS every clipped raster ends up in.
    pub target_crs: String,
    pub tile_size: usize,
    /// Pad added to the cutline's max-X/max-Y, in target CRS units.
    pub clip_margin: f64,
    pub nodata_value: f64,
    /// Files processed in parallel.
    pub concurrency: usize,
    pub reference: ReferenceStrategy,
    pub orbit_metadata_key: String,
    /// Metadata keys tried for the polarization before falling back to the
    /// subdataset name.
    pub polarization_metadata_keys: Vec<String>,
    pub non_positive_linear: NonPositivePolicy,
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self {
            output_directory: PathBuf::from("."),
            polarization_whitelist: vec![Polarization::Vv, Polarization::Vh],
            target_crs: DEFAULT_TARGET_CRS.to_string(),
            tile_size: DEFAULT_TILE_SIZE,
            clip_margin: DEFAULT_CLIP_MARGIN,
            nodata_value: DEFAULT_NODATA,
            concurrency: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            reference: ReferenceStrategy::default(),
            orbit_metadata_key: DEFAULT_ORBIT_KEY.to_string(),
            polarization_metadata_keys: vec!["POLARIZATION".to_string(), "polarization".to_string()],
            non_positive_linear: NonPositivePolicy::default(),
        }
    }
}

impl PipelineParams {
    /// Load from a JSON file; missing keys take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Check everything that can be checked without touching input files.
    pub fn validate(&self) -> Result<()> {
        if self.tile_size == 0 {
            return Err(Error::Config("tile_size must be greater than 0".to_string()));
        }
        if self.concurrency == 0 {
            return Err(Error::Config("concurrency must be greater than 0".to_string()));
        }
        if !self.clip_margin.is_finite() || self.clip_margin < 0.0 {
            return Err(Error::Config(format!(
                "clip_margin must be a non-negative number, got {}",
                self.clip_margin
            )));
        }
        if self.polarization_whitelist.is_empty() {
            return Err(Error::Config("polarization_whitelist is empty".to_string()));
        }
        crs::validate_crs(&self.target_crs)
    }

    /// `<output_directory>/sorted_denoised_geotiffs`
    pub fn sorted_root(&self) -> PathBuf {
        self.output_directory.join(crate::io::sorted::SORTED_DIR)
    }
}
