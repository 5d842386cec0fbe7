//! Band classification: polarization and orbit direction of subdatasets, and
//! routing of finished files into `<POL>_<ORB>` / `unsorted` buckets.
use std::collections::HashMap;
use std::path::Path;

use tracing::debug;

use crate::core::params::PipelineParams;
use crate::error::Result;
use crate::types::{OrbitDirection, Polarization};

pub const UNSORTED_DIR: &str = "unsorted";

/// Name and default-domain metadata of one subdataset of a product.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubdatasetInfo {
    pub name: String,
    pub metadata: HashMap<String, String>,
}

/// Where a polarization code is read from.
#[derive(Debug, Clone, PartialEq)]
pub enum PolarizationSource {
    /// Value of a metadata key.
    MetadataKey(String),
    /// `len` characters of the subdataset name starting `offset_from_end`
    /// characters before its end. Breaks as soon as naming changes, so it is
    /// only used after every metadata key missed.
    NamePosition { offset_from_end: usize, len: usize },
}

impl PolarizationSource {
    /// Fallback matching names such as `...:Amplitude_VH_db`.
    pub const NAME_FALLBACK: PolarizationSource = PolarizationSource::NamePosition {
        offset_from_end: 5,
        len: 2,
    };

    pub fn extract(&self, subdataset: &SubdatasetInfo) -> Option<String> {
        match self {
            PolarizationSource::MetadataKey(key) => subdataset.metadata.get(key).cloned(),
            PolarizationSource::NamePosition {
                offset_from_end,
                len,
            } => {
                let chars: Vec<char> = subdataset.name.chars().collect();
                let start = chars.len().checked_sub(*offset_from_end)?;
                let end = (start + len).min(chars.len());
                Some(chars[start..end].iter().collect())
            }
        }
    }
}

/// Polarization and orbit direction of one band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BandDescriptor {
    pub polarization: Polarization,
    pub orbit: OrbitDirection,
}

impl BandDescriptor {
    /// `VH_ASC`-style tag used in file names and sort buckets.
    pub fn tag(&self) -> String {
        format!("{}_{}", self.polarization.code(), self.orbit.code())
    }
}

pub struct BandClassifier {
    whitelist: Vec<Polarization>,
    orbit_key: String,
    sources: Vec<PolarizationSource>,
}

impl BandClassifier {
    pub fn new(
        whitelist: Vec<Polarization>,
        orbit_key: impl Into<String>,
        sources: Vec<PolarizationSource>,
    ) -> Self {
        Self {
            whitelist,
            orbit_key: orbit_key.into(),
            sources,
        }
    }

    /// Metadata keys from `params`, then the positional name fallback.
    pub fn from_params(params: &PipelineParams) -> Self {
        let mut sources: Vec<PolarizationSource> = params
            .polarization_metadata_keys
            .iter()
            .cloned()
            .map(PolarizationSource::MetadataKey)
            .collect();
        sources.push(PolarizationSource::NAME_FALLBACK);
        Self::new(
            params.polarization_whitelist.clone(),
            params.orbit_metadata_key.clone(),
            sources,
        )
    }

    /// First source yielding a known polarization code.
    pub fn polarization(&self, subdataset: &SubdatasetInfo) -> Option<Polarization> {
        self.sources.iter().find_map(|source| {
            let code = source.extract(subdataset)?;
            let pol = Polarization::from_code(&code)?;
            debug!("{} -> {} via {:?}", subdataset.name, pol, source);
            Some(pol)
        })
    }

    /// Orbit from the configured key. Missing or unexpected values are fatal.
    pub fn orbit(&self, subdataset: &SubdatasetInfo) -> Result<OrbitDirection> {
        let value = subdataset
            .metadata
            .get(&self.orbit_key)
            .map(String::as_str)
            .unwrap_or("<missing>");
        OrbitDirection::from_metadata(value)
    }

    /// `Ok(None)` when the polarization is unknown or not whitelisted.
    pub fn classify(&self, subdataset: &SubdatasetInfo) -> Result<Option<BandDescriptor>> {
        let orbit = self.orbit(subdataset)?;
        Ok(self
            .polarization(subdataset)
            .filter(|p| self.whitelist.contains(p))
            .map(|polarization| BandDescriptor { polarization, orbit }))
    }
}

/// Destination bucket of a finished file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortBucket {
    Sorted(BandDescriptor),
    Unsorted,
}

impl SortBucket {
    pub fn dir_name(&self) -> String {
        match self {
            SortBucket::Sorted(descriptor) => descriptor.tag(),
            SortBucket::Unsorted => UNSORTED_DIR.to_string(),
        }
    }
}

/// Route by the `_`-separated tokens of the file stem: a whitelisted
/// polarization code and an `ASC`/`DSC` tag. Anything else is unsorted.
pub fn route_file(path: &Path, whitelist: &[Polarization]) -> SortBucket {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tokens: Vec<&str> = stem.split('_').collect();

    let polarization = tokens.iter().rev().find_map(|t| {
        whitelist.iter().copied().find(|p| p.code() == *t)
    });
    let orbit = tokens.iter().rev().find_map(|t| OrbitDirection::from_code(t));

    match (polarization, orbit) {
        (Some(polarization), Some(orbit)) => {
            SortBucket::Sorted(BandDescriptor { polarization, orbit })
        }
        _ => SortBucket::Unsorted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn subdataset(name: &str, pairs: &[(&str, &str)]) -> SubdatasetInfo {
        SubdatasetInfo {
            name: name.to_string(),
            metadata: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    fn classifier() -> BandClassifier {
        BandClassifier::from_params(&PipelineParams {
            polarization_whitelist: vec![Polarization::Vv, Polarization::Vh],
            ..Default::default()
        })
    }

    #[test]
    fn metadata_key_wins_over_name() {
        let sub = subdataset(
            "NETCDF:\"scene.nc\":Amplitude_VV_db",
            &[("POLARIZATION", "VH"), (crate::core::params::DEFAULT_ORBIT_KEY, "ASCENDING")],
        );
        let d = classifier().classify(&sub).unwrap().unwrap();
        assert_eq!(d.tag(), "VH_ASC");
    }

    #[test]
    fn positional_fallback() {
        let sub = subdataset(
            "NETCDF:\"scene.nc\":Sigma0_VV_db",
            &[(crate::core::params::DEFAULT_ORBIT_KEY, "DESCENDING")],
        );
        let d = classifier().classify(&sub).unwrap().unwrap();
        assert_eq!(d.polarization, Polarization::Vv);
        assert_eq!(d.orbit, OrbitDirection::Descending);
    }

    #[test]
    fn non_whitelisted_polarization_is_skipped() {
        let sub = subdataset(
            "x",
            &[("POLARIZATION", "HH"), (crate::core::params::DEFAULT_ORBIT_KEY, "ASCENDING")],
        );
        assert_eq!(classifier().classify(&sub).unwrap(), None);
    }

    #[test]
    fn unknown_orbit_is_fatal() {
        let sub = subdataset("x", &[("POLARIZATION", "VV"), (crate::core::params::DEFAULT_ORBIT_KEY, "NORTH")]);
        assert_eq!(classifier().classify(&sub).unwrap_err().kind(), "UnknownOrbitError");
        let missing = subdataset("x", &[("POLARIZATION", "VV")]);
        assert!(classifier().classify(&missing).is_err());
    }

    #[test]
    fn positional_source_handles_short_names() {
        assert_eq!(PolarizationSource::NAME_FALLBACK.extract(&subdataset("VV", &[])), None);
    }

    #[test]
    fn routing() {
        let whitelist = [Polarization::Vv, Polarization::Vh];
        let bucket = route_file(&PathBuf::from("/out/S1A_IW_20240101_VH_ASC_band.tif"), &whitelist);
        assert_eq!(bucket.dir_name(), "VH_ASC");
        let bucket = route_file(&PathBuf::from("S1A_IW_20240101_VV_DSC_band.tif"), &whitelist);
        assert_eq!(bucket.dir_name(), "VV_DSC");
        assert_eq!(
            route_file(&PathBuf::from("S1A_IW_20240101_VH_band.tif"), &whitelist),
            SortBucket::Unsorted
        );
        assert_eq!(
            route_file(&PathBuf::from("S1A_IW_20240101_HH_ASC_band.tif"), &whitelist),
            SortBucket::Unsorted
        );
    }
}
