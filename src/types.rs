//! Shared types and enums used across floodprep.
//! Includes `Polarization`, `OrbitDirection`, raster `SampleType`, the
//! radiometric conversion direction and policies, and the reference selection strategy.
use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

#[derive(
    Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, ValueEnum, Debug, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Polarization {
    Vv,
    Vh,
    Hh,
    Hv,
}

impl Polarization {
    pub const ALL: [Polarization; 4] = [
        Polarization::Vv,
        Polarization::Vh,
        Polarization::Hh,
        Polarization::Hv,
    ];

    /// Two-letter code as it appears in product and file names.
    pub fn code(&self) -> &'static str {
        match self {
            Polarization::Vv => "VV",
            Polarization::Vh => "VH",
            Polarization::Hh => "HH",
            Polarization::Hv => "HV",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim();
        Self::ALL
            .into_iter()
            .find(|p| p.code().eq_ignore_ascii_case(code))
    }
}

impl std::fmt::Display for Polarization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Satellite pass direction of an acquisition.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum OrbitDirection {
    Ascending,
    Descending,
}

impl OrbitDirection {
    pub const ALL: [OrbitDirection; 2] = [OrbitDirection::Ascending, OrbitDirection::Descending];

    /// Parse the metadata value; only `ASCENDING` and `DESCENDING` are accepted.
    pub fn from_metadata(value: &str) -> crate::Result<Self> {
        match value.trim() {
            "ASCENDING" => Ok(OrbitDirection::Ascending),
            "DESCENDING" => Ok(OrbitDirection::Descending),
            other => Err(crate::Error::UnknownOrbit {
                value: other.to_string(),
            }),
        }
    }

    /// Short code used in file names and sort buckets.
    pub fn code(&self) -> &'static str {
        match self {
            OrbitDirection::Ascending => "ASC",
            OrbitDirection::Descending => "DSC",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "ASC" => Some(OrbitDirection::Ascending),
            "DSC" => Some(OrbitDirection::Descending),
            _ => None,
        }
    }
}

impl std::fmt::Display for OrbitDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// On-disk sample type of a raster. Buffers are always held as f64 in memory.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum SampleType {
    Int16,
    Float32,
    Float64,
}

impl SampleType {
    /// Type able to hold the result of a radiometric conversion.
    pub fn floating(self) -> Self {
        match self {
            SampleType::Int16 => SampleType::Float32,
            other => other,
        }
    }
}

impl std::fmt::Display for SampleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SampleType::Int16 => write!(f, "Int16"),
            SampleType::Float32 => write!(f, "Float32"),
            SampleType::Float64 => write!(f, "Float64"),
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, ValueEnum, Serialize, Deserialize)]
pub enum RadiometricDirection {
    ToLinear,
    ToDb,
}

impl std::fmt::Display for RadiometricDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RadiometricDirection::ToLinear => write!(f, "dB -> linear"),
            RadiometricDirection::ToDb => write!(f, "linear -> dB"),
        }
    }
}

/// What to do with linear samples `<= 0` when converting to dB.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NonPositivePolicy {
    /// Abort the file with a `DomainError`.
    #[default]
    Fail,
    /// Replace the sample with the raster's nodata value.
    Nodata,
}

/// How the reference raster of a scene is chosen.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceStrategy {
    /// Largest file on disk; assumed to cover the whole area of interest.
    #[default]
    LargestFile,
    /// A fixed reference file.
    Explicit(PathBuf),
    /// Candidate whose extent overlaps the cutline extent the most.
    BestCoverage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polarization_codes() {
        assert_eq!(Polarization::from_code("vh"), Some(Polarization::Vh));
        assert_eq!(Polarization::from_code(" HV "), Some(Polarization::Hv));
        assert_eq!(Polarization::from_code("XX"), None);
        assert_eq!(Polarization::Hh.to_string(), "HH");
    }

    #[test]
    fn orbit_requires_exact_value() {
        assert_eq!(
            OrbitDirection::from_metadata("ASCENDING").unwrap(),
            OrbitDirection::Ascending
        );
        assert_eq!(OrbitDirection::Descending.code(), "DSC");
        let err = OrbitDirection::from_metadata("Ascending").unwrap_err();
        assert_eq!(err.kind(), "UnknownOrbitError");
    }

    #[test]
    fn whitelist_deserializes_from_codes() {
        let pols: Vec<Polarization> = serde_json::from_str(r#"["VV","HV"]"#).unwrap();
        assert_eq!(pols, vec![Polarization::Vv, Polarization::Hv]);
        let strategy: ReferenceStrategy =
            serde_json::from_str(r#"{"explicit":"/data/ref.tif"}"#).unwrap();
        assert_eq!(strategy, ReferenceStrategy::Explicit("/data/ref.tif".into()));
    }
}
