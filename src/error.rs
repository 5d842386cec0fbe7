//! Crate-level error type and `Result` alias.
//! Every failure a pipeline stage can raise maps onto one variant here, and
//! `Error::kind` names the category reported back to batch callers.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GDAL error: {0}")]
    Gdal(#[from] crate::io::GdalError),

    #[error("Invalid CRS `{definition}`: {reason}")]
    Crs { definition: String, reason: String },

    #[error("Invalid cutline geometry: {0}")]
    Geometry(String),

    #[error("Raster of {width}x{height} pixels is smaller than one {tile_size}px tile")]
    InsufficientExtent {
        width: usize,
        height: usize,
        tile_size: usize,
    },

    #[error("Unknown orbit direction `{value}` (expected ASCENDING or DESCENDING)")]
    UnknownOrbit { value: String },

    #[error("{count} non-positive linear sample(s) cannot be converted to dB (first: {value})")]
    Domain { value: f64, count: usize },

    #[error("Input/auxiliary mismatch: {0}")]
    Mismatch(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid argument: {arg}={value}")]
    InvalidArgument { arg: &'static str, value: String },

    #[error("Missing required argument: {arg}")]
    MissingArgument { arg: String },
}

impl Error {
    /// Category name used when a batch reports a failed file.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Io(_) | Error::Gdal(_) => "IOError",
            Error::Crs { .. } => "CRSError",
            Error::Geometry(_) => "GeometryError",
            Error::InsufficientExtent { .. } => "InsufficientExtentError",
            Error::UnknownOrbit { .. } => "UnknownOrbitError",
            Error::Domain { .. } => "DomainError",
            Error::Mismatch(_) => "MismatchError",
            Error::Config(_) => "ConfigError",
            Error::InvalidArgument { .. } | Error::MissingArgument { .. } => "ArgumentError",
        }
    }

    pub(crate) fn crs<E: std::fmt::Display>(definition: &str, e: E) -> Self {
        Error::Crs {
            definition: definition.to_string(),
            reason: e.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Config(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_taxonomy() {
        let io = Error::from(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert_eq!(io.kind(), "IOError");
        assert_eq!(
            Error::InsufficientExtent {
                width: 10,
                height: 300,
                tile_size: 256
            }
            .kind(),
            "InsufficientExtentError"
        );
        assert_eq!(
            Error::UnknownOrbit {
                value: "LEFT".into()
            }
            .kind(),
            "UnknownOrbitError"
        );
        assert_eq!(Error::crs("EPSG:0", "bad").kind(), "CRSError");
    }

    #[test]
    fn messages_carry_context() {
        let e = Error::InsufficientExtent {
            width: 100,
            height: 512,
            tile_size: 256,
        };
        assert!(e.to_string().contains("100x512"));
    }
}
