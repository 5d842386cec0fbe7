//! Coordinate reference handling: CRS parsing/validation and the
//! `CoordinateTransform` seam used by every warp.
use gdal::spatial_ref::{AxisMappingStrategy, CoordTransform, SpatialRef};
use tracing::debug;

use crate::error::{Error, Result};

/// Batch point transform between two CRSs. Coordinates are updated in place.
pub trait CoordinateTransform {
    fn transform(&self, xs: &mut [f64], ys: &mut [f64]) -> Result<()>;
}

/// Transform between identical CRSs.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityTransform;

impl CoordinateTransform for IdentityTransform {
    fn transform(&self, _xs: &mut [f64], _ys: &mut [f64]) -> Result<()> {
        Ok(())
    }
}

/// GDAL/PROJ-backed transform, always in traditional (x=easting/lon) axis order.
pub struct GdalTransform {
    inner: CoordTransform,
    source: String,
    target: String,
}

impl GdalTransform {
    pub fn new(source: &str, target: &str) -> Result<Self> {
        let src = parse_crs(source)?;
        let dst = parse_crs(target)?;
        let inner = CoordTransform::new(&src, &dst).map_err(|e| {
            Error::crs(target, format!("no transformation from `{}`: {}", label(source), e))
        })?;
        Ok(Self {
            inner,
            source: source.to_string(),
            target: target.to_string(),
        })
    }
}

impl CoordinateTransform for GdalTransform {
    fn transform(&self, xs: &mut [f64], ys: &mut [f64]) -> Result<()> {
        let mut zs = vec![0.0; xs.len()];
        self.inner
            .transform_coords(xs, ys, &mut zs)
            .map_err(|e| Error::crs(&self.target, format!("from `{}`: {}", label(&self.source), e)))
    }
}

/// Parse a CRS definition (`EPSG:25832`, WKT, PROJ string).
pub fn parse_crs(definition: &str) -> Result<SpatialRef> {
    if definition.trim().is_empty() {
        return Err(Error::crs(definition, "empty definition"));
    }
    let mut srs = SpatialRef::from_definition(definition).map_err(|e| Error::crs(definition, e))?;
    srs.set_axis_mapping_strategy(AxisMappingStrategy::TraditionalGisOrder);
    Ok(srs)
}

/// Fail with `CRSError` unless `definition` parses.
pub fn validate_crs(definition: &str) -> Result<()> {
    parse_crs(definition).map(|_| ())
}

/// Whether two definitions describe the same CRS.
pub fn same_crs(a: &str, b: &str) -> Result<bool> {
    if a == b {
        return Ok(true);
    }
    Ok(parse_crs(a)? == parse_crs(b)?)
}

/// Transform from `source` to `target`; identity when both describe the same CRS.
pub fn transformer(source: &str, target: &str) -> Result<Box<dyn CoordinateTransform>> {
    if same_crs(source, target)? {
        debug!("{} and {} are equivalent; using identity transform", label(source), label(target));
        return Ok(Box::new(IdentityTransform));
    }
    Ok(Box::new(GdalTransform::new(source, target)?))
}

/// Short human-readable label: `EPSG:xxxx` when an authority tag is present.
pub fn label(definition: &str) -> String {
    parse_epsg(definition).unwrap_or_else(|| {
        let trimmed: String = definition.chars().take(40).collect();
        trimmed
    })
}

// Extract the last EPSG authority from WKT1 (`AUTHORITY["EPSG","x"]`) or WKT2 (`ID["EPSG",x]`)
fn parse_epsg(definition: &str) -> Option<String> {
    if let (Some(prefix), Some(code)) = (definition.get(..5), definition.get(5..)) {
        if prefix.eq_ignore_ascii_case("EPSG:") && !code.is_empty() {
            return Some(format!("EPSG:{}", code));
        }
    }
    for key in ["AUTHORITY[\"EPSG\",\"", "ID[\"EPSG\","] {
        if let Some(idx) = definition.rfind(key) {
            let start = idx + key.len();
            let code: String = definition[start..]
                .chars()
                .take_while(|c| c.is_ascii_digit())
                .collect();
            if !code.is_empty() {
                return Some(format!("EPSG:{}", code));
            }
        }
    }
    None
}
