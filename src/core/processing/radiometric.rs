//! Decibel <-> linear conversion of single-band intensity data.
//!
//! The forward transform clamps positive dB values to 0 before converting, so
//! `to_db(to_linear(x)) == x` only holds for `x <= 0`.
use ndarray::ArrayViewMut2;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::types::NonPositivePolicy;

/// Fixed linear-domain scale expected by the denoiser.
pub const LINEAR_SCALE: f64 = 200.0;

/// `10^(min(db, 0) / 10) * 200`. NaN stays NaN.
pub fn to_linear(db: f64) -> f64 {
    if db.is_nan() {
        return db;
    }
    10f64.powf(db.min(0.0) / 10.0) * LINEAR_SCALE
}

/// `10 * log10(linear / 200)`; non-positive input is a `DomainError`.
pub fn to_db(linear: f64) -> Result<f64> {
    if linear.is_nan() {
        return Ok(linear);
    }
    if linear <= 0.0 {
        return Err(Error::Domain {
            value: linear,
            count: 1,
        });
    }
    Ok(10.0 * (linear / LINEAR_SCALE).log10())
}

/// Convert a dB band to linear in place. Nodata samples are left untouched.
/// Returns the number of samples that were clamped.
pub fn band_to_linear(mut band: ArrayViewMut2<'_, f64>, nodata: Option<f64>) -> usize {
    let mut clamped = 0;
    band.iter_mut()
        .filter(|v| !is_nodata(**v, nodata))
        .for_each(|v| {
            if *v > 0.0 {
                clamped += 1;
            }
            *v = to_linear(*v);
        });
    if clamped > 0 {
        debug!("Clamped {} positive dB sample(s) to 0 dB", clamped);
    }
    clamped
}

/// Convert a linear band to dB in place. Nodata samples pass through unchanged;
/// other non-positive samples follow `policy`. On failure the band is not modified.
pub fn band_to_db(
    mut band: ArrayViewMut2<'_, f64>,
    nodata: Option<f64>,
    policy: NonPositivePolicy,
) -> Result<usize> {
    let mut invalid = band
        .iter()
        .filter(|v| !is_nodata(**v, nodata) && **v <= 0.0);
    if let Some(first) = invalid.next().copied() {
        let count = 1 + invalid.count();
        match (policy, nodata) {
            (NonPositivePolicy::Fail, _) | (NonPositivePolicy::Nodata, None) => {
                return Err(Error::Domain {
                    value: first,
                    count,
                });
            }
            (NonPositivePolicy::Nodata, Some(_)) => {
                warn!("{} non-positive linear sample(s) set to nodata", count);
            }
        }
    }

    let mut replaced = 0;
    for v in band.iter_mut() {
        if is_nodata(*v, nodata) {
            continue;
        }
        match to_db(*v) {
            Ok(db) => *v = db,
            Err(_) => {
                if let Some(nd) = nodata {
                    *v = nd;
                    replaced += 1;
                }
            }
        }
    }
    Ok(replaced)
}

fn is_nodata(value: f64, nodata: Option<f64>) -> bool {
    match nodata {
        Some(nd) if nd.is_nan() => value.is_nan(),
        Some(nd) => value == nd,
        None => false,
    }
}
