//! Consistency check between input rasters and per-band auxiliary data
//! (e.g. mean statistics keyed `<scene>_<POL>`, two entries per scene).
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::warn;

use crate::error::{Error, Result};

/// Scene name of an input file: the stem without its trailing `_<POL>` suffix.
pub fn scene_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    strip_band_suffix(&stem).to_string()
}

fn strip_band_suffix(name: &str) -> &str {
    match name.rsplit_once('_') {
        Some((scene, suffix)) if suffix.len() == 2 => scene,
        _ => name,
    }
}

/// Keys of the JSON object stored at `path`.
pub fn load_auxiliary_keys(path: &Path) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path)?;
    match serde_json::from_str::<Value>(&text)? {
        Value::Object(map) => Ok(map.keys().cloned().collect()),
        _ => Err(Error::Config(format!(
            "{}: auxiliary data must be a JSON object",
            path.display()
        ))),
    }
}

/// Fail with `MismatchError` unless the auxiliary keys hold exactly two
/// entries per input scene and every entry refers to an input scene.
pub fn verify_auxiliary_coverage(inputs: &[PathBuf], keys: &[String]) -> Result<()> {
    let scenes: BTreeSet<String> = inputs.iter().map(|p| scene_name(p)).collect();

    if keys.len() != scenes.len() * 2 {
        warn!(
            "{} scene(s) in input but {} auxiliary entries; files may be missing",
            scenes.len(),
            keys.len()
        );
        return Err(Error::Mismatch(format!(
            "{} input scene(s) need {} auxiliary entries, found {}",
            scenes.len(),
            scenes.len() * 2,
            keys.len()
        )));
    }

    let missing: Vec<&str> = keys
        .iter()
        .map(|k| k.as_str())
        .filter(|k| !scenes.contains(strip_band_suffix(k)))
        .collect();
    if !missing.is_empty() {
        return Err(Error::Mismatch(format!(
            "auxiliary entries without input scene: {}",
            missing.join(", ")
        )));
    }
    Ok(())
}
