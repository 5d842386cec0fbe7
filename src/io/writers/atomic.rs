//! Replace-on-success file output: content is written to a temporary file in
//! the destination directory and renamed over the target only once complete.
use std::path::Path;

use tracing::debug;

use crate::core::raster::RasterDataset;
use crate::error::{Error, Result};
use crate::io::writers::tiff::write_geotiff_with_options;

/// Run `write` against a temporary path next to `target`, then rename it over
/// `target`. On error the temporary file is removed and `target` is untouched.
pub fn replace_atomically<F>(target: &Path, write: F) -> Result<()>
where
    F: FnOnce(&Path) -> Result<()>,
{
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let stem = target
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let suffix = target
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let tmp = tempfile::Builder::new()
        .prefix(&format!(".{}.", stem))
        .suffix(&suffix)
        .tempfile_in(dir)?;
    write(tmp.path())?;
    let tmp_path = tmp.path().to_path_buf();
    tmp.persist(target).map_err(|e| Error::Io(e.error))?;
    debug!("Replaced {:?} via {:?}", target, tmp_path);
    Ok(())
}

/// Write `raster` as GeoTIFF at `target` without ever exposing a partial file.
pub fn write_raster_atomically(target: &Path, raster: &RasterDataset) -> Result<()> {
    write_raster_atomically_with_options(target, raster, &[])
}

/// [`write_raster_atomically`] with GTiff creation options.
pub fn write_raster_atomically_with_options(
    target: &Path,
    raster: &RasterDataset,
    options: &[(&str, &str)],
) -> Result<()> {
    replace_atomically(target, |tmp| {
        Ok(write_geotiff_with_options(tmp, raster, options)?)
    })
}

/// Copy `source` to `target` through a temporary file.
pub fn copy_atomically(source: &Path, target: &Path) -> Result<()> {
    replace_atomically(target, |tmp| {
        std::fs::copy(source, tmp)?;
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dir_entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn successful_write_replaces_target() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("scene.tif");
        std::fs::write(&target, b"old").unwrap();

        replace_atomically(&target, |tmp| {
            std::fs::write(tmp, b"new")?;
            Ok(())
        })
        .unwrap();

        assert_eq!(std::fs::read(&target).unwrap(), b"new");
        assert_eq!(dir_entries(dir.path()), vec!["scene.tif"]);
    }

    #[test]
    fn failed_write_leaves_original_intact() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("scene.tif");
        std::fs::write(&target, b"original").unwrap();

        let result = replace_atomically(&target, |tmp| {
            std::fs::write(tmp, b"half written")?;
            Err(Error::Geometry("interrupted".into()))
        });

        assert!(result.is_err());
        assert_eq!(std::fs::read(&target).unwrap(), b"original");
        assert_eq!(dir_entries(dir.path()), vec!["scene.tif"]);
    }

    #[test]
    fn copy_creates_new_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("a.tif");
        let target = dir.path().join("b.tif");
        std::fs::write(&source, b"data").unwrap();
        copy_atomically(&source, &target).unwrap();
        assert_eq!(std::fs::read(&target).unwrap(), b"data");
        assert_eq!(std::fs::read(&source).unwrap(), b"data");
    }
}
