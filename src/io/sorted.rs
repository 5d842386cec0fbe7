//! The sorted output tree: `sorted_denoised_geotiffs/<POL>_<ORB>/` plus
//! `unsorted/` for files that carry no recognizable tag.
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::core::classify::{BandDescriptor, SortBucket, UNSORTED_DIR, route_file};
use crate::error::Result;
use crate::io::writers::copy_atomically;
use crate::types::{OrbitDirection, Polarization};

pub const SORTED_DIR: &str = "sorted_denoised_geotiffs";

/// Create one directory per whitelisted polarization and orbit direction under
/// `sorted_root`, plus the unsorted bucket. Existing directories are kept.
pub fn create_sorted_outputs(sorted_root: &Path, whitelist: &[Polarization]) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for &polarization in whitelist {
        for orbit in OrbitDirection::ALL {
            let bucket = SortBucket::Sorted(BandDescriptor { polarization, orbit });
            dirs.push(sorted_root.join(bucket.dir_name()));
        }
    }
    dirs.push(sorted_root.join(UNSORTED_DIR));
    for dir in &dirs {
        std::fs::create_dir_all(dir)?;
    }
    info!("Prepared {} sort bucket(s) under {:?}", dirs.len(), sorted_root);
    Ok(dirs)
}

/// Copy `file` into its bucket under `sorted_root` and return the new path.
pub fn sort_output(file: &Path, whitelist: &[Polarization], sorted_root: &Path) -> Result<PathBuf> {
    let bucket = route_file(file, whitelist);
    let dir = sorted_root.join(bucket.dir_name());
    std::fs::create_dir_all(&dir)?;
    let name = file.file_name().map(PathBuf::from).unwrap_or_default();
    let target = dir.join(name);
    if bucket == SortBucket::Unsorted {
        warn!("{:?} matches no bucket; copying to {}", file, UNSORTED_DIR);
    }
    copy_atomically(file, &target)?;
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tree_has_a_bucket_per_polarization_and_orbit() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join(SORTED_DIR);
        let dirs = create_sorted_outputs(&root, &[Polarization::Vv, Polarization::Vh]).unwrap();
        assert_eq!(dirs.len(), 5);
        for name in ["VV_ASC", "VV_DSC", "VH_ASC", "VH_DSC", "unsorted"] {
            assert!(root.join(name).is_dir(), "{} missing", name);
        }
        // idempotent
        create_sorted_outputs(&root, &[Polarization::Vv, Polarization::Vh]).unwrap();
    }

    #[test]
    fn files_are_copied_into_buckets() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join(SORTED_DIR);
        let whitelist = [Polarization::Vv, Polarization::Vh];
        let tagged = dir.path().join("scene_VH_DSC_band.tif");
        let untagged = dir.path().join("scene.tif");
        std::fs::write(&tagged, b"a").unwrap();
        std::fs::write(&untagged, b"b").unwrap();

        let out = sort_output(&tagged, &whitelist, &root).unwrap();
        assert_eq!(out, root.join("VH_DSC").join("scene_VH_DSC_band.tif"));
        assert!(tagged.exists());

        let out = sort_output(&untagged, &whitelist, &root).unwrap();
        assert_eq!(out, root.join("unsorted").join("scene.tif"));
    }
}
