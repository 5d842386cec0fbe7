#![doc = r#"
floodprep: geometric and radiometric preparation of SAR raster tiles for a
flood-mapping denoiser.

The crate reprojects, clips, tile-aligns and radiometrically converts
single-band backscatter rasters, extracts per-polarization bands from
multi-subdataset products, and sorts finished files by polarization and
orbit direction. It powers the `floodprep` CLI and can be embedded in your
own Rust applications.

Every stage that replaces a raster writes to a temporary file next to it and
renames it over the original only after the full transform succeeded, so an
interrupted run never leaves a half-written raster at the canonical path.

Requirements
------------
- GDAL (with PROJ) development headers and runtime available on your system.
- Rust 2024 edition toolchain.

Quick start: prepare one scene
------------------------------
```rust,no_run
use std::path::{Path, PathBuf};
use floodprep::api::{collect_rasters, prepare_scene};
use floodprep::observer::TracingObserver;
use floodprep::PipelineParams;

fn main() -> floodprep::Result<()> {
    let params = PipelineParams {
        output_directory: PathBuf::from("/out"),
        target_crs: "EPSG:25832".to_string(),
        ..Default::default()
    };
    let files = collect_rasters(&[PathBuf::from("/data/scene_2024_01_01")])?;
    let report = prepare_scene(&files, Path::new("/data/aoi.shp"), &params, &TracingObserver)?;

    println!("processed={} errors={}", report.processed(), report.errors());
    for failure in &report.failures {
        eprintln!("{:?}: {} {}", failure.path, failure.kind, failure.message);
    }
    Ok(())
}
```

In-memory processing
--------------------
The algorithms in [`core::processing`] work on [`RasterDataset`] values and
never touch the filesystem:

```rust,no_run
use floodprep::core::processing::{clip::clip_to_cutline, tile::crop_to_tile_grid};
use floodprep::io::{read_raster, vector::read_cutline, writers::write_raster_atomically};
use std::path::Path;

fn main() -> floodprep::Result<()> {
    let raster = read_raster("/data/scene_VH.tif")?;
    let cutline = read_cutline(Path::new("/data/aoi.geojson"))?;
    let clipped = clip_to_cutline(&raster, &cutline, "EPSG:25832", 2560.0, -9999.0)?;
    let tiled = crop_to_tile_grid(clipped, 256)?;
    write_raster_atomically(Path::new("/out/scene_VH.tif"), &tiled)
}
```

Error handling
--------------
All public functions return `floodprep::Result<T>`. `Error::kind()` names the
failure category (`IOError`, `CRSError`, `GeometryError`,
`InsufficientExtentError`, `UnknownOrbitError`, `DomainError`,
`MismatchError`, ...). Batch runners never stop on a failing file; they
collect failures into a [`BatchReport`].

Useful modules
--------------
- [`api`]: per-file stages and batch runners.
- [`core`]: raster model, CRS, cutline geometry and processing algorithms.
- [`io`]: GDAL raster store, cutline vectors, subdatasets, sorted tree, writers.
- [`observer`]: stage progress reporting.
- [`error`]: crate-level `Error` and `Result`.
"#]

// Core modules (public)
pub mod api;
pub mod core;
pub mod error;
pub mod io;
pub mod observer;
pub mod types;

// Curated public API surface
// Types
pub use core::geometry::{Cutline, Extent};
pub use core::params::PipelineParams;
pub use core::raster::{GeoTransform, RasterDataset};
pub use error::{Error, Result};
pub use types::{
    NonPositivePolicy, OrbitDirection, Polarization, RadiometricDirection, ReferenceStrategy,
    SampleType,
};

// Readers
pub use io::gdal::{GdalError, GdalMetadata, GdalRasterReader};

// High-level API re-exports
pub use api::{BatchFailure, BatchReport, collect_rasters, finish_scene, prepare_scene};
