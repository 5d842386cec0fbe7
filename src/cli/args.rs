use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use floodprep::Polarization;

#[derive(Parser)]
#[command(
    name = "floodprep",
    version,
    about = "Prepare SAR raster tiles for flood-mapping denoising"
)]
pub struct CliArgs {
    /// JSON file with pipeline parameters; flags below override it
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging (RUST_LOG is honoured otherwise)
    #[arg(long, global = true, default_value_t = false)]
    pub log: bool,

    /// Number of files processed in parallel
    #[arg(short, long, global = true)]
    pub jobs: Option<usize>,

    /// Target projected CRS (e.g., EPSG:25832)
    #[arg(long, global = true)]
    pub target_crs: Option<String>,

    /// Root directory for derived artifacts (reprojected cutline, sorted tree)
    #[arg(long, global = true)]
    pub output_dir: Option<PathBuf>,

    /// Accepted polarizations, comma separated
    #[arg(long, global = true, value_enum, value_delimiter = ',', ignore_case = true)]
    pub polarizations: Option<Vec<Polarization>>,

    /// Tile size in pixels; clipped rasters are cropped to multiples of it
    #[arg(long, global = true)]
    pub tile_size: Option<usize>,

    /// Extent pad added to the cutline's max-X/max-Y, in target CRS units
    #[arg(long, global = true)]
    pub clip_margin: Option<f64>,

    /// Nodata value written outside the cutline
    #[arg(long, global = true, allow_negative_numbers = true)]
    pub nodata: Option<f64>,

    #[command(subcommand)]
    pub command: Command,
}

/// Raster files or directories of `*.tif` / `*.tiff` files
#[derive(Args, Debug, Clone)]
pub struct Inputs {
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Reproject rasters into the target CRS
    Reproject {
        #[command(flatten)]
        inputs: Inputs,
        /// Write results here instead of replacing the inputs
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    /// Clip rasters to a cutline and crop them to the tile grid (in place)
    Clip {
        #[command(flatten)]
        inputs: Inputs,
        /// Polygon layer (shapefile, GeoJSON, GeoPackage, ...)
        #[arg(long)]
        cutline: PathBuf,
    },
    /// Align rasters of one scene onto a common reference grid (in place)
    Align {
        #[command(flatten)]
        inputs: Inputs,
        /// Reference raster; defaults to the configured strategy
        #[arg(long)]
        reference: Option<PathBuf>,
    },
    /// Convert dB rasters to the linear scale (in place)
    ToLinear {
        #[command(flatten)]
        inputs: Inputs,
    },
    /// Convert linear rasters back to dB (in place)
    ToDb {
        #[command(flatten)]
        inputs: Inputs,
    },
    /// Extract whitelisted polarization bands from multi-subdataset products
    Extract {
        /// Product files (e.g., NetCDF exports)
        #[arg(required = true)]
        products: Vec<PathBuf>,
        /// Directory for the extracted `<stem>_<POL>_<ORB>_band.tif` files
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    /// Copy rasters into the sorted `<POL>_<ORB>` output tree
    Sort {
        #[command(flatten)]
        inputs: Inputs,
    },
    /// Check that auxiliary statistics cover exactly the input scenes
    CheckAux {
        #[command(flatten)]
        inputs: Inputs,
        /// JSON object keyed `<scene>_<POL>`
        #[arg(long)]
        aux: PathBuf,
    },
    /// Reproject, align, clip and tile, then convert to linear
    Prepare {
        #[command(flatten)]
        inputs: Inputs,
        #[arg(long)]
        cutline: PathBuf,
    },
    /// Convert denoised rasters back to dB and sort them
    Finish {
        #[command(flatten)]
        inputs: Inputs,
    },
}
