pub mod atomic;
pub mod tiff;

pub use atomic::{
    copy_atomically, replace_atomically, write_raster_atomically,
    write_raster_atomically_with_options,
};
pub use tiff::{COMPRESSED_TILED, write_geotiff, write_geotiff_with_options};
