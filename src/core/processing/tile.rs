use ndarray::s;
use tracing::info;

use crate::core::raster::RasterDataset;
use crate::error::{Error, Result};

pub const DEFAULT_TILE_SIZE: usize = 256;

/// Largest `(width, height)` not exceeding the input that is a whole number of tiles.
pub fn tile_grid_window(width: usize, height: usize, tile_size: usize) -> Result<(usize, usize)> {
    if tile_size == 0 {
        return Err(Error::InvalidArgument {
            arg: "tile_size",
            value: "0".to_string(),
        });
    }
    let new_width = (width / tile_size) * tile_size;
    let new_height = (height / tile_size) * tile_size;
    if new_width == 0 || new_height == 0 {
        return Err(Error::InsufficientExtent {
            width,
            height,
            tile_size,
        });
    }
    Ok((new_width, new_height))
}

/// Truncate `src` from its top-left corner to a whole number of tiles,
/// dropping the remainder columns on the right and rows at the bottom.
/// Origin and pixel size are unchanged.
pub fn crop_to_tile_grid(src: RasterDataset, tile_size: usize) -> Result<RasterDataset> {
    let (width, height) = (src.width(), src.height());
    let (new_width, new_height) = tile_grid_window(width, height, tile_size)?;
    if (new_width, new_height) == (width, height) {
        return Ok(src);
    }
    info!(
        "Cropping {}x{} -> {}x{} ({} px tiles)",
        width, height, new_width, new_height, tile_size
    );
    let data = src.data.slice(s![.., ..new_height, ..new_width]).to_owned();
    Ok(RasterDataset {
        data,
        geotransform: src.geotransform.window(0, 0),
        ..src
    })
}
