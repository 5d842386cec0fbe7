//! I/O layer: the GDAL-backed raster store, cutline vectors, product
//! subdatasets, atomic writers and the sorted output tree.
pub mod gdal;
pub use gdal::{GdalError, GdalMetadata, GdalRasterReader, read_raster};

pub mod sorted;
pub mod subdatasets;
pub mod vector;
pub mod writers;
