//! Core building blocks: the in-memory raster model, CRS and cutline geometry,
//! the geometric/radiometric processing steps, band classification and
//! pipeline parameters. The `api` module wires these to the GDAL store.
pub mod auxiliary;
pub mod classify;
pub mod crs;
pub mod geometry;
pub mod params;
pub mod processing;
pub mod raster;
