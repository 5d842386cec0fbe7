pub mod align;
pub mod clip;
pub mod radiometric;
pub mod reproject;
pub mod tile;
pub mod warp;
