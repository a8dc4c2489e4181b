//! Tilemask Geo - Tile math, footprint clipping, and mask rasterization
//!
//! This crate aligns geographic footprints with slippy-map tiles: it maps
//! coordinates to tile indices and back, selects the footprints that touch a
//! tile, and burns them into a binary mask with the same pixel grid as the
//! tile image.

pub mod models;
pub mod raster;
pub mod spatial;
pub mod tiles;
pub mod validation;

pub use raster::{rasterize, rasterize_parts, rasterize_with};
pub use spatial::{clip, FootprintIndex};
pub use tiles::{point_to_tile, tile_bounds, tile_to_point, TileNeighborhood};
