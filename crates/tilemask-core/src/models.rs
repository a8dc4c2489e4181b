pub mod dataset;
pub mod geometry;
pub mod raster;
pub mod tile;

pub use dataset::{pair_file_name, Locality, LocalitySummary, PairRecord, SkippedTile, TilePair};
pub use geometry::{
    FillRule, Footprint, GeoBoundingBox, GeoPoint, LocalityGeometry, PolygonRings, PolygonSet,
    ValidityMode,
};
pub use raster::{RasterMask, TileImage};
pub use tile::{TileIndex, MAX_WINDOW, MAX_ZOOM};
