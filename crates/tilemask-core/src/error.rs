//! Error types for tilemask

use crate::models::TileIndex;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TilemaskError {
    // Tile errors
    #[error("Tile {tile} unavailable: {reason}")]
    FetchUnavailable { tile: TileIndex, reason: String },

    #[error(
        "Degenerate bounding box ({min_lon}, {min_lat}, {max_lon}, {max_lat}): width and height must be positive"
    )]
    DegenerateBoundingBox {
        min_lon: f64,
        min_lat: f64,
        max_lon: f64,
        max_lat: f64,
    },

    #[error("Coordinate ({lat}, {lon}) outside the tiling domain at zoom {zoom}: {reason}")]
    CoordinateDomain {
        lat: f64,
        lon: f64,
        zoom: u8,
        reason: String,
    },

    #[error("Invalid raster size {size}: must be at least 1 pixel")]
    InvalidRasterSize { size: u32 },

    // Locality errors
    #[error("No usable footprints for locality '{locality}': {reason}")]
    EmptyPolygonSource { locality: String, reason: String },

    #[error("Invalid geometry at feature {feature_id}: {reason}")]
    InvalidGeometry {
        feature_id: String,
        reason: String,
    },

    // Configuration errors
    #[error("Missing required configuration: {key}")]
    ConfigMissing { key: String },

    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // Output errors
    #[error("Failed to write {path}: {reason}")]
    Persist { path: PathBuf, reason: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Image codec errors
    #[error("Image error: {0}")]
    Image(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl TilemaskError {
    /// Whether the error only concerns a single tile and the locality can carry on
    pub fn is_tile_local(&self) -> bool {
        matches!(
            self,
            TilemaskError::FetchUnavailable { .. } | TilemaskError::DegenerateBoundingBox { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, TilemaskError>;
