use crate::models::geometry::GeoBoundingBox;
use crate::models::raster::{RasterMask, TileImage};
use crate::models::tile::TileIndex;
use serde::{Deserialize, Serialize};

/// A place to build training pairs for, e.g. `kyoto` -> "Kyoto, Japan"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locality {
    pub tag: String,
    pub name: String,
}

impl Locality {
    pub fn new(tag: impl Into<String>, name: impl Into<String>) -> Self {
        Self { tag: tag.into(), name: name.into() }
    }
}

/// File name shared by an image and its mask
pub fn pair_file_name(tag: &str, index: usize) -> String {
    format!("{}_{:03}.png", tag, index)
}

/// One image/mask training pair, ready to persist
#[derive(Debug, Clone)]
pub struct TilePair {
    pub tile: TileIndex,
    pub bounds: GeoBoundingBox,
    pub image: TileImage,
    pub mask: RasterMask,
    pub file_name: String,
}

/// Manifest entry for a persisted pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairRecord {
    pub file_name: String,
    pub locality: String,
    pub tile: TileIndex,
    pub bounds: GeoBoundingBox,
    pub occupied_ratio: f64,
}

impl PairRecord {
    pub fn from_pair(locality: &str, pair: &TilePair) -> Self {
        Self {
            file_name: pair.file_name.clone(),
            locality: locality.to_string(),
            tile: pair.tile,
            bounds: pair.bounds,
            occupied_ratio: pair.mask.occupied_ratio(),
        }
    }
}

/// A tile that produced no pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedTile {
    pub tile: TileIndex,
    pub reason: String,
}

/// Outcome of building one locality
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalitySummary {
    pub locality: String,
    pub center: Option<TileIndex>,
    pub footprints: usize,
    pub pairs: Vec<PairRecord>,
    pub skipped: Vec<SkippedTile>,
    /// Set when the whole locality was aborted
    pub error: Option<String>,
}

impl LocalitySummary {
    pub fn new(locality: impl Into<String>) -> Self {
        Self {
            locality: locality.into(),
            center: None,
            footprints: 0,
            pairs: Vec::new(),
            skipped: Vec::new(),
            error: None,
        }
    }

    pub fn failed(locality: impl Into<String>, error: impl Into<String>) -> Self {
        let mut summary = Self::new(locality);
        summary.error = Some(error.into());
        summary
    }

    pub fn produced(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}
