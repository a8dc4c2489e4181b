use crate::error::Result;
use crate::models::{Locality, LocalityGeometry, TileImage, TileIndex, TilePair};

/// Port for retrieving raster tiles
pub trait TileFetcher: Send + Sync {
    /// Fetch and decode the image for one tile
    ///
    /// Every failure (transport, timeout, non-success status, undecodable body)
    /// is reported as [`TilemaskError::FetchUnavailable`]. A partially decoded
    /// image is never returned as success. The dataset builder treats any
    /// other error variant the same way: the tile is skipped.
    ///
    /// [`TilemaskError::FetchUnavailable`]: crate::error::TilemaskError::FetchUnavailable
    fn fetch_tile(&self, tile: TileIndex) -> Result<TileImage>;
}

/// Port for building footprint geometry
pub trait PolygonSource: Send + Sync {
    /// Footprints and representative point for a locality
    ///
    /// Unknown localities and empty results surface as
    /// [`TilemaskError::EmptyPolygonSource`].
    ///
    /// [`TilemaskError::EmptyPolygonSource`]: crate::error::TilemaskError::EmptyPolygonSource
    fn polygons_for(&self, locality: &Locality) -> Result<LocalityGeometry>;
}

/// Port for durable storage of image/mask pairs
pub trait PairSink: Send + Sync {
    /// Create whatever layout the sink needs before the first pair arrives
    fn prepare(&self) -> Result<()>;

    /// Store one pair under its file name
    fn persist(&self, pair: &TilePair) -> Result<()>;
}
