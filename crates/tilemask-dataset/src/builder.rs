use image::imageops::{self, FilterType};
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tilemask_core::config::LayeredConfig;
use tilemask_core::error::{Result, TilemaskError};
use tilemask_core::models::{
    pair_file_name, FillRule, GeoBoundingBox, Locality, LocalitySummary, PairRecord, SkippedTile,
    TileImage, TileIndex, TilePair,
};
use tilemask_core::ports::{PairSink, PolygonSource, TileFetcher};
use tilemask_geo::{point_to_tile, rasterize_parts, tile_bounds, FootprintIndex, TileNeighborhood};

/// Parameters of a dataset build
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BuildConfig {
    pub zoom: u8,
    /// Edge length in pixels of both the image and the mask
    pub patch_size: u32,
    /// Odd edge length of the tile neighborhood
    pub window: u32,
    pub fill_rule: FillRule,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self { zoom: 18, patch_size: 512, window: 3, fill_rule: FillRule::ExteriorOnly }
    }
}

impl BuildConfig {
    pub fn from_config(config: &LayeredConfig) -> Self {
        Self {
            zoom: config.zoom.value,
            patch_size: config.patch_size.value,
            window: config.window.value,
            fill_rule: config.fill_rule.value,
        }
    }
}

/// Progress information for a dataset build
#[derive(Debug, Clone)]
pub struct BuildProgress {
    pub phase: BuildPhase,
    pub locality: String,
    pub current: usize,
    pub total: usize,
    pub message: String,
}

/// Current phase of a locality build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildPhase {
    LoadingFootprints,
    ProcessingTiles,
    Finished,
}

/// A tile the build would visit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedTile {
    pub tile: TileIndex,
    pub bounds: GeoBoundingBox,
}

/// What a locality build would do, without fetching anything
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalityPlan {
    pub locality: String,
    pub center: TileIndex,
    pub footprints: usize,
    pub tiles: Vec<PlannedTile>,
}

/// Outcome of a multi-locality run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub summaries: Vec<LocalitySummary>,
}

impl RunReport {
    /// Pairs written across all localities
    pub fn total_pairs(&self) -> usize {
        self.summaries.iter().map(LocalitySummary::produced).sum()
    }

    pub fn total_skipped(&self) -> usize {
        self.summaries.iter().map(|s| s.skipped.len()).sum()
    }

    pub fn failed_localities(&self) -> impl Iterator<Item = &LocalitySummary> {
        self.summaries.iter().filter(|s| s.is_failed())
    }

    pub fn pairs(&self) -> impl Iterator<Item = &PairRecord> {
        self.summaries.iter().flat_map(|s| s.pairs.iter())
    }
}

/// Builds image/mask training pairs for localities
///
/// Collaborators are injected, so the builder holds no global state and runs
/// against fakes in tests.
pub struct DatasetBuilder {
    config: BuildConfig,
    fetcher: Arc<dyn TileFetcher>,
    polygons: Arc<dyn PolygonSource>,
    sink: Arc<dyn PairSink>,
}

impl DatasetBuilder {
    /// Create a new dataset builder
    pub fn new(
        config: BuildConfig,
        fetcher: Arc<dyn TileFetcher>,
        polygons: Arc<dyn PolygonSource>,
        sink: Arc<dyn PairSink>,
    ) -> Self {
        Self { config, fetcher, polygons, sink }
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Resolve the center tile and neighborhood of a locality
    pub fn plan_locality(&self, locality: &Locality) -> Result<LocalityPlan> {
        let geometry = self.polygons.polygons_for(locality)?;
        if geometry.footprints.is_empty() {
            return Err(empty_source(locality));
        }

        let center = point_to_tile(geometry.centroid, self.config.zoom)?;
        let tiles = TileNeighborhood::new(center, self.config.window)?
            .map(|tile| PlannedTile { tile, bounds: tile_bounds(tile) })
            .collect();

        Ok(LocalityPlan {
            locality: locality.tag.clone(),
            center,
            footprints: geometry.footprints.len(),
            tiles,
        })
    }

    /// Build every pair of one locality
    ///
    /// Tile-level failures (unavailable tile, degenerate bounds) are recorded
    /// as skipped tiles and do not consume a file index. Any other failure
    /// aborts the locality.
    pub fn build_locality<F>(&self, locality: &Locality, progress: &mut F) -> Result<LocalitySummary>
    where
        F: FnMut(BuildProgress),
    {
        progress(BuildProgress {
            phase: BuildPhase::LoadingFootprints,
            locality: locality.tag.clone(),
            current: 0,
            total: 1,
            message: format!("Loading footprints for {}", locality.name),
        });

        let geometry = self.polygons.polygons_for(locality)?;
        if geometry.footprints.is_empty() {
            return Err(empty_source(locality));
        }

        let center = point_to_tile(geometry.centroid, self.config.zoom)?;
        let index = FootprintIndex::build(&geometry.footprints);
        let neighborhood = TileNeighborhood::new(center, self.config.window)?;
        let total = neighborhood.len();

        tracing::info!(
            "Building {} around tile {} ({} footprints, {} tiles)",
            locality.tag,
            center,
            geometry.footprints.len(),
            total
        );

        let mut summary = LocalitySummary::new(locality.tag.clone());
        summary.center = Some(center);
        summary.footprints = geometry.footprints.len();

        for (position, tile) in neighborhood.enumerate() {
            progress(BuildProgress {
                phase: BuildPhase::ProcessingTiles,
                locality: locality.tag.clone(),
                current: position,
                total,
                message: format!("Tile {}", tile),
            });

            let file_name = pair_file_name(&locality.tag, summary.produced());
            match self.build_pair(tile, &index, file_name) {
                Ok(pair) => {
                    self.sink.persist(&pair)?;
                    tracing::debug!("Saved {} for tile {}", pair.file_name, tile);
                    summary.pairs.push(PairRecord::from_pair(&locality.tag, &pair));
                }
                Err(e) if e.is_tile_local() => {
                    tracing::warn!("Skipping tile {} of {}: {}", tile, locality.tag, e);
                    summary.skipped.push(SkippedTile { tile, reason: e.to_string() });
                }
                Err(e) => return Err(e),
            }
        }

        progress(BuildProgress {
            phase: BuildPhase::Finished,
            locality: locality.tag.clone(),
            current: total,
            total,
            message: format!("{} pairs, {} skipped", summary.produced(), summary.skipped.len()),
        });
        tracing::info!(
            "Finished {}: {} pairs, {} skipped",
            locality.tag,
            summary.produced(),
            summary.skipped.len()
        );

        Ok(summary)
    }

    /// Build all localities in order
    ///
    /// A failing locality is recorded in the report and the run continues.
    /// Only a sink that cannot be prepared stops the run.
    pub fn build_all<F>(&self, localities: &[Locality], mut progress: F) -> Result<RunReport>
    where
        F: FnMut(BuildProgress),
    {
        self.sink.prepare()?;

        let mut report = RunReport::default();
        for locality in localities {
            match self.build_locality(locality, &mut progress) {
                Ok(summary) => report.summaries.push(summary),
                Err(e) => {
                    tracing::error!("Locality {} failed: {}", locality.tag, e);
                    report.summaries.push(LocalitySummary::failed(locality.tag.clone(), e.to_string()));
                }
            }
        }

        Ok(report)
    }

    fn build_pair(&self, tile: TileIndex, index: &FootprintIndex, file_name: String) -> Result<TilePair> {
        let image = self.fetcher.fetch_tile(tile).map_err(|e| unavailable(tile, e))?;
        let image = fit_to_patch(tile, image, self.config.patch_size)?;

        let bounds = tile_bounds(tile);
        bounds.ensure_non_degenerate()?;

        let parts = index.query(&bounds);
        let mask = rasterize_parts(parts, &bounds, self.config.patch_size, self.config.fill_rule)?;

        Ok(TilePair { tile, bounds, image, mask, file_name })
    }
}

/// Any fetcher failure only costs the tile, whatever error the fetcher chose
fn unavailable(tile: TileIndex, error: TilemaskError) -> TilemaskError {
    match error {
        TilemaskError::FetchUnavailable { .. } => error,
        other => TilemaskError::FetchUnavailable { tile, reason: other.to_string() },
    }
}

fn empty_source(locality: &Locality) -> TilemaskError {
    TilemaskError::EmptyPolygonSource {
        locality: locality.tag.clone(),
        reason: "polygon source returned no footprints".to_string(),
    }
}

/// Resample a square tile to `size x size`; other shapes count as unavailable
fn fit_to_patch(tile: TileIndex, image: TileImage, size: u32) -> Result<TileImage> {
    let unavailable = |reason: String| TilemaskError::FetchUnavailable { tile, reason };

    if !image.is_square() {
        return Err(unavailable(format!(
            "tile is {}x{}, expected a square image",
            image.width(),
            image.height()
        )));
    }
    if image.width() == size {
        return Ok(image);
    }

    let (width, height) = (image.width(), image.height());
    let source = RgbImage::from_raw(width, height, image.into_pixels())
        .ok_or_else(|| unavailable("pixel buffer does not match tile size".to_string()))?;
    let resized = imageops::resize(&source, size, size, FilterType::Triangle);

    TileImage::from_rgb(size, size, resized.into_raw())
        .ok_or_else(|| unavailable("resized buffer does not match patch size".to_string()))
}
