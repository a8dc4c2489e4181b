//! Tilemask Dataset - Training pair generation
//!
//! This crate implements the dataset build use case: for every locality it
//! walks the tile neighborhood around the footprint centroid, pairs each
//! fetched tile with its rasterized footprint mask and hands the pair to a
//! sink.

pub mod builder;
pub mod manifest;
pub mod sink;

pub use builder::{
    BuildConfig, BuildPhase, BuildProgress, DatasetBuilder, LocalityPlan, PlannedTile, RunReport,
};
pub use manifest::RunManifest;
pub use sink::{DirectorySink, MemorySink};
