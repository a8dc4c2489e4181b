use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// tilemask - Building footprint segmentation datasets from aerial tiles
#[derive(Parser, Debug)]
#[command(name = "tilemask")]
#[command(about = "Pairs aerial map tiles with rasterized building masks", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Show planned actions without executing them
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Configuration file (defaults to ./tilemask.toml when present)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build image/mask pairs for the configured localities
    ///
    /// Localities are built in alphabetical order of their tags, or in the
    /// order given when --locality is repeated.
    Build(BuildArgs),

    /// Show the tile containing a coordinate
    Tile(TileArgs),

    /// Show the resolved configuration and where each value came from
    Config,
}

#[derive(Parser, Debug)]
pub struct BuildArgs {
    /// Only build these locality tags, in this order (repeatable; defaults
    /// to every configured locality in alphabetical tag order)
    #[arg(long = "locality", value_name = "TAG")]
    pub localities: Vec<String>,

    /// Tile zoom level
    #[arg(long)]
    pub zoom: Option<u8>,

    /// Edge length in pixels of images and masks
    #[arg(long)]
    pub patch_size: Option<u32>,

    /// Odd edge length of the tile neighborhood (3 means 3x3)
    #[arg(long)]
    pub window: Option<u32>,

    /// Output directory receiving image/ and mask/
    #[arg(long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Directory holding one {tag}.geojson footprint file per locality
    #[arg(long, value_name = "DIR")]
    pub polygons: Option<PathBuf>,

    /// How interior rings are filled (exterior-only or even-odd)
    #[arg(long, value_name = "RULE")]
    pub fill_rule: Option<String>,
}

#[derive(Parser, Debug)]
pub struct TileArgs {
    /// Latitude in degrees
    #[arg(long, allow_negative_numbers = true)]
    pub lat: f64,

    /// Longitude in degrees
    #[arg(long, allow_negative_numbers = true)]
    pub lon: f64,

    /// Zoom level (defaults to the configured zoom)
    #[arg(long)]
    pub zoom: Option<u8>,
}
