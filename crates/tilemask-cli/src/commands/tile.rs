use crate::cli::TileArgs;
use crate::config_loader::load_config_with_overrides;
use crate::errors;
use crate::output::OutputWriter;
use crate::output_types::TileOutput;
use anyhow::Result;
use std::path::Path;
use tilemask_core::config::CliConfigOverrides;
use tilemask_core::models::GeoPoint;
use tilemask_geo::{point_to_tile, tile_bounds};
use tilemask_sources::expand_url;

pub fn execute(args: TileArgs, output: &OutputWriter, config_path: Option<&Path>) -> Result<()> {
    let overrides = CliConfigOverrides { zoom: args.zoom, ..Default::default() };
    let config = load_config_with_overrides(config_path, overrides)?;

    let tile = point_to_tile(GeoPoint::new(args.lat, args.lon), config.zoom.value)
        .map_err(|e| errors::coordinate_out_of_range(args.lat, args.lon, &e))?;
    let bounds = tile_bounds(tile);

    let url = expand_url(&config.tile_url.value, tile);

    if output.is_json() {
        output.result(TileOutput { x: tile.x, y: tile.y, zoom: tile.zoom, bounds, url })?;
    } else {
        output.kv("Tile", tile);
        output.kv("West", format!("{:.7}", bounds.min_lon));
        output.kv("South", format!("{:.7}", bounds.min_lat));
        output.kv("East", format!("{:.7}", bounds.max_lon));
        output.kv("North", format!("{:.7}", bounds.max_lat));
        output.kv("URL", url);
    }

    Ok(())
}
