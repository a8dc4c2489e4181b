//! Command implementations

mod build;
mod config;
mod tile;

use crate::cli::{Cli, Commands};
use crate::output::OutputWriter;
use anyhow::Result;

/// Execute a CLI command
pub fn execute(cli: Cli) -> Result<()> {
    let output = OutputWriter::new(cli.json);
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Build(args) => build::execute(args, &output, cli.dry_run, config_path),
        Commands::Tile(args) => tile::execute(args, &output, config_path),
        Commands::Config => config::execute(&output, config_path),
    }
}
