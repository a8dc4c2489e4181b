//! Configuration loading utilities for CLI commands

use crate::errors;
use anyhow::{Context, Result};
use std::path::Path;
use tilemask_core::config::{CliConfigOverrides, LayeredConfig};

/// Config file picked up from the working directory when `--config` is absent
pub const DEFAULT_CONFIG_FILE: &str = "tilemask.toml";

/// Load defaults, the config file and the environment, in that order
pub fn load_config(config_path: Option<&Path>) -> Result<LayeredConfig> {
    let mut config = LayeredConfig::with_defaults();

    match config_path {
        Some(path) => {
            config = config
                .load_from_file(path)
                .with_context(|| format!("Failed to load configuration file {}", path.display()))?;
        }
        None => {
            let default_path = Path::new(DEFAULT_CONFIG_FILE);
            if default_path.is_file() {
                tracing::debug!("Using {}", default_path.display());
                config = config
                    .load_from_file(default_path)
                    .context("Failed to load configuration file tilemask.toml")?;
            }
        }
    }

    Ok(config.load_from_env())
}

/// Load layered configuration with CLI overrides and validate the result
pub fn load_config_with_overrides(
    config_path: Option<&Path>,
    overrides: CliConfigOverrides,
) -> Result<LayeredConfig> {
    let mut config = load_config(config_path)?;
    config.update_from_cli(overrides);
    config.validate().map_err(|e| errors::invalid_config(&e))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;
    use tilemask_core::config::ConfigSource;

    #[test]
    fn test_explicit_file_and_cli_override() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(&path, "patch_size = 256\nwindow = 5\n").unwrap();

        let overrides = CliConfigOverrides { window: Some(1), ..Default::default() };
        let config = load_config_with_overrides(Some(&path), overrides).unwrap();

        assert_eq!(config.patch_size.value, 256);
        assert_eq!(config.patch_size.source, ConfigSource::File);
        assert_eq!(config.window.value, 1);
        assert_eq!(config.window.source, ConfigSource::Cli);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let result = load_config(Some(&dir.path().join("nope.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_override_fails_validation() {
        let overrides = CliConfigOverrides { window: Some(4), ..Default::default() };
        let err = load_config_with_overrides(None, overrides).unwrap_err();
        assert!(err.downcast_ref::<errors::CliError>().is_some());
    }
}
