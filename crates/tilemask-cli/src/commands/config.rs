use crate::config_loader::load_config;
use crate::output::OutputWriter;
use crate::output_types::{ConfigEntry, ConfigOutput};
use anyhow::Result;
use std::path::Path;

/// Show every configuration value with its source
pub fn execute(output: &OutputWriter, config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;

    let mut values: Vec<ConfigEntry> = config
        .to_inspection_map()
        .into_iter()
        .map(|(key, (value, source))| ConfigEntry {
            key,
            value,
            source: format!("{:?}", source),
        })
        .collect();
    values.sort_by(|a, b| a.key.cmp(&b.key));

    if output.is_json() {
        return output.result(ConfigOutput { values });
    }

    output.section("Configuration Values");
    output.table(values);

    if let Err(e) = config.validate() {
        output.warning(format!("Configuration is not usable for a build: {}", e));
    }

    output.section("Configuration Precedence");
    output.info("CLI arguments > Environment variables > Config file > Defaults");

    Ok(())
}
