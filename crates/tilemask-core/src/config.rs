use crate::error::{Result, TilemaskError};
use crate::models::{FillRule, Locality, ValidityMode, MAX_WINDOW, MAX_ZOOM};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// GSI seamless aerial photo tiles, 256x256 JPEG
pub const DEFAULT_TILE_URL: &str = "https://cyberjapandata.gsi.go.jp/xyz/seamlessphoto/{z}/{x}/{y}.jpg";

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Loaded from environment variable
    Environment,
    /// Provided via CLI argument
    Cli,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Cli => 3,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Layered configuration for a dataset run
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub zoom: ConfigValue<u8>,
    pub patch_size: ConfigValue<u32>,
    pub window: ConfigValue<u32>,
    pub output_dir: ConfigValue<PathBuf>,
    pub polygons_dir: ConfigValue<PathBuf>,
    pub tile_url: ConfigValue<String>,
    pub fill_rule: ConfigValue<FillRule>,
    pub geometry_validity: ConfigValue<ValidityMode>,
    pub timeout_secs: ConfigValue<u64>,
    pub retries: ConfigValue<u32>,
    pub localities: ConfigValue<BTreeMap<String, String>>,
}

impl LayeredConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        let localities = [
            ("kyoto", "Kyoto, Japan"),
            ("osaka", "Osaka, Japan"),
            ("sapporo", "Sapporo, Japan"),
            ("fukuoka", "Fukuoka, Japan"),
        ]
        .into_iter()
        .map(|(tag, name)| (tag.to_string(), name.to_string()))
        .collect();

        Self {
            zoom: ConfigValue::new(18, ConfigSource::Default),
            patch_size: ConfigValue::new(512, ConfigSource::Default),
            window: ConfigValue::new(3, ConfigSource::Default),
            output_dir: ConfigValue::new(PathBuf::from("data_osm/train"), ConfigSource::Default),
            polygons_dir: ConfigValue::new(PathBuf::from("footprints"), ConfigSource::Default),
            tile_url: ConfigValue::new(DEFAULT_TILE_URL.to_string(), ConfigSource::Default),
            fill_rule: ConfigValue::new(FillRule::ExteriorOnly, ConfigSource::Default),
            geometry_validity: ConfigValue::new(ValidityMode::Lenient, ConfigSource::Default),
            timeout_secs: ConfigValue::new(10, ConfigSource::Default),
            retries: ConfigValue::new(0, ConfigSource::Default),
            localities: ConfigValue::new(localities, ConfigSource::Default),
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| TilemaskError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to read config file: {}", e),
            })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| TilemaskError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        if let Some(zoom) = file_config.zoom {
            self.zoom.update(zoom, ConfigSource::File);
        }
        if let Some(patch_size) = file_config.patch_size {
            self.patch_size.update(patch_size, ConfigSource::File);
        }
        if let Some(window) = file_config.window {
            self.window.update(window, ConfigSource::File);
        }
        if let Some(output_dir) = file_config.output_dir {
            self.output_dir.update(output_dir, ConfigSource::File);
        }
        if let Some(polygons_dir) = file_config.polygons_dir {
            self.polygons_dir.update(polygons_dir, ConfigSource::File);
        }
        if let Some(tile_url) = file_config.tile_url {
            self.tile_url.update(tile_url, ConfigSource::File);
        }
        if let Some(fill_rule) = file_config.fill_rule {
            self.fill_rule.update(fill_rule, ConfigSource::File);
        }
        if let Some(geometry_validity) = file_config.geometry_validity {
            self.geometry_validity.update(geometry_validity, ConfigSource::File);
        }
        if let Some(timeout_secs) = file_config.timeout_secs {
            self.timeout_secs.update(timeout_secs, ConfigSource::File);
        }
        if let Some(retries) = file_config.retries {
            self.retries.update(retries, ConfigSource::File);
        }
        if let Some(localities) = file_config.localities {
            self.localities.update(localities, ConfigSource::File);
        }

        Ok(self)
    }

    /// Load configuration from environment variables
    pub fn load_from_env(mut self) -> Self {
        // TILEMASK_ZOOM
        if let Ok(zoom_str) = env::var("TILEMASK_ZOOM") {
            match zoom_str.parse::<u8>() {
                Ok(zoom) => self.zoom.update(zoom, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid TILEMASK_ZOOM value '{}': expected integer zoom level",
                    zoom_str
                ),
            }
        }

        // TILEMASK_PATCH_SIZE
        if let Ok(size_str) = env::var("TILEMASK_PATCH_SIZE") {
            match size_str.parse::<u32>() {
                Ok(size) => self.patch_size.update(size, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid TILEMASK_PATCH_SIZE value '{}': expected pixel count",
                    size_str
                ),
            }
        }

        // TILEMASK_WINDOW
        if let Ok(window_str) = env::var("TILEMASK_WINDOW") {
            match window_str.parse::<u32>() {
                Ok(window) => self.window.update(window, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid TILEMASK_WINDOW value '{}': expected odd integer",
                    window_str
                ),
            }
        }

        // TILEMASK_OUTPUT_DIR
        if let Ok(output_dir) = env::var("TILEMASK_OUTPUT_DIR") {
            self.output_dir.update(PathBuf::from(output_dir), ConfigSource::Environment);
        }

        // TILEMASK_TILE_URL
        if let Ok(tile_url) = env::var("TILEMASK_TILE_URL") {
            self.tile_url.update(tile_url, ConfigSource::Environment);
        }

        // TILEMASK_FILL_RULE
        if let Ok(rule_str) = env::var("TILEMASK_FILL_RULE") {
            match parse_fill_rule(&rule_str) {
                Ok(rule) => self.fill_rule.update(rule, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid TILEMASK_FILL_RULE value '{}': expected exterior-only or even-odd",
                    rule_str
                ),
            }
        }

        self
    }

    /// Update configuration from CLI arguments
    pub fn update_from_cli(&mut self, overrides: CliConfigOverrides) {
        if let Some(zoom) = overrides.zoom {
            self.zoom.update(zoom, ConfigSource::Cli);
        }
        if let Some(patch_size) = overrides.patch_size {
            self.patch_size.update(patch_size, ConfigSource::Cli);
        }
        if let Some(window) = overrides.window {
            self.window.update(window, ConfigSource::Cli);
        }
        if let Some(output_dir) = overrides.output_dir {
            self.output_dir.update(output_dir, ConfigSource::Cli);
        }
        if let Some(polygons_dir) = overrides.polygons_dir {
            self.polygons_dir.update(polygons_dir, ConfigSource::Cli);
        }
        if let Some(fill_rule) = overrides.fill_rule {
            self.fill_rule.update(fill_rule, ConfigSource::Cli);
        }
    }

    /// Reject combinations the dataset builder cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.zoom.value > MAX_ZOOM {
            return Err(TilemaskError::ConfigInvalid {
                key: "zoom".to_string(),
                reason: format!("{} exceeds the maximum zoom {}", self.zoom.value, MAX_ZOOM),
            });
        }

        if self.patch_size.value == 0 {
            return Err(TilemaskError::ConfigInvalid {
                key: "patch_size".to_string(),
                reason: "patch size must be at least 1 pixel".to_string(),
            });
        }

        if self.window.value % 2 == 0 {
            return Err(TilemaskError::ConfigInvalid {
                key: "window".to_string(),
                reason: format!("window must be odd so it has a center tile, got {}", self.window.value),
            });
        }

        if self.window.value > MAX_WINDOW {
            return Err(TilemaskError::ConfigInvalid {
                key: "window".to_string(),
                reason: format!("{} exceeds the maximum window {}", self.window.value, MAX_WINDOW),
            });
        }

        for placeholder in ["{z}", "{x}", "{y}"] {
            if !self.tile_url.value.contains(placeholder) {
                return Err(TilemaskError::ConfigInvalid {
                    key: "tile_url".to_string(),
                    reason: format!("template is missing the {} placeholder", placeholder),
                });
            }
        }

        if self.localities.value.is_empty() {
            return Err(TilemaskError::ConfigMissing { key: "localities".to_string() });
        }

        Ok(())
    }

    /// Configured localities, ordered by tag
    pub fn localities(&self) -> Vec<Locality> {
        self.localities
            .value
            .iter()
            .map(|(tag, name)| Locality::new(tag.clone(), name.clone()))
            .collect()
    }

    /// Get all configuration values as a map for inspection
    pub fn to_inspection_map(&self) -> HashMap<String, (String, ConfigSource)> {
        let mut map = HashMap::new();

        map.insert("zoom".to_string(), (self.zoom.value.to_string(), self.zoom.source));
        map.insert(
            "patch_size".to_string(),
            (format!("{}px", self.patch_size.value), self.patch_size.source),
        );
        map.insert(
            "window".to_string(),
            (format!("{0}x{0}", self.window.value), self.window.source),
        );
        map.insert(
            "output_dir".to_string(),
            (self.output_dir.value.display().to_string(), self.output_dir.source),
        );
        map.insert(
            "polygons_dir".to_string(),
            (self.polygons_dir.value.display().to_string(), self.polygons_dir.source),
        );
        map.insert("tile_url".to_string(), (self.tile_url.value.clone(), self.tile_url.source));
        map.insert(
            "fill_rule".to_string(),
            (format!("{:?}", self.fill_rule.value), self.fill_rule.source),
        );
        map.insert(
            "geometry_validity".to_string(),
            (format!("{:?}", self.geometry_validity.value), self.geometry_validity.source),
        );
        map.insert(
            "timeout_secs".to_string(),
            (self.timeout_secs.value.to_string(), self.timeout_secs.source),
        );
        map.insert("retries".to_string(), (self.retries.value.to_string(), self.retries.source));
        map.insert(
            "localities".to_string(),
            (
                self.localities.value.keys().cloned().collect::<Vec<_>>().join(", "),
                self.localities.source,
            ),
        );

        map
    }
}

/// Configuration loaded from TOML file
#[derive(Debug, Deserialize, Serialize)]
struct FileConfig {
    zoom: Option<u8>,
    patch_size: Option<u32>,
    window: Option<u32>,
    output_dir: Option<PathBuf>,
    polygons_dir: Option<PathBuf>,
    tile_url: Option<String>,
    fill_rule: Option<FillRule>,
    geometry_validity: Option<ValidityMode>,
    timeout_secs: Option<u64>,
    retries: Option<u32>,
    localities: Option<BTreeMap<String, String>>,
}

/// CLI configuration overrides
#[derive(Debug, Default)]
pub struct CliConfigOverrides {
    pub zoom: Option<u8>,
    pub patch_size: Option<u32>,
    pub window: Option<u32>,
    pub output_dir: Option<PathBuf>,
    pub polygons_dir: Option<PathBuf>,
    pub fill_rule: Option<FillRule>,
}

/// Parse fill rule from string
pub fn parse_fill_rule(s: &str) -> Result<FillRule> {
    match s.to_lowercase().replace('_', "-").as_str() {
        "exterior-only" | "exterior" | "solid" => Ok(FillRule::ExteriorOnly),
        "even-odd" | "evenodd" => Ok(FillRule::EvenOdd),
        _ => Err(TilemaskError::ConfigInvalid {
            key: "fill_rule".to_string(),
            reason: format!("Invalid fill rule: {}. Use exterior-only or even-odd", s),
        }),
    }
}

/// Parse validity mode from string
pub fn parse_validity_mode(s: &str) -> Result<ValidityMode> {
    match s.to_lowercase().as_str() {
        "strict" => Ok(ValidityMode::Strict),
        "lenient" => Ok(ValidityMode::Lenient),
        _ => Err(TilemaskError::ConfigInvalid {
            key: "geometry_validity".to_string(),
            reason: format!("Invalid validity mode: {}. Use strict or lenient", s),
        }),
    }
}
