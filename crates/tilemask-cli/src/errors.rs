use console::style;
use std::fmt;
use std::path::Path;
use tilemask_core::error::TilemaskError;

/// Error with remediation hints, rendered for humans on stderr
pub struct CliError {
    pub message: String,
    pub context: Option<String>,
    pub suggestions: Vec<String>,
    pub help_command: Option<String>,
}

impl CliError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
            suggestions: Vec::new(),
            help_command: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_help(mut self, command: impl Into<String>) -> Self {
        self.help_command = Some(command.into());
        self
    }

    pub fn display(&self) {
        eprintln!("{} {}\n", style("✗").red().bold(), style(&self.message).red().bold());

        if let Some(ref context) = self.context {
            eprintln!("{}", context);
            eprintln!();
        }

        if !self.suggestions.is_empty() {
            eprintln!("{}", style("To fix this:").yellow().bold());
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                eprintln!("  {}. {}", i + 1, suggestion);
            }
            eprintln!();
        }

        if let Some(ref help_cmd) = self.help_command {
            eprintln!("{} {}", style("Need help?").cyan(), style(help_cmd).cyan().bold());
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Debug for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// A `--locality` tag that is not in the configuration
pub fn unknown_locality(tag: &str, known: &[String]) -> CliError {
    CliError::new(format!("Unknown locality '{}'", tag))
        .with_context(format!("Configured localities: {}", known.join(", ")))
        .with_suggestion("Pick one of the configured tags")
        .with_suggestion(format!(
            "Or add it to tilemask.toml:\n  [localities]\n  {} = \"City, Country\"",
            tag
        ))
        .with_help("Run: tilemask config")
}

/// Configuration that failed validation
pub fn invalid_config(error: &TilemaskError) -> CliError {
    CliError::new("Invalid configuration")
        .with_context(error.to_string())
        .with_suggestion("Check the values in tilemask.toml and TILEMASK_* environment variables")
        .with_suggestion("The window must be odd and at most 255, zoom at most 24, and the tile URL must contain {z}, {x} and {y}")
        .with_help("Run: tilemask config")
}

/// Coordinate that has no tile at the requested zoom
pub fn coordinate_out_of_range(lat: f64, lon: f64, error: &TilemaskError) -> CliError {
    CliError::new(format!("No tile for ({}, {})", lat, lon))
        .with_context(error.to_string())
        .with_suggestion("Latitude must lie within about ±85.0511 degrees (Web Mercator)")
        .with_suggestion("Longitude must lie within -180..180 degrees")
        .with_help("Run: tilemask tile --help")
}

/// The output directory could not be prepared
pub fn output_unwritable(dir: &Path, error: &TilemaskError) -> CliError {
    CliError::new("Cannot write the dataset")
        .with_context(format!("Output directory: {}\n\nError: {}", dir.display(), error))
        .with_suggestion("Check that the directory is writable")
        .with_suggestion("Or choose another location with --output")
        .with_help("Run: tilemask build --help")
}

/// Every selected locality failed before producing a pair
pub fn nothing_built(polygons_dir: &Path, tile_url: &str) -> CliError {
    CliError::new("No pairs were produced")
        .with_context(format!(
            "Every selected locality failed.\n\nFootprints: {}\nTiles: {}",
            polygons_dir.display(),
            tile_url
        ))
        .with_suggestion("Make sure a {tag}.geojson file exists for each locality")
        .with_suggestion("Check that the tile server is reachable")
        .with_help("Run: tilemask build --dry-run")
}
