use std::time::Duration;
use tilemask_core::config::{LayeredConfig, DEFAULT_TILE_URL};
use tilemask_core::error::{Result, TilemaskError};
use tilemask_core::models::{TileImage, TileIndex};
use tilemask_core::ports::TileFetcher;

/// Settings for [`HttpTileFetcher`]
#[derive(Debug, Clone)]
pub struct HttpFetcherOptions {
    /// URL with `{z}`, `{x}` and `{y}` placeholders
    pub url_template: String,
    pub timeout: Duration,
    /// Extra attempts after the first failed one
    pub retries: u32,
    pub user_agent: String,
}

impl Default for HttpFetcherOptions {
    fn default() -> Self {
        Self {
            url_template: DEFAULT_TILE_URL.to_string(),
            timeout: Duration::from_secs(10),
            retries: 0,
            user_agent: format!("tilemask/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpFetcherOptions {
    /// Options taken from a resolved configuration
    pub fn from_config(config: &LayeredConfig) -> Self {
        Self {
            url_template: config.tile_url.value.clone(),
            timeout: Duration::from_secs(config.timeout_secs.value),
            retries: config.retries.value,
            ..Self::default()
        }
    }
}

/// Fetches XYZ raster tiles over HTTP
///
/// The fetcher owns a single-threaded tokio runtime and blocks on each
/// request, so callers stay synchronous. It must not be used from inside
/// another tokio runtime.
pub struct HttpTileFetcher {
    options: HttpFetcherOptions,
    client: reqwest::Client,
    runtime: tokio::runtime::Runtime,
}

impl HttpTileFetcher {
    /// Create a new fetcher
    pub fn new(options: HttpFetcherOptions) -> Result<Self> {
        for placeholder in ["{z}", "{x}", "{y}"] {
            if !options.url_template.contains(placeholder) {
                return Err(TilemaskError::ConfigInvalid {
                    key: "tile_url".to_string(),
                    reason: format!("template is missing the {} placeholder", placeholder),
                });
            }
        }

        let client = reqwest::Client::builder()
            .timeout(options.timeout)
            .user_agent(options.user_agent.clone())
            .build()
            .map_err(|e| TilemaskError::ConfigInvalid {
                key: "tile_url".to_string(),
                reason: format!("Failed to build HTTP client: {}", e),
            })?;

        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;

        Ok(Self { options, client, runtime })
    }

    /// URL of `tile` on the configured server
    pub fn tile_url(&self, tile: TileIndex) -> String {
        expand_url(&self.options.url_template, tile)
    }

    pub fn options(&self) -> &HttpFetcherOptions {
        &self.options
    }

    async fn fetch_once(&self, url: &str) -> std::result::Result<TileImage, String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| format!("request failed: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("HTTP {}", status));
        }

        let body = response.bytes().await.map_err(|e| format!("failed to read body: {}", e))?;

        decode_tile(&body)
    }
}

impl TileFetcher for HttpTileFetcher {
    fn fetch_tile(&self, tile: TileIndex) -> Result<TileImage> {
        let url = self.tile_url(tile);

        self.runtime.block_on(async {
            let mut reason = String::new();

            for attempt in 0..=self.options.retries {
                if attempt > 0 {
                    tracing::debug!("Retrying {} (attempt {})", url, attempt + 1);
                    tokio::time::sleep(Duration::from_millis(250 * u64::from(attempt))).await;
                }

                match self.fetch_once(&url).await {
                    Ok(image) => return Ok(image),
                    Err(e) => reason = e,
                }
            }

            Err(TilemaskError::FetchUnavailable { tile, reason })
        })
    }
}

/// Substitute `{z}`, `{x}` and `{y}` in a tile URL template
pub fn expand_url(template: &str, tile: TileIndex) -> String {
    template
        .replace("{z}", &tile.zoom.to_string())
        .replace("{x}", &tile.x.to_string())
        .replace("{y}", &tile.y.to_string())
}

/// Decode an encoded tile body into RGB8 pixels
pub fn decode_tile(bytes: &[u8]) -> std::result::Result<TileImage, String> {
    let decoded = image::load_from_memory(bytes).map_err(|e| format!("undecodable image: {}", e))?;
    let rgb = decoded.to_rgb8();
    let (width, height) = rgb.dimensions();

    TileImage::from_rgb(width, height, rgb.into_raw())
        .ok_or_else(|| "decoded buffer does not match its dimensions".to_string())
}
