use crate::builder::{BuildConfig, RunReport};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tilemask_core::error::{Result, TilemaskError};
use tilemask_core::models::{LocalitySummary, PairRecord};

/// File name of the manifest inside the output directory
pub const MANIFEST_FILE: &str = "manifest.json";

/// Record of one dataset run, written next to the image and mask folders
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub generated_at: DateTime<Utc>,
    pub config: BuildConfig,
    pub localities: Vec<LocalitySummary>,
}

impl RunManifest {
    pub fn new(config: BuildConfig, report: &RunReport) -> Self {
        Self { generated_at: Utc::now(), config, localities: report.summaries.clone() }
    }

    /// Every persisted pair, locality by locality
    pub fn pairs(&self) -> impl Iterator<Item = &PairRecord> {
        self.localities.iter().flat_map(|l| l.pairs.iter())
    }

    /// Write `{output_dir}/manifest.json`
    pub fn write(&self, output_dir: &Path) -> Result<PathBuf> {
        let path = output_dir.join(MANIFEST_FILE);
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| TilemaskError::Serialization(format!("Failed to serialize manifest: {}", e)))?;

        fs::write(&path, json).map_err(|e| TilemaskError::Persist {
            path: path.clone(),
            reason: e.to_string(),
        })?;

        tracing::info!("Wrote manifest to {}", path.display());
        Ok(path)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| TilemaskError::Serialization(format!("Failed to parse manifest: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tilemask_core::models::{GeoBoundingBox, SkippedTile, TileIndex};

    fn report() -> RunReport {
        let mut kyoto = LocalitySummary::new("kyoto");
        kyoto.center = Some(TileIndex::new(229_935, 103_824, 18));
        kyoto.pairs.push(PairRecord {
            file_name: "kyoto_000.png".to_string(),
            locality: "kyoto".to_string(),
            tile: TileIndex::new(229_934, 103_823, 18),
            bounds: GeoBoundingBox::new(135.7635, 35.0129, 135.7649, 35.0140),
            occupied_ratio: 0.25,
        });
        kyoto.skipped.push(SkippedTile {
            tile: TileIndex::new(229_934, 103_824, 18),
            reason: "HTTP 404".to_string(),
        });

        RunReport {
            summaries: vec![kyoto, LocalitySummary::failed("osaka", "no buildings")],
        }
    }

    #[test]
    fn test_manifest_write_and_load() {
        let dir = TempDir::new().unwrap();
        let manifest = RunManifest::new(BuildConfig::default(), &report());

        let path = manifest.write(dir.path()).unwrap();
        assert_eq!(path, dir.path().join("manifest.json"));

        let loaded = RunManifest::load(&path).unwrap();
        assert_eq!(loaded.generated_at, manifest.generated_at);
        assert_eq!(loaded.config, manifest.config);
        assert_eq!(loaded.localities.len(), 2);
        assert_eq!(loaded.localities[0].skipped, manifest.localities[0].skipped);

        let pairs: Vec<_> = loaded.pairs().collect();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].file_name, "kyoto_000.png");
        assert_eq!(pairs[0].tile, TileIndex::new(229_934, 103_823, 18));
    }

    #[test]
    fn test_manifest_json_shape() {
        let manifest = RunManifest::new(BuildConfig::default(), &report());
        let value = serde_json::to_value(&manifest).unwrap();

        assert_eq!(value["config"]["fill_rule"], "exterior-only");
        assert_eq!(value["localities"][0]["pairs"][0]["tile"]["zoom"], 18);
        assert_eq!(value["localities"][1]["error"], "no buildings");
        assert!(value["generated_at"].is_string());
    }
}
