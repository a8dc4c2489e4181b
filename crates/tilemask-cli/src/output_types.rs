use serde::Serialize;
use std::path::PathBuf;
use tabled::Tabled;
use tilemask_core::models::{GeoBoundingBox, LocalitySummary};

/// Output for tile command
#[derive(Debug, Serialize)]
pub struct TileOutput {
    pub x: u32,
    pub y: u32,
    pub zoom: u8,
    pub bounds: GeoBoundingBox,
    pub url: String,
}

/// Output for build command
#[derive(Debug, Serialize)]
pub struct BuildOutput {
    pub output_dir: PathBuf,
    pub manifest: PathBuf,
    pub total_pairs: usize,
    pub total_skipped: usize,
    pub localities: Vec<LocalityRow>,
}

/// One line of the per-locality build summary
#[derive(Debug, Serialize, Tabled)]
pub struct LocalityRow {
    #[tabled(rename = "Locality")]
    pub locality: String,
    #[tabled(rename = "Center")]
    pub center: String,
    #[tabled(rename = "Footprints")]
    pub footprints: usize,
    #[tabled(rename = "Pairs")]
    pub pairs: usize,
    #[tabled(rename = "Skipped")]
    pub skipped: usize,
    #[tabled(rename = "Status")]
    pub status: String,
}

impl From<&LocalitySummary> for LocalityRow {
    fn from(summary: &LocalitySummary) -> Self {
        Self {
            locality: summary.locality.clone(),
            center: summary.center.map(|t| t.to_string()).unwrap_or_else(|| "-".to_string()),
            footprints: summary.footprints,
            pairs: summary.produced(),
            skipped: summary.skipped.len(),
            status: match &summary.error {
                Some(error) => format!("failed: {}", error),
                None => "ok".to_string(),
            },
        }
    }
}

/// Output for config command
#[derive(Debug, Serialize)]
pub struct ConfigOutput {
    pub values: Vec<ConfigEntry>,
}

#[derive(Debug, Serialize, Tabled)]
pub struct ConfigEntry {
    #[tabled(rename = "Key")]
    pub key: String,
    #[tabled(rename = "Value")]
    pub value: String,
    #[tabled(rename = "Source")]
    pub source: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tilemask_core::models::TileIndex;

    #[test]
    fn test_locality_row_from_summary() {
        let mut summary = LocalitySummary::new("kyoto");
        summary.center = Some(TileIndex::new(229_935, 103_824, 18));
        summary.footprints = 12;

        let row = LocalityRow::from(&summary);
        assert_eq!(row.center, "18/229935/103824");
        assert_eq!(row.pairs, 0);
        assert_eq!(row.status, "ok");

        let failed = LocalityRow::from(&LocalitySummary::failed("osaka", "no footprints"));
        assert_eq!(failed.center, "-");
        assert_eq!(failed.status, "failed: no footprints");
    }
}
