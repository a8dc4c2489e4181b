//! `build --dry-run`: resolve every locality to the exact files a real run
//! would write, without fetching tiles or touching the output directory.

use crate::output::OutputWriter;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tilemask_core::models::{pair_file_name, GeoBoundingBox, Locality, TileIndex};
use tilemask_dataset::{DatasetBuilder, LocalityPlan};

/// One pair a real run would try to produce
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedFile {
    pub file_name: String,
    pub tile: TileIndex,
    pub bounds: GeoBoundingBox,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PlannedStep {
    CreateLayout {
        image_dir: PathBuf,
        mask_dir: PathBuf,
    },
    FetchTiles {
        locality: String,
        name: String,
        center: TileIndex,
        footprints: usize,
        files: Vec<PlannedFile>,
    },
    /// Footprints could not be loaded, so a real run would fail this locality
    SkipLocality {
        locality: String,
        reason: String,
    },
    WriteManifest {
        path: PathBuf,
    },
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DryRunPlan {
    steps: Vec<PlannedStep>,
}

impl DryRunPlan {
    /// Plan a build of `localities` into `output_dir`
    pub fn for_build(builder: &DatasetBuilder, localities: &[Locality], output_dir: &Path) -> Self {
        Self::from_outcomes(
            output_dir,
            localities
                .iter()
                .map(|locality| (locality, builder.plan_locality(locality))),
        )
    }

    fn from_outcomes<'a, I>(output_dir: &Path, outcomes: I) -> Self
    where
        I: IntoIterator<Item = (&'a Locality, tilemask_core::Result<LocalityPlan>)>,
    {
        let mut steps = vec![PlannedStep::CreateLayout {
            image_dir: output_dir.join("image"),
            mask_dir: output_dir.join("mask"),
        }];

        for (locality, outcome) in outcomes {
            steps.push(match outcome {
                Ok(plan) => PlannedStep::FetchTiles {
                    locality: locality.tag.clone(),
                    name: locality.name.clone(),
                    center: plan.center,
                    footprints: plan.footprints,
                    files: plan
                        .tiles
                        .iter()
                        .enumerate()
                        .map(|(index, planned)| PlannedFile {
                            file_name: pair_file_name(&locality.tag, index),
                            tile: planned.tile,
                            bounds: planned.bounds,
                        })
                        .collect(),
                },
                Err(e) => PlannedStep::SkipLocality {
                    locality: locality.tag.clone(),
                    reason: e.to_string(),
                },
            });
        }

        steps.push(PlannedStep::WriteManifest {
            path: output_dir.join("manifest.json"),
        });

        Self { steps }
    }

    pub fn steps(&self) -> &[PlannedStep] {
        &self.steps
    }

    /// Pairs a real run would attempt across all localities
    pub fn planned_pairs(&self) -> usize {
        self.steps
            .iter()
            .map(|step| match step {
                PlannedStep::FetchTiles { files, .. } => files.len(),
                _ => 0,
            })
            .sum()
    }

    pub fn render(&self, output: &OutputWriter) -> anyhow::Result<()> {
        if output.is_json() {
            return output.result(serde_json::json!({
                "dry_run": true,
                "planned_pairs": self.planned_pairs(),
                "steps": self.steps,
            }));
        }

        output.section("Build plan (dry run)");
        for step in &self.steps {
            match step {
                PlannedStep::CreateLayout { image_dir, mask_dir } => {
                    output.info(format!("Create {} and {}", image_dir.display(), mask_dir.display()));
                }
                PlannedStep::FetchTiles { locality, name, center, footprints, files } => {
                    output.info(format!(
                        "{} ({}): {} tiles around {}, {} footprints",
                        name,
                        locality,
                        files.len(),
                        center,
                        footprints
                    ));
                    for file in files {
                        let b = file.bounds;
                        output.info(format!(
                            "   {} <- {} [{:.6}, {:.6}, {:.6}, {:.6}]",
                            file.file_name, file.tile, b.min_lon, b.min_lat, b.max_lon, b.max_lat
                        ));
                    }
                }
                PlannedStep::SkipLocality { locality, reason } => {
                    output.warning(format!("{} would fail: {}", locality, reason));
                }
                PlannedStep::WriteManifest { path } => {
                    output.info(format!("Write {}", path.display()));
                }
            }
        }
        output.info(format!(
            "{} pairs planned. Nothing was fetched or written.",
            self.planned_pairs()
        ));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tilemask_core::TilemaskError;
    use tilemask_dataset::PlannedTile;

    fn kyoto_plan() -> LocalityPlan {
        let center = TileIndex::new(229_935, 103_824, 18);
        LocalityPlan {
            locality: "kyoto".to_string(),
            center,
            footprints: 12,
            tiles: vec![
                PlannedTile {
                    tile: TileIndex::new(229_934, 103_823, 18),
                    bounds: GeoBoundingBox::new(135.76, 35.01, 135.77, 35.02),
                },
                PlannedTile {
                    tile: center,
                    bounds: GeoBoundingBox::new(135.77, 35.00, 135.78, 35.01),
                },
            ],
        }
    }

    #[test]
    fn test_plan_names_every_file() {
        let kyoto = Locality::new("kyoto", "Kyoto");
        let plan = DryRunPlan::from_outcomes(Path::new("out"), [(&kyoto, Ok(kyoto_plan()))]);

        assert_eq!(plan.steps().len(), 3);
        assert_eq!(plan.planned_pairs(), 2);
        match &plan.steps()[1] {
            PlannedStep::FetchTiles { locality, files, footprints, .. } => {
                assert_eq!(locality, "kyoto");
                assert_eq!(*footprints, 12);
                assert_eq!(files[0].file_name, "kyoto_000.png");
                assert_eq!(files[1].file_name, "kyoto_001.png");
                assert_eq!(files[1].tile, TileIndex::new(229_935, 103_824, 18));
            }
            other => panic!("unexpected step: {:?}", other),
        }
        assert_eq!(
            plan.steps()[2],
            PlannedStep::WriteManifest { path: Path::new("out").join("manifest.json") }
        );
    }

    #[test]
    fn test_failed_locality_becomes_skip() {
        let osaka = Locality::new("osaka", "Osaka");
        let err = TilemaskError::EmptyPolygonSource {
            locality: "osaka".to_string(),
            reason: "file not found".to_string(),
        };
        let plan = DryRunPlan::from_outcomes(Path::new("out"), [(&osaka, Err(err))]);

        assert_eq!(plan.planned_pairs(), 0);
        assert!(matches!(
            &plan.steps()[1],
            PlannedStep::SkipLocality { locality, reason }
                if locality == "osaka" && reason.contains("file not found")
        ));
    }

    #[test]
    fn test_steps_serialize_with_action_tag() {
        let kyoto = Locality::new("kyoto", "Kyoto");
        let plan = DryRunPlan::from_outcomes(Path::new("out"), [(&kyoto, Ok(kyoto_plan()))]);
        let json = serde_json::to_value(plan.steps()).unwrap();

        assert_eq!(json[0]["action"], "create_layout");
        assert_eq!(json[1]["action"], "fetch_tiles");
        assert_eq!(json[1]["center"]["x"], 229_935);
        assert_eq!(json[1]["files"][0]["tile"]["y"], 103_823);
        assert_eq!(json[2]["action"], "write_manifest");
    }
}
