use crate::cli::BuildArgs;
use crate::config_loader::load_config_with_overrides;
use crate::dry_run::DryRunPlan;
use crate::errors;
use crate::output::OutputWriter;
use crate::output_types::{BuildOutput, LocalityRow};
use crate::progress::BuildProgressDisplay;
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tilemask_core::config::{parse_fill_rule, CliConfigOverrides, LayeredConfig};
use tilemask_core::models::Locality;
use tilemask_dataset::{BuildConfig, DatasetBuilder, DirectorySink, MemorySink, RunManifest, RunReport};
use tilemask_sources::{GeoJsonPolygonSource, HttpFetcherOptions, HttpTileFetcher};

pub fn execute(
    args: BuildArgs,
    output: &OutputWriter,
    dry_run: bool,
    config_path: Option<&Path>,
) -> Result<()> {
    let fill_rule = args.fill_rule.as_deref().map(parse_fill_rule).transpose()?;
    let overrides = CliConfigOverrides {
        zoom: args.zoom,
        patch_size: args.patch_size,
        window: args.window,
        output_dir: args.output.clone(),
        polygons_dir: args.polygons.clone(),
        fill_rule,
    };
    let config = load_config_with_overrides(config_path, overrides)?;
    let localities = select_localities(&config, &args.localities)?;

    let build_config = BuildConfig::from_config(&config);
    let output_dir = config.output_dir.value.clone();
    let polygons = Arc::new(GeoJsonPolygonSource::new(
        &config.polygons_dir.value,
        config.geometry_validity.value,
    ));
    let fetcher = Arc::new(
        HttpTileFetcher::new(HttpFetcherOptions::from_config(&config))
            .context("Failed to create tile fetcher")?,
    );

    if dry_run {
        // Footprints are still read to locate each center tile; nothing is fetched or written
        let builder = DatasetBuilder::new(build_config, fetcher, polygons, Arc::new(MemorySink::new()));
        return DryRunPlan::for_build(&builder, &localities, &output_dir).render(output);
    }

    let sink = Arc::new(DirectorySink::new(&output_dir));
    let builder = DatasetBuilder::new(build_config, fetcher, polygons, sink);

    if !output.is_json() {
        output.info(format!(
            "Building {} localities at zoom {} into {}",
            localities.len(),
            build_config.zoom,
            output_dir.display()
        ));
    }

    let mut display = BuildProgressDisplay::new(output.is_json());
    let report = builder
        .build_all(&localities, |progress| display.update(&progress))
        .map_err(|e| errors::output_unwritable(&output_dir, &e))?;
    display.finish();

    let manifest = RunManifest::new(build_config, &report)
        .write(&output_dir)
        .context("Failed to write run manifest")?;

    if every_locality_failed(&report) {
        return Err(errors::nothing_built(&config.polygons_dir.value, &config.tile_url.value).into());
    }

    let rows: Vec<LocalityRow> = report.summaries.iter().map(LocalityRow::from).collect();

    if output.is_json() {
        output.result(BuildOutput {
            output_dir,
            manifest,
            total_pairs: report.total_pairs(),
            total_skipped: report.total_skipped(),
            localities: rows,
        })?;
    } else {
        for failed in report.failed_localities() {
            output.warning(format!(
                "{} failed: {}",
                failed.locality,
                failed.error.as_deref().unwrap_or("unknown error")
            ));
        }

        output.success(format!("Wrote {} pairs", report.total_pairs()));
        output.section("Localities");
        output.table(rows);
        output.kv("Images", output_dir.join("image").display());
        output.kv("Masks", output_dir.join("mask").display());
        output.kv("Manifest", manifest.display());
        if report.total_skipped() > 0 {
            output.kv("Skipped tiles", report.total_skipped());
        }
    }

    Ok(())
}

/// Configured localities, narrowed to the requested tags in request order
fn select_localities(config: &LayeredConfig, tags: &[String]) -> Result<Vec<Locality>> {
    let configured = config.localities();
    if tags.is_empty() {
        return Ok(configured);
    }

    let known: Vec<String> = configured.iter().map(|l| l.tag.clone()).collect();
    tags.iter()
        .map(|tag| {
            configured
                .iter()
                .find(|l| &l.tag == tag)
                .cloned()
                .ok_or_else(|| anyhow::Error::from(errors::unknown_locality(tag, &known)))
        })
        .collect()
}

/// A locality that built zero pairs still counts as a success
fn every_locality_failed(report: &RunReport) -> bool {
    !report.summaries.is_empty() && report.failed_localities().count() == report.summaries.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tilemask_core::models::LocalitySummary;

    #[test]
    fn test_select_all_localities_by_default() {
        let config = LayeredConfig::with_defaults();
        let selected = select_localities(&config, &[]).unwrap();
        let tags: Vec<_> = selected.iter().map(|l| l.tag.as_str()).collect();
        assert_eq!(tags, vec!["fukuoka", "kyoto", "osaka", "sapporo"]);
    }

    #[test]
    fn test_select_keeps_request_order() {
        let config = LayeredConfig::with_defaults();
        let tags = vec!["osaka".to_string(), "kyoto".to_string()];
        let selected = select_localities(&config, &tags).unwrap();
        assert_eq!(selected[0].tag, "osaka");
        assert_eq!(selected[1].tag, "kyoto");
    }

    #[test]
    fn test_select_unknown_tag() {
        let config = LayeredConfig::with_defaults();
        let err = select_localities(&config, &["nagoya".to_string()]).unwrap_err();
        let cli_error = err.downcast_ref::<errors::CliError>().unwrap();
        assert_eq!(cli_error.message, "Unknown locality 'nagoya'");
    }

    #[test]
    fn test_empty_but_successful_locality_is_not_a_total_failure() {
        let report = RunReport {
            summaries: vec![
                LocalitySummary::failed("osaka", "footprints missing"),
                LocalitySummary::new("sapporo"),
            ],
        };
        assert_eq!(report.total_pairs(), 0);
        assert!(!every_locality_failed(&report));
    }

    #[test]
    fn test_all_localities_failed() {
        let report = RunReport {
            summaries: vec![
                LocalitySummary::failed("osaka", "footprints missing"),
                LocalitySummary::failed("kyoto", "footprints missing"),
            ],
        };
        assert!(every_locality_failed(&report));
        assert!(!every_locality_failed(&RunReport::default()));
    }
}
