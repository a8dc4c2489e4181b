//! GeoJSON footprint source
//!
//! Each locality reads `{dir}/{tag}.geojson`. Polygon and MultiPolygon
//! geometries become footprints; every other geometry type is ignored.

use ::geojson::{GeoJson, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tilemask_core::error::{Result, TilemaskError};
use tilemask_core::models::{
    Footprint, GeoPoint, Locality, LocalityGeometry, PolygonRings, PolygonSet, ValidityMode,
};
use tilemask_core::ports::PolygonSource;
use tilemask_geo::validation::ensure_valid;

/// Reads building footprints from per-locality GeoJSON files
pub struct GeoJsonPolygonSource {
    dir: PathBuf,
    validity: ValidityMode,
}

impl GeoJsonPolygonSource {
    /// Create a new source rooted at `dir`
    pub fn new(dir: impl Into<PathBuf>, validity: ValidityMode) -> Self {
        Self { dir: dir.into(), validity }
    }

    /// File holding the footprints of `locality`
    pub fn path_for(&self, locality: &Locality) -> PathBuf {
        self.dir.join(format!("{}.geojson", locality.tag))
    }

    fn load(&self, locality: &Locality, path: &Path) -> Result<PolygonSet> {
        let empty = |reason: String| TilemaskError::EmptyPolygonSource {
            locality: locality.tag.clone(),
            reason,
        };

        let content = fs::read_to_string(path)
            .map_err(|e| empty(format!("cannot read {}: {}", path.display(), e)))?;

        let geojson: GeoJson = content
            .parse()
            .map_err(|e| empty(format!("invalid GeoJSON in {}: {}", path.display(), e)))?;

        let mut footprints = PolygonSet::new();
        let mut skipped = 0usize;

        for (feature_id, value) in extract_geometries(&geojson) {
            let Some(footprint) = to_footprint(value) else {
                continue;
            };

            match ensure_valid(&feature_id, &footprint) {
                Ok(()) => footprints.push(footprint),
                Err(e) => match self.validity {
                    ValidityMode::Strict => return Err(e),
                    ValidityMode::Lenient => {
                        tracing::warn!("Skipping feature in {}: {}", locality.tag, e);
                        skipped += 1;
                    }
                },
            }
        }

        if skipped > 0 {
            tracing::info!("Skipped {} invalid footprints for {}", skipped, locality.tag);
        }

        Ok(footprints)
    }
}

impl PolygonSource for GeoJsonPolygonSource {
    fn polygons_for(&self, locality: &Locality) -> Result<LocalityGeometry> {
        let path = self.path_for(locality);
        tracing::debug!("Loading footprints for {} from {}", locality.tag, path.display());

        let footprints = self.load(locality, &path)?;

        // The representative point is the center of the total bounds
        let Some(bounds) = footprints.bounds() else {
            return Err(TilemaskError::EmptyPolygonSource {
                locality: locality.tag.clone(),
                reason: format!("no polygon footprints in {}", path.display()),
            });
        };

        tracing::info!("Loaded {} footprints for {}", footprints.len(), locality.name);

        Ok(LocalityGeometry { footprints, centroid: bounds.center() })
    }
}

/// Geometries with a stable feature id, in document order
fn extract_geometries(geojson: &GeoJson) -> Vec<(String, &Value)> {
    match geojson {
        GeoJson::FeatureCollection(fc) => fc
            .features
            .iter()
            .enumerate()
            .filter_map(|(idx, feature)| {
                feature.geometry.as_ref().map(|g| (feature_id(feature, idx), &g.value))
            })
            .collect(),
        GeoJson::Feature(feature) => feature
            .geometry
            .as_ref()
            .map(|g| vec![(feature_id(feature, 0), &g.value)])
            .unwrap_or_default(),
        GeoJson::Geometry(geometry) => vec![("0".to_string(), &geometry.value)],
    }
}

fn feature_id(feature: &::geojson::Feature, idx: usize) -> String {
    match &feature.id {
        Some(::geojson::feature::Id::String(s)) => s.clone(),
        Some(::geojson::feature::Id::Number(n)) => n.to_string(),
        None => idx.to_string(),
    }
}

fn to_footprint(value: &Value) -> Option<Footprint> {
    match value {
        Value::Polygon(rings) => Some(Footprint::Polygon(to_rings(rings))),
        Value::MultiPolygon(polygons) => {
            Some(Footprint::MultiPolygon(polygons.iter().map(|p| to_rings(p)).collect()))
        }
        _ => None,
    }
}

fn to_rings(rings: &[Vec<Vec<f64>>]) -> PolygonRings {
    let mut converted =
        rings.iter().map(|ring| ring.iter().map(|p| to_point(p)).collect::<Vec<GeoPoint>>());
    let exterior = converted.next().unwrap_or_default();
    PolygonRings::new(exterior).with_interiors(converted.collect())
}

/// GeoJSON positions are `[lon, lat]`; short positions become NaN and fail validation
fn to_point(position: &[f64]) -> GeoPoint {
    let lon = position.first().copied().unwrap_or(f64::NAN);
    let lat = position.get(1).copied().unwrap_or(f64::NAN);
    GeoPoint::new(lat, lon)
}
