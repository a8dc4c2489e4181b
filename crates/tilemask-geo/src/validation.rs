use crate::models::{to_geo_polygon, Footprint, GeoPoint, PolygonRings};
use geo::Area;
use tilemask_core::error::{Result, TilemaskError};

/// Validation result with details
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
}

/// Validation error with location details
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub location: String,
    pub reason: String,
}

impl ValidationResult {
    /// Create a valid result
    pub fn valid() -> Self {
        Self { is_valid: true, errors: Vec::new() }
    }

    /// Add an error to the result
    pub fn add_error(&mut self, location: String, reason: String) {
        self.is_valid = false;
        self.errors.push(ValidationError { location, reason });
    }

    /// First error as `location: reason`
    pub fn summary(&self) -> Option<String> {
        self.errors.first().map(|e| format!("{}: {}", e.location, e.reason))
    }
}

/// Validate every part of a footprint
pub fn validate_footprint(footprint: &Footprint) -> ValidationResult {
    match footprint {
        Footprint::Polygon(rings) => validate_polygon(rings),
        Footprint::MultiPolygon(parts) => {
            let mut result = ValidationResult::valid();
            if parts.is_empty() {
                result.add_error("MultiPolygon".to_string(), "MultiPolygon has no parts".to_string());
            }
            for (i, part) in parts.iter().enumerate() {
                for error in validate_polygon(part).errors {
                    result.add_error(format!("MultiPolygon[{}].{}", i, error.location), error.reason);
                }
            }
            result
        }
    }
}

/// Validate a footprint, turning the first problem into an error
pub fn ensure_valid(feature_id: &str, footprint: &Footprint) -> Result<()> {
    let validation = validate_footprint(footprint);
    if validation.is_valid {
        return Ok(());
    }
    Err(TilemaskError::InvalidGeometry {
        feature_id: feature_id.to_string(),
        reason: validation.summary().unwrap_or_else(|| "Invalid geometry".to_string()),
    })
}

fn validate_polygon(rings: &PolygonRings) -> ValidationResult {
    let mut result = ValidationResult::valid();

    validate_ring(&rings.exterior, "Polygon exterior", &mut result);
    for (i, interior) in rings.interiors.iter().enumerate() {
        validate_ring(interior, &format!("Polygon interior[{}]", i), &mut result);
    }

    // Area only makes sense once the rings are well formed
    if result.is_valid && to_geo_polygon(rings).unsigned_area() == 0.0 {
        result.add_error("Polygon".to_string(), "Polygon has zero area".to_string());
    }

    result
}

fn validate_ring(ring: &[GeoPoint], location: &str, result: &mut ValidationResult) {
    if ring.len() < 4 {
        result.add_error(
            location.to_string(),
            format!("Ring must have at least 4 points, found {}", ring.len()),
        );
        return;
    }

    if let Some(i) = ring.iter().position(|p| !p.lat.is_finite() || !p.lon.is_finite()) {
        result.add_error(format!("{}[{}]", location, i), "Coordinates must be finite".to_string());
        return;
    }

    if ring.first() != ring.last() {
        result.add_error(
            location.to_string(),
            "Ring must be closed (first point == last point)".to_string(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tilemask_core::models::GeoBoundingBox;

    fn square() -> PolygonRings {
        PolygonRings::rectangle(&GeoBoundingBox::new(0.0, 0.0, 1.0, 1.0))
    }

    #[test]
    fn test_valid_polygon() {
        let result = validate_footprint(&Footprint::Polygon(square()));
        assert!(result.is_valid);
        assert!(ensure_valid("way/1", &Footprint::Polygon(square())).is_ok());
    }

    #[test]
    fn test_polygon_too_few_points() {
        let rings = PolygonRings::new(vec![
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(1.0, 1.0),
            GeoPoint::new(0.0, 0.0),
        ]);
        let result = validate_footprint(&Footprint::Polygon(rings));
        assert!(!result.is_valid);
        assert!(result.errors[0].reason.contains("at least 4 points"));
    }

    #[test]
    fn test_polygon_not_closed() {
        let mut rings = square();
        rings.exterior.pop();
        rings.exterior.push(GeoPoint::new(0.5, 0.0));
        let result = validate_footprint(&Footprint::Polygon(rings));
        assert!(!result.is_valid);
        assert!(result.errors[0].reason.contains("closed"));
    }

    #[test]
    fn test_zero_area_polygon() {
        let rings = PolygonRings::new(vec![
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.0, 1.0),
            GeoPoint::new(0.0, 2.0),
            GeoPoint::new(0.0, 0.0),
        ]);
        let err = ensure_valid("way/7", &Footprint::Polygon(rings)).unwrap_err();
        match err {
            TilemaskError::InvalidGeometry { feature_id, reason } => {
                assert_eq!(feature_id, "way/7");
                assert!(reason.contains("zero area"));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_non_finite_coordinates() {
        let mut rings = square();
        rings.exterior[2] = GeoPoint::new(f64::NAN, 1.0);
        let result = validate_footprint(&Footprint::Polygon(rings));
        assert_eq!(result.errors[0].location, "Polygon exterior[2]");
    }

    #[test]
    fn test_multipolygon_error_location() {
        let broken = PolygonRings::new(vec![GeoPoint::new(0.0, 0.0)]);
        let result = validate_footprint(&Footprint::MultiPolygon(vec![square(), broken]));

        assert!(!result.is_valid);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].location, "MultiPolygon[1].Polygon exterior");

        assert!(!validate_footprint(&Footprint::MultiPolygon(vec![])).is_valid);
    }
}
