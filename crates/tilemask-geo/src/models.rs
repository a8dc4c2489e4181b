//! Geometry models for tilemask-geo.
//!
//! Re-exports the canonical types from `tilemask-core` and converts footprint
//! rings to `geo` types for the algorithms borrowed from that crate.

use geo::{Coord, LineString, Polygon};

pub use tilemask_core::models::{
    FillRule, Footprint, GeoBoundingBox, GeoPoint, PolygonRings, PolygonSet, ValidityMode,
};

/// Convert a ring to a `geo::LineString` with `x = lon` and `y = lat`
pub fn to_geo_line_string(ring: &[GeoPoint]) -> LineString<f64> {
    LineString::new(ring.iter().map(|p| Coord { x: p.lon, y: p.lat }).collect())
}

/// Convert a polygon part to a `geo::Polygon`
///
/// `geo` closes open rings on construction, so the result may hold one more
/// coordinate than the source ring.
pub fn to_geo_polygon(rings: &PolygonRings) -> Polygon<f64> {
    let interiors = rings.interiors.iter().map(|r| to_geo_line_string(r)).collect();
    Polygon::new(to_geo_line_string(&rings.exterior), interiors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Area;

    #[test]
    fn test_to_geo_polygon_axis_order() {
        let rings = PolygonRings::rectangle(&GeoBoundingBox::new(135.0, 35.0, 136.0, 35.5));
        let polygon = to_geo_polygon(&rings);

        let first = polygon.exterior().0[0];
        assert_eq!(first, Coord { x: 135.0, y: 35.5 });
        assert!((polygon.unsigned_area() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_to_geo_polygon_keeps_holes() {
        let rings = PolygonRings::rectangle(&GeoBoundingBox::new(0.0, 0.0, 4.0, 4.0))
            .with_interiors(vec![
                PolygonRings::rectangle(&GeoBoundingBox::new(1.0, 1.0, 2.0, 2.0)).exterior,
            ]);
        let polygon = to_geo_polygon(&rings);

        assert_eq!(polygon.interiors().len(), 1);
        assert!((polygon.unsigned_area() - 15.0).abs() < 1e-12);
    }
}
