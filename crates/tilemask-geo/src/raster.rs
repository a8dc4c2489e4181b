//! Footprint rasterization.
//!
//! Geographic coordinates are projected linearly into pixel space of the
//! target box, with row 0 at the northern edge:
//!
//! ```text
//! col = (lon - min_lon) / (max_lon - min_lon) * size
//! row = (max_lat - lat) / (max_lat - min_lat) * size
//! ```
//!
//! A pixel is occupied when its center lies inside a ring. Crossings are
//! counted with a half-open rule, so an edge that lies exactly on the tile
//! border never leaks a line of pixels into the neighboring tile.

use tilemask_core::error::{Result, TilemaskError};
use tilemask_core::models::{FillRule, GeoBoundingBox, GeoPoint, PolygonRings, PolygonSet, RasterMask};

/// Rasterize `polygons` over `bbox` into a `size x size` mask, exterior rings only
pub fn rasterize(polygons: &PolygonSet, bbox: &GeoBoundingBox, size: u32) -> Result<RasterMask> {
    rasterize_with(polygons, bbox, size, FillRule::ExteriorOnly)
}

/// Rasterize `polygons` with an explicit fill rule
pub fn rasterize_with(
    polygons: &PolygonSet,
    bbox: &GeoBoundingBox,
    size: u32,
    rule: FillRule,
) -> Result<RasterMask> {
    rasterize_parts(polygons.parts(), bbox, size, rule)
}

/// Rasterize individual polygon parts into one canvas
///
/// Parts are filled one after another; overlapping parts simply stay
/// occupied.
pub fn rasterize_parts<'a, I>(
    parts: I,
    bbox: &GeoBoundingBox,
    size: u32,
    rule: FillRule,
) -> Result<RasterMask>
where
    I: IntoIterator<Item = &'a PolygonRings>,
{
    bbox.ensure_non_degenerate()?;
    if size == 0 {
        return Err(TilemaskError::InvalidRasterSize { size });
    }

    let projection = PixelProjection::new(bbox, size);
    let mut mask = RasterMask::new(size);

    for part in parts {
        let mut edges = Vec::new();
        projection.push_edges(&part.exterior, &mut edges);
        if rule == FillRule::EvenOdd {
            for interior in &part.interiors {
                projection.push_edges(interior, &mut edges);
            }
        }
        fill_even_odd(&edges, &mut mask);
    }

    Ok(mask)
}

/// Linear map from geographic degrees to fractional pixel coordinates
struct PixelProjection {
    min_lon: f64,
    max_lat: f64,
    scale_x: f64,
    scale_y: f64,
}

impl PixelProjection {
    fn new(bbox: &GeoBoundingBox, size: u32) -> Self {
        let size = f64::from(size);
        Self {
            min_lon: bbox.min_lon,
            max_lat: bbox.max_lat,
            scale_x: size / bbox.width(),
            scale_y: size / bbox.height(),
        }
    }

    fn project(&self, point: &GeoPoint) -> (f64, f64) {
        let col = (point.lon - self.min_lon) * self.scale_x;
        let row = (self.max_lat - point.lat) * self.scale_y;
        (col, row)
    }

    /// Append the edges of `ring`, closing it if the source left it open
    fn push_edges(&self, ring: &[GeoPoint], edges: &mut Vec<Edge>) {
        if ring.len() < 3 {
            return;
        }
        let projected: Vec<(f64, f64)> = ring.iter().map(|p| self.project(p)).collect();
        if projected.iter().any(|(x, y)| !x.is_finite() || !y.is_finite()) {
            tracing::debug!("Skipping ring with non-finite coordinates");
            return;
        }

        for (i, &start) in projected.iter().enumerate() {
            let end = projected[(i + 1) % projected.len()];
            // horizontal edges never cross a scanline
            if start.1 != end.1 {
                edges.push(Edge { start, end });
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Edge {
    start: (f64, f64),
    end: (f64, f64),
}

impl Edge {
    /// Column where the edge crosses the horizontal line `y`, if it does
    ///
    /// The lower endpoint is inclusive and the upper one exclusive, so a
    /// vertex shared by two edges is counted once.
    fn crossing(&self, y: f64) -> Option<f64> {
        let (x1, y1) = self.start;
        let (x2, y2) = self.end;
        if (y1 <= y) == (y2 <= y) {
            return None;
        }
        Some(x1 + (y - y1) * (x2 - x1) / (y2 - y1))
    }

    fn row_span(&self) -> (f64, f64) {
        (self.start.1.min(self.end.1), self.start.1.max(self.end.1))
    }
}

/// Scanline fill of one closed edge set with even-odd parity
fn fill_even_odd(edges: &[Edge], mask: &mut RasterMask) {
    if edges.is_empty() {
        return;
    }
    let size = mask.size();

    let (top, bottom) = edges.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), e| {
        let (min, max) = e.row_span();
        (lo.min(min), hi.max(max))
    });
    let first_row = pixel_index(top, size);
    let last_row = pixel_index(bottom, size);

    let mut crossings = Vec::new();
    for row in first_row..last_row {
        let center = f64::from(row) + 0.5;
        crossings.clear();
        crossings.extend(edges.iter().filter_map(|e| e.crossing(center)));
        crossings.sort_by(f64::total_cmp);

        for span in crossings.chunks_exact(2) {
            let start = pixel_index(span[0], size);
            let end = pixel_index(span[1], size);
            mask.fill_span(row, start..end);
        }
    }
}

/// First pixel whose center lies at or after `coordinate`, clamped to `[0, size]`
fn pixel_index(coordinate: f64, size: u32) -> u32 {
    let index = (coordinate - 0.5).ceil();
    if index <= 0.0 {
        0
    } else if index >= f64::from(size) {
        size
    } else {
        index as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tilemask_core::models::Footprint;

    fn unit_box() -> GeoBoundingBox {
        GeoBoundingBox::new(0.0, 0.0, 1.0, 1.0)
    }

    fn rect(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> PolygonRings {
        PolygonRings::rectangle(&GeoBoundingBox::new(min_lon, min_lat, max_lon, max_lat))
    }

    fn single(rings: PolygonRings) -> PolygonSet {
        PolygonSet::from(vec![Footprint::Polygon(rings)])
    }

    #[test]
    fn test_rectangle_fills_exact_pixels() {
        let set = single(rect(0.25, 0.25, 0.75, 0.75));
        let mask = rasterize(&set, &unit_box(), 8).unwrap();

        assert_eq!(mask.occupied_count(), 16);
        for row in 0..8 {
            for col in 0..8 {
                let inside = (2..6).contains(&row) && (2..6).contains(&col);
                assert_eq!(mask.get(row, col), inside, "pixel ({}, {})", row, col);
            }
        }
    }

    #[test]
    fn test_north_is_row_zero() {
        let set = single(rect(0.0, 0.75, 1.0, 1.0));
        let mask = rasterize(&set, &unit_box(), 4).unwrap();

        assert_eq!(mask.occupied_count(), 4);
        assert!((0..4).all(|col| mask.get(0, col)));
    }

    #[test]
    fn test_polygon_equal_to_box_fills_everything() {
        let set = single(PolygonRings::rectangle(&unit_box()));
        let mask = rasterize(&set, &unit_box(), 16).unwrap();
        assert!(mask.is_fully_occupied());
    }

    #[test]
    fn test_edge_on_border_does_not_bleed() {
        let west = single(rect(-1.0, 0.0, 0.0, 1.0));
        let south = single(rect(0.0, -1.0, 1.0, 0.0));
        assert!(rasterize(&west, &unit_box(), 16).unwrap().is_empty());
        assert!(rasterize(&south, &unit_box(), 16).unwrap().is_empty());
    }

    #[test]
    fn test_triangle_uses_pixel_centers() {
        let triangle = PolygonRings::new(vec![
            GeoPoint::new(1.0, 0.0),
            GeoPoint::new(1.0, 1.0),
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(1.0, 0.0),
        ]);
        let mask = rasterize(&single(triangle), &unit_box(), 4).unwrap();

        // centers on the diagonal sit on a right-hand edge and stay empty
        assert_eq!(mask.occupied_count(), 6);
        assert!(mask.get(0, 0));
        assert!(mask.get(0, 2));
        assert!(!mask.get(0, 3));
        assert!(mask.get(2, 0));
        assert!(!mask.get(3, 0));
        assert!(!mask.get(3, 3));
    }

    #[test]
    fn test_holes_follow_fill_rule() {
        let donut = rect(0.0, 0.0, 1.0, 1.0)
            .with_interiors(vec![rect(0.25, 0.25, 0.75, 0.75).exterior]);
        let set = single(donut);

        let solid = rasterize_with(&set, &unit_box(), 8, FillRule::ExteriorOnly).unwrap();
        assert!(solid.is_fully_occupied());

        let holed = rasterize_with(&set, &unit_box(), 8, FillRule::EvenOdd).unwrap();
        assert_eq!(holed.occupied_count(), 64 - 16);
        assert!(!holed.get(3, 3));
        assert!(holed.get(0, 0));
    }

    #[test]
    fn test_multipolygon_parts_share_canvas() {
        let set = PolygonSet::from(vec![Footprint::MultiPolygon(vec![
            rect(0.0, 0.5, 0.5, 1.0),
            rect(0.5, 0.0, 1.0, 0.5),
            rect(0.0, 0.5, 0.5, 1.0),
        ])]);
        let mask = rasterize(&set, &unit_box(), 4).unwrap();

        assert_eq!(mask.occupied_count(), 8);
        assert!(mask.get(0, 0));
        assert!(mask.get(3, 3));
        assert!(!mask.get(0, 3));
    }

    #[test]
    fn test_open_ring_is_closed_implicitly() {
        let open = PolygonRings::new(vec![
            GeoPoint::new(1.0, 0.0),
            GeoPoint::new(1.0, 1.0),
            GeoPoint::new(0.0, 1.0),
            GeoPoint::new(0.0, 0.0),
        ]);
        let mask = rasterize(&single(open), &unit_box(), 4).unwrap();
        assert!(mask.is_fully_occupied());
    }

    #[test]
    fn test_invalid_inputs() {
        let set = single(rect(0.0, 0.0, 1.0, 1.0));
        assert!(matches!(
            rasterize(&set, &GeoBoundingBox::new(5.0, 5.0, 5.0, 5.0), 4),
            Err(TilemaskError::DegenerateBoundingBox { .. })
        ));
        assert!(matches!(
            rasterize(&set, &unit_box(), 0),
            Err(TilemaskError::InvalidRasterSize { size: 0 })
        ));
    }

    #[test]
    fn test_pixel_index() {
        assert_eq!(pixel_index(-3.0, 4), 0);
        assert_eq!(pixel_index(0.0, 4), 0);
        assert_eq!(pixel_index(0.5, 4), 0);
        assert_eq!(pixel_index(0.6, 4), 1);
        assert_eq!(pixel_index(4.0, 4), 4);
        assert_eq!(pixel_index(9.0, 4), 4);
    }
}
