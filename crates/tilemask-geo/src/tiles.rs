//! Web-Mercator slippy-map tile math.
//!
//! Tile `(x, y)` at zoom `z` covers one cell of a `2^z x 2^z` grid laid over
//! the Web-Mercator square. `x` grows eastward from the antimeridian and `y`
//! grows southward from about 85.0511 degrees north.

use std::f64::consts::PI;
use tilemask_core::error::{Result, TilemaskError};
use tilemask_core::models::{GeoBoundingBox, GeoPoint, TileIndex, MAX_WINDOW, MAX_ZOOM};

/// Distance in tile units under which a projected value is treated as the
/// integer it rounds to
const SNAP_EPSILON: f64 = 1e-9;

/// Tile containing `point` at `zoom`
///
/// Fails with [`TilemaskError::CoordinateDomain`] when the point cannot be
/// projected onto the tile grid. Out-of-range input is never clamped.
pub fn point_to_tile(point: GeoPoint, zoom: u8) -> Result<TileIndex> {
    let domain_error = |reason: &str| TilemaskError::CoordinateDomain {
        lat: point.lat,
        lon: point.lon,
        zoom,
        reason: reason.to_string(),
    };

    if zoom > MAX_ZOOM {
        return Err(domain_error(&format!("zoom must not exceed {}", MAX_ZOOM)));
    }
    if !point.lat.is_finite() || !point.lon.is_finite() {
        return Err(domain_error("coordinates must be finite"));
    }
    if point.lat.abs() >= 90.0 {
        return Err(domain_error("latitude must lie strictly between -90 and 90"));
    }
    if !(-180.0..=180.0).contains(&point.lon) {
        return Err(domain_error("longitude must lie between -180 and 180"));
    }

    // +180 is the antimeridian again
    let lon = if point.lon == 180.0 { -180.0 } else { point.lon };

    let n = TileIndex::tiles_per_side(zoom) as f64;
    let lat_rad = point.lat.to_radians();
    let x = snap((lon + 180.0) / 360.0 * n).floor();
    let y = snap((1.0 - lat_rad.tan().asinh() / PI) / 2.0 * n).floor();

    if !(0.0..n).contains(&x) || !(0.0..n).contains(&y) {
        return Err(domain_error("outside the Web-Mercator latitude range"));
    }

    Ok(TileIndex::new(x as u32, y as u32, zoom))
}

/// North-west corner of `tile`
///
/// Only meaningful for tiles with `zoom <= MAX_ZOOM`; larger zoom levels
/// return coordinates but never panic.
pub fn tile_to_point(tile: TileIndex) -> GeoPoint {
    grid_corner(u64::from(tile.x), u64::from(tile.y), tile.zoom)
}

/// Geographic extent of `tile`
///
/// Same zoom precondition as [`tile_to_point`].
///
/// The south-east corner is the north-west corner of tile `(x + 1, y + 1)`,
/// which may sit on the far edge of the grid.
pub fn tile_bounds(tile: TileIndex) -> GeoBoundingBox {
    let north_west = tile_to_point(tile);
    let south_east = grid_corner(u64::from(tile.x) + 1, u64::from(tile.y) + 1, tile.zoom);
    GeoBoundingBox::from_corners(north_west, south_east)
}

fn grid_corner(x: u64, y: u64, zoom: u8) -> GeoPoint {
    let n = TileIndex::tiles_per_side(zoom) as f64;
    let lon = x as f64 / n * 360.0 - 180.0;
    let lat = (PI * (1.0 - 2.0 * y as f64 / n)).sinh().atan().to_degrees();
    GeoPoint::new(lat, lon)
}

fn snap(value: f64) -> f64 {
    let nearest = value.round();
    if (value - nearest).abs() < SNAP_EPSILON {
        nearest
    } else {
        value
    }
}

/// Square window of tiles around a center tile
///
/// Yields tiles column by column (west to east, north to south inside each
/// column). Positions that fall off the tile grid are skipped; the grid does
/// not wrap. Clone an unstarted neighborhood to walk it more than once.
#[derive(Debug, Clone)]
pub struct TileNeighborhood {
    center: TileIndex,
    window: u32,
    cursor: u32,
}

impl TileNeighborhood {
    /// Neighborhood of `window x window` tiles; `window` must be odd and at
    /// most [`MAX_WINDOW`]
    pub fn new(center: TileIndex, window: u32) -> Result<Self> {
        if window % 2 == 0 {
            return Err(TilemaskError::ConfigInvalid {
                key: "window".to_string(),
                reason: format!("window must be a positive odd number, got {}", window),
            });
        }
        if window > MAX_WINDOW {
            return Err(TilemaskError::ConfigInvalid {
                key: "window".to_string(),
                reason: format!("{} exceeds the maximum window {}", window, MAX_WINDOW),
            });
        }
        if !center.is_valid() {
            return Err(TilemaskError::ConfigInvalid {
                key: "center".to_string(),
                reason: format!("tile {} is not on the grid", center),
            });
        }
        Ok(Self { center, window, cursor: 0 })
    }

    pub fn center(&self) -> TileIndex {
        self.center
    }

    pub fn window(&self) -> u32 {
        self.window
    }

    fn tile_at(&self, position: u32) -> Option<TileIndex> {
        let half = i64::from(self.window / 2);
        let dx = i64::from(position / self.window) - half;
        let dy = i64::from(position % self.window) - half;
        self.center.offset(dx, dy)
    }

    fn positions(&self) -> u32 {
        self.window * self.window
    }
}

impl Iterator for TileNeighborhood {
    type Item = TileIndex;

    fn next(&mut self) -> Option<TileIndex> {
        while self.cursor < self.positions() {
            let position = self.cursor;
            self.cursor += 1;
            if let Some(tile) = self.tile_at(position) {
                return Some(tile);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.cursor..self.positions())
            .filter(|&p| self.tile_at(p).is_some())
            .count();
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for TileNeighborhood {}

impl std::iter::FusedIterator for TileNeighborhood {}

#[cfg(test)]
mod tests {
    use super::*;

    const KYOTO: GeoPoint = GeoPoint { lat: 35.0116, lon: 135.7681 };

    #[test]
    fn test_point_to_tile_kyoto() {
        let tile = point_to_tile(KYOTO, 18).unwrap();
        assert_eq!(tile, TileIndex::new(229_935, 103_824, 18));
    }

    #[test]
    fn test_origin_tile() {
        let tile = point_to_tile(GeoPoint::new(0.0, 0.0), 1).unwrap();
        assert_eq!(tile, TileIndex::new(1, 1, 1));

        let corner = tile_to_point(TileIndex::new(0, 0, 0));
        assert_eq!(corner.lon, -180.0);
        assert!((corner.lat - 85.051_128_779_806_6).abs() < 1e-9);
    }

    #[test]
    fn test_antimeridian_maps_to_first_column() {
        let east = point_to_tile(GeoPoint::new(10.0, 180.0), 4).unwrap();
        let west = point_to_tile(GeoPoint::new(10.0, -180.0), 4).unwrap();
        assert_eq!(east.x, 0);
        assert_eq!(east, west);
    }

    #[test]
    fn test_domain_errors_are_not_clamped() {
        let cases = [
            GeoPoint::new(90.0, 0.0),
            GeoPoint::new(-90.0, 0.0),
            GeoPoint::new(89.0, 0.0),
            GeoPoint::new(-86.0, 0.0),
            GeoPoint::new(0.0, 180.5),
            GeoPoint::new(f64::NAN, 0.0),
            GeoPoint::new(0.0, f64::INFINITY),
        ];
        for point in cases {
            let err = point_to_tile(point, 10).unwrap_err();
            assert!(
                matches!(err, TilemaskError::CoordinateDomain { .. }),
                "expected domain error for {:?}",
                point
            );
        }

        assert!(point_to_tile(KYOTO, MAX_ZOOM + 1).is_err());
    }

    #[test]
    fn test_tile_bounds_are_ordered() {
        let bounds = tile_bounds(TileIndex::new(229_935, 103_824, 18));
        assert!(!bounds.is_degenerate());
        assert!(bounds.contains_point(KYOTO));
    }

    #[test]
    fn test_tile_bounds_of_last_tile() {
        let bounds = tile_bounds(TileIndex::new(3, 3, 2));
        assert_eq!(bounds.max_lon, 180.0);
        assert!((bounds.min_lat + 85.051_128_779_806_6).abs() < 1e-9);
    }

    #[test]
    fn test_neighborhood_is_column_major() {
        let center = TileIndex::new(10, 20, 6);
        let tiles: Vec<_> = TileNeighborhood::new(center, 3).unwrap().collect();

        assert_eq!(tiles.len(), 9);
        assert_eq!(tiles[0], TileIndex::new(9, 19, 6));
        assert_eq!(tiles[1], TileIndex::new(9, 20, 6));
        assert_eq!(tiles[3], TileIndex::new(10, 19, 6));
        assert_eq!(tiles[4], center);
        assert_eq!(tiles[8], TileIndex::new(11, 21, 6));
    }

    #[test]
    fn test_neighborhood_skips_off_grid_tiles() {
        let corner = TileIndex::new(0, 0, 3);
        let neighborhood = TileNeighborhood::new(corner, 3).unwrap();
        assert_eq!(neighborhood.len(), 4);

        let tiles: Vec<_> = neighborhood.collect();
        assert_eq!(
            tiles,
            vec![
                TileIndex::new(0, 0, 3),
                TileIndex::new(0, 1, 3),
                TileIndex::new(1, 0, 3),
                TileIndex::new(1, 1, 3),
            ]
        );
    }

    #[test]
    fn test_neighborhood_len_tracks_progress() {
        let mut neighborhood = TileNeighborhood::new(TileIndex::new(5, 5, 4), 5).unwrap();
        assert_eq!(neighborhood.len(), 25);
        neighborhood.next();
        assert_eq!(neighborhood.len(), 24);

        let restarted = TileNeighborhood::new(neighborhood.center(), neighborhood.window()).unwrap();
        assert_eq!(restarted.count(), 25);
    }

    #[test]
    fn test_neighborhood_rejects_even_window() {
        assert!(TileNeighborhood::new(TileIndex::new(5, 5, 4), 2).is_err());
        assert!(TileNeighborhood::new(TileIndex::new(5, 5, 4), 0).is_err());
        assert!(TileNeighborhood::new(TileIndex::new(16, 0, 4), 3).is_err());
    }

    #[test]
    fn test_neighborhood_rejects_oversized_window() {
        let center = TileIndex::new(5, 5, 4);
        let err = TileNeighborhood::new(center, 65_537).unwrap_err();
        assert!(matches!(err, TilemaskError::ConfigInvalid { ref key, .. } if key == "window"));
        assert!(TileNeighborhood::new(center, MAX_WINDOW + 2).is_err());

        // the widest window still fits; every off-grid cell at zoom 4 is skipped
        let widest = TileNeighborhood::new(center, MAX_WINDOW).unwrap();
        assert_eq!(widest.len(), 256);
    }

    #[test]
    fn test_tile_math_past_max_zoom_does_not_panic() {
        let bounds = tile_bounds(TileIndex::new(0, 0, 70));
        assert_eq!(bounds.min_lon, -180.0);
        let corner = tile_to_point(TileIndex::new(1, 1, u8::MAX));
        assert!(corner.lon.is_finite());
    }
}
