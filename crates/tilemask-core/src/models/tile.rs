use serde::{Deserialize, Serialize};
use std::fmt;

/// Highest zoom level accepted by the tile math
pub const MAX_ZOOM: u8 = 24;

/// Widest tile window a neighborhood may span
pub const MAX_WINDOW: u32 = 255;

/// Slippy-map tile address
///
/// `x` grows eastward and `y` grows southward; both lie in `[0, 2^zoom)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileIndex {
    pub x: u32,
    pub y: u32,
    pub zoom: u8,
}

impl TileIndex {
    pub fn new(x: u32, y: u32, zoom: u8) -> Self {
        Self { x, y, zoom }
    }

    /// Number of tiles along one axis at `zoom`
    ///
    /// Saturates at `u64::MAX` for zoom levels past 63.
    pub fn tiles_per_side(zoom: u8) -> u64 {
        1u64.checked_shl(u32::from(zoom)).unwrap_or(u64::MAX)
    }

    pub fn is_valid(&self) -> bool {
        if self.zoom > MAX_ZOOM {
            return false;
        }
        let n = Self::tiles_per_side(self.zoom);
        u64::from(self.x) < n && u64::from(self.y) < n
    }

    /// Neighbor at a signed offset, `None` when it would leave the grid
    pub fn offset(&self, dx: i64, dy: i64) -> Option<TileIndex> {
        if self.zoom > MAX_ZOOM {
            return None;
        }
        let n = Self::tiles_per_side(self.zoom) as i64;
        let x = i64::from(self.x) + dx;
        let y = i64::from(self.y) + dy;
        if (0..n).contains(&x) && (0..n).contains(&y) {
            Some(TileIndex::new(x as u32, y as u32, self.zoom))
        } else {
            None
        }
    }
}

impl fmt::Display for TileIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_zxy() {
        assert_eq!(TileIndex::new(232_801, 103_140, 18).to_string(), "18/232801/103140");
    }

    #[test]
    fn test_offset_stays_on_grid() {
        let corner = TileIndex::new(0, 0, 2);
        assert_eq!(corner.offset(-1, 0), None);
        assert_eq!(corner.offset(0, -1), None);
        assert_eq!(corner.offset(1, 1), Some(TileIndex::new(1, 1, 2)));
        assert_eq!(TileIndex::new(3, 3, 2).offset(1, 0), None);
    }

    #[test]
    fn test_validity() {
        assert!(TileIndex::new(0, 0, 0).is_valid());
        assert!(!TileIndex::new(1, 0, 0).is_valid());
        assert!(TileIndex::new(524_287, 524_287, 19).is_valid());
        assert!(!TileIndex::new(0, 0, MAX_ZOOM + 1).is_valid());
    }

    #[test]
    fn test_tiles_per_side_saturates() {
        assert_eq!(TileIndex::tiles_per_side(0), 1);
        assert_eq!(TileIndex::tiles_per_side(MAX_ZOOM), 16_777_216);
        assert_eq!(TileIndex::tiles_per_side(63), 1 << 63);
        assert_eq!(TileIndex::tiles_per_side(64), u64::MAX);
        assert_eq!(TileIndex::tiles_per_side(u8::MAX), u64::MAX);
        assert!(!TileIndex::new(0, 0, 70).is_valid());
    }
}
