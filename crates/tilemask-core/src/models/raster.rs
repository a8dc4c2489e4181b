//! Pixel containers: the binary footprint mask and the fetched tile image.

/// Square binary occupancy grid
///
/// Cells hold either [`RasterMask::EMPTY`] or [`RasterMask::OCCUPIED`], which
/// is also the byte written to the grayscale mask file. Row 0 is the northern
/// edge of the tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterMask {
    size: u32,
    cells: Vec<u8>,
}

impl RasterMask {
    pub const EMPTY: u8 = 0;
    pub const OCCUPIED: u8 = 255;

    /// All-empty mask of `size x size` cells
    pub fn new(size: u32) -> Self {
        let len = size as usize * size as usize;
        Self { size, cells: vec![Self::EMPTY; len] }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn get(&self, row: u32, col: u32) -> bool {
        self.cells[self.offset(row, col)] == Self::OCCUPIED
    }

    pub fn set(&mut self, row: u32, col: u32) {
        let offset = self.offset(row, col);
        self.cells[offset] = Self::OCCUPIED;
    }

    /// Mark `cols` of `row` occupied; the range is clipped to the canvas
    pub fn fill_span(&mut self, row: u32, cols: std::ops::Range<u32>) {
        if row >= self.size {
            return;
        }
        let end = cols.end.min(self.size);
        if cols.start >= end {
            return;
        }
        let start = self.offset(row, cols.start);
        let stop = self.offset(row, end - 1) + 1;
        self.cells[start..stop].fill(Self::OCCUPIED);
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c == Self::OCCUPIED).count()
    }

    /// Share of occupied cells in `[0, 1]`
    pub fn occupied_ratio(&self) -> f64 {
        if self.cells.is_empty() {
            return 0.0;
        }
        self.occupied_count() as f64 / self.cells.len() as f64
    }

    pub fn is_fully_occupied(&self) -> bool {
        self.cells.iter().all(|&c| c == Self::OCCUPIED)
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(|&c| c == Self::EMPTY)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.cells
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.cells
    }

    fn offset(&self, row: u32, col: u32) -> usize {
        row as usize * self.size as usize + col as usize
    }
}

/// Decoded tile raster, RGB8, row-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl TileImage {
    /// Wrap raw RGB8 pixels; `None` when the buffer length does not match
    pub fn from_rgb(width: u32, height: u32, pixels: Vec<u8>) -> Option<Self> {
        if pixels.len() != width as usize * height as usize * 3 {
            return None;
        }
        Some(Self { width, height, pixels })
    }

    /// Uniformly colored image
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let pixels = rgb.repeat(width as usize * height as usize);
        Self { width, height, pixels }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_square(&self) -> bool {
        self.width == self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_mask_is_empty() {
        let mask = RasterMask::new(4);
        assert_eq!(mask.as_bytes().len(), 16);
        assert!(mask.is_empty());
        assert!(!mask.is_fully_occupied());
    }

    #[test]
    fn test_fill_span_clips_to_canvas() {
        let mut mask = RasterMask::new(4);
        mask.fill_span(1, 2..10);
        mask.fill_span(7, 0..4);
        mask.fill_span(0, 3..3);

        assert_eq!(mask.occupied_count(), 2);
        assert!(mask.get(1, 2));
        assert!(mask.get(1, 3));
        assert!(!mask.get(1, 1));
    }

    #[test]
    fn test_occupied_ratio() {
        let mut mask = RasterMask::new(2);
        mask.set(0, 0);
        assert!((mask.occupied_ratio() - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_tile_image_length_check() {
        assert!(TileImage::from_rgb(2, 2, vec![0; 12]).is_some());
        assert!(TileImage::from_rgb(2, 2, vec![0; 11]).is_none());

        let image = TileImage::filled(3, 2, [10, 20, 30]);
        assert_eq!(image.pixels().len(), 18);
        assert_eq!(&image.pixels()[3..6], &[10, 20, 30]);
        assert!(!image.is_square());
    }
}
