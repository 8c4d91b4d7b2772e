//! Tile management and dirty tracking for paint canvases

mod data_access;
mod dirty_tracking;

use crate::surface::CpuSurface;
use crate::validation::CanvasError;
use std::collections::BTreeSet;

pub use data_access::DirtyRegion;

/// Tile column and row. Ordered row-major.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoord {
    pub x: u32,
    pub y: u32,
}

impl Ord for TileCoord {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.y, self.x).cmp(&(other.y, other.x))
    }
}

impl PartialOrd for TileCoord {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Pixel-space rectangle (x, y, width, height)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    #[inline]
    pub fn area(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }
}

/// Paint canvas split into upload tiles
pub struct TiledSurface {
    pub(crate) surface: CpuSurface,
    pub(crate) tile_size: u32,
    tiles_x: u32,
    tiles_y: u32,
    pub(crate) dirty_tiles: BTreeSet<TileCoord>,
}

impl TiledSurface {
    /// Allocate a tiled canvas with the given dimensions and tile size
    pub fn try_new(width: u32, height: u32, tile_size: u32) -> Result<Self, CanvasError> {
        let surface = CpuSurface::try_new(width, height)?;
        let tile_size = tile_size.max(1);
        let tiles_x = width.div_ceil(tile_size);
        let tiles_y = height.div_ceil(tile_size);

        Ok(Self {
            surface,
            tile_size,
            tiles_x,
            tiles_y,
            dirty_tiles: BTreeSet::new(),
        })
    }

    #[inline]
    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    #[inline]
    pub fn tiles_x(&self) -> u32 {
        self.tiles_x
    }

    #[inline]
    pub fn tiles_y(&self) -> u32 {
        self.tiles_y
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.surface.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.surface.height
    }

    /// Get the underlying surface for direct pixel reads
    #[inline]
    pub fn surface(&self) -> &CpuSurface {
        &self.surface
    }

    /// Clear the canvas to a solid color and mark every tile dirty
    pub fn clear(&mut self, color: [f32; 4]) {
        self.surface.clear(color);
        self.mark_all_dirty();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiled(width: u32, height: u32, tile: u32) -> TiledSurface {
        TiledSurface::try_new(width, height, tile).unwrap()
    }

    #[test]
    fn test_tile_grid_rounds_up() {
        let aligned = tiled(256, 256, 128);
        assert_eq!((aligned.tiles_x(), aligned.tiles_y()), (2, 2));

        let ragged = tiled(300, 200, 128);
        assert_eq!((ragged.tiles_x(), ragged.tiles_y()), (3, 2));
    }

    #[test]
    fn test_stroke_rect_dirties_overlapped_tiles() {
        let mut surface = tiled(256, 256, 128);

        surface.mark_rect_dirty(PixelRect { x: 100, y: 100, width: 56, height: 56 });
        assert_eq!(surface.dirty_tile_count(), 4);

        // Row-major drain order
        let tiles = surface.take_dirty_tiles();
        assert_eq!(tiles[0], TileCoord { x: 0, y: 0 });
        assert_eq!(tiles[1], TileCoord { x: 1, y: 0 });
        assert_eq!(tiles[2], TileCoord { x: 0, y: 1 });
        assert!(!surface.has_dirty_tiles());
    }

    #[test]
    fn test_rect_inside_one_tile() {
        let mut surface = tiled(256, 256, 128);
        surface.mark_rect_dirty(PixelRect { x: 130, y: 2, width: 10, height: 10 });
        assert_eq!(surface.take_dirty_tiles(), vec![TileCoord { x: 1, y: 0 }]);

        surface.mark_rect_dirty(PixelRect { x: 500, y: 0, width: 10, height: 10 });
        assert!(!surface.has_dirty_tiles());
    }

    #[test]
    fn test_dirty_bounds() {
        let mut surface = tiled(300, 300, 128);
        assert_eq!(surface.dirty_bounds(), None);

        surface.mark_rect_dirty(PixelRect { x: 10, y: 200, width: 2, height: 2 });
        surface.mark_rect_dirty(PixelRect { x: 290, y: 290, width: 5, height: 5 });
        assert_eq!(
            surface.dirty_bounds(),
            Some(PixelRect { x: 0, y: 128, width: 300, height: 172 })
        );
    }

    #[test]
    fn test_clear_marks_all_tiles() {
        let mut surface = tiled(300, 300, 128);
        surface.clear([1.0, 1.0, 1.0, 1.0]);
        assert_eq!(surface.dirty_tile_count(), 9);
        assert_eq!(surface.surface().get_pixel(299, 299), Some([1.0, 1.0, 1.0, 1.0]));
    }

    #[test]
    fn test_get_tile_bounds() {
        let surface = tiled(150, 150, 128);

        let bounds = surface.get_tile_bounds(TileCoord { x: 0, y: 0 });
        assert_eq!(bounds, PixelRect { x: 0, y: 0, width: 128, height: 128 });

        let bounds = surface.get_tile_bounds(TileCoord { x: 1, y: 1 });
        assert_eq!(bounds, PixelRect { x: 128, y: 128, width: 22, height: 22 });
    }

    #[test]
    fn test_region_read_write() {
        let mut surface = tiled(64, 64, 32);
        let rect = PixelRect { x: 10, y: 10, width: 4, height: 2 };
        let data = vec![[0.5, 0.5, 0.5, 1.0]; rect.area()];

        surface.write_region(rect, &data);

        assert_eq!(surface.get_region_data(rect), data);
        assert_eq!(surface.surface().get_pixel(9, 10), Some([0.0, 0.0, 0.0, 0.0]));
        assert_eq!(surface.dirty_tile_count(), 1);
    }

    #[test]
    fn test_take_dirty_regions() {
        let mut surface = tiled(150, 150, 128);
        surface.write_region(PixelRect { x: 140, y: 140, width: 2, height: 2 }, &[[1.0; 4]; 4]);

        let regions = surface.take_dirty_regions();
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].rect, PixelRect { x: 128, y: 128, width: 22, height: 22 });
        assert_eq!(regions[0].data.len(), 22 * 22 * 4);
        assert!(!surface.has_dirty_tiles());
    }
}
