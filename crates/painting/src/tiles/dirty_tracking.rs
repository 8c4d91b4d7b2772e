//! Which tiles changed since the last upload

use super::{PixelRect, TileCoord, TiledSurface};

impl TiledSurface {
    /// Tiles overlapped by a pixel rectangle, row by row
    pub fn tiles_touching(&self, rect: PixelRect) -> impl Iterator<Item = TileCoord> + use<> {
        let rect = self.clamp_rect(rect);
        let size = self.tile_size;
        let (cols, rows) = if rect.is_empty() {
            (1..0, 1..0)
        } else {
            (
                rect.x / size..(rect.x + rect.width - 1) / size + 1,
                rect.y / size..(rect.y + rect.height - 1) / size + 1,
            )
        };
        rows.flat_map(move |y| cols.clone().map(move |x| TileCoord { x, y }))
    }

    /// Flag every tile under `rect` for upload
    pub fn mark_rect_dirty(&mut self, rect: PixelRect) {
        let tiles: Vec<TileCoord> = self.tiles_touching(rect).collect();
        self.dirty_tiles.extend(tiles);
    }

    pub(crate) fn mark_all_dirty(&mut self) {
        for y in 0..self.tiles_y() {
            for x in 0..self.tiles_x() {
                self.dirty_tiles.insert(TileCoord { x, y });
            }
        }
    }

    /// Smallest rectangle covering every dirty tile
    pub fn dirty_bounds(&self) -> Option<PixelRect> {
        let first = self.dirty_tiles.iter().next()?;
        let (mut min, mut max) = ((first.x, first.y), (first.x, first.y));
        for tile in &self.dirty_tiles {
            min = (min.0.min(tile.x), min.1.min(tile.y));
            max = (max.0.max(tile.x), max.1.max(tile.y));
        }
        let low = self.get_tile_bounds(TileCoord { x: min.0, y: min.1 });
        let high = self.get_tile_bounds(TileCoord { x: max.0, y: max.1 });
        Some(PixelRect {
            x: low.x,
            y: low.y,
            width: high.x + high.width - low.x,
            height: high.y + high.height - low.y,
        })
    }

    /// Drain the dirty set in row-major tile order
    pub fn take_dirty_tiles(&mut self) -> Vec<TileCoord> {
        std::mem::take(&mut self.dirty_tiles).into_iter().collect()
    }

    #[inline]
    pub fn has_dirty_tiles(&self) -> bool {
        !self.dirty_tiles.is_empty()
    }

    #[inline]
    pub fn dirty_tile_count(&self) -> usize {
        self.dirty_tiles.len()
    }
}
