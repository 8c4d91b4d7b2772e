//! Tile data access, region reads and write-back

use super::{PixelRect, TileCoord, TiledSurface};
use crate::surface::pixels_to_rgba8;

/// Dirty region ready for texture upload
#[derive(Debug, Clone)]
pub struct DirtyRegion {
    pub rect: PixelRect,
    /// RGBA8 pixel data (row-major)
    pub data: Vec<u8>,
}

impl TiledSurface {
    /// Get tile bounds in pixel coordinates (edge tiles may be smaller)
    pub fn get_tile_bounds(&self, coord: TileCoord) -> PixelRect {
        let x = coord.x * self.tile_size;
        let y = coord.y * self.tile_size;
        PixelRect {
            x,
            y,
            width: self.tile_size.min(self.surface.width.saturating_sub(x)),
            height: self.tile_size.min(self.surface.height.saturating_sub(y)),
        }
    }

    /// Clamp a rectangle to the canvas
    pub fn clamp_rect(&self, rect: PixelRect) -> PixelRect {
        let x = rect.x.min(self.surface.width);
        let y = rect.y.min(self.surface.height);
        let x_end = rect.x.saturating_add(rect.width).min(self.surface.width);
        let y_end = rect.y.saturating_add(rect.height).min(self.surface.height);
        PixelRect {
            x,
            y,
            width: x_end.saturating_sub(x),
            height: y_end.saturating_sub(y),
        }
    }

    /// Copy a rectangular region out of the canvas (row-major).
    /// The region is clamped to canvas bounds.
    pub fn get_region_data(&self, rect: PixelRect) -> Vec<[f32; 4]> {
        let rect = self.clamp_rect(rect);
        if rect.is_empty() {
            return Vec::new();
        }

        let stride = self.surface.width as usize;
        let pixels = self.surface.pixels();
        let mut data = Vec::with_capacity(rect.area());
        for row in rect.y..rect.y + rect.height {
            let start = row as usize * stride + rect.x as usize;
            data.extend_from_slice(&pixels[start..start + rect.width as usize]);
        }
        data
    }

    /// Write a row-major block back into the canvas and mark it dirty.
    ///
    /// `rect` must already be clamped and `data.len()` must equal its area;
    /// mismatched input is ignored.
    pub fn write_region(&mut self, rect: PixelRect, data: &[[f32; 4]]) {
        if rect.is_empty() || self.clamp_rect(rect) != rect || data.len() != rect.area() {
            return;
        }

        let stride = self.surface.width as usize;
        let width = rect.width as usize;
        let pixels = self.surface.pixels_mut();
        for (row_index, row) in data.chunks_exact(width).enumerate() {
            let start = (rect.y as usize + row_index) * stride + rect.x as usize;
            pixels[start..start + width].copy_from_slice(row);
        }
        self.mark_rect_dirty(rect);
    }

    /// Drain dirty tiles as RGBA8 regions for the render tick
    pub fn take_dirty_regions(&mut self) -> Vec<DirtyRegion> {
        self.take_dirty_tiles()
            .into_iter()
            .map(|tile| {
                let rect = self.get_tile_bounds(tile);
                DirtyRegion {
                    rect,
                    data: pixels_to_rgba8(&self.get_region_data(rect)),
                }
            })
            .collect()
    }
}
