//! CPU canvas storage - straight-alpha RGBA f32 pixels

use crate::validation::{validate_canvas_size, CanvasError};

/// An RGBA f32 CPU canvas (Rgba32Float compatible)
/// Pixels hold straight (non-premultiplied) color plus coverage alpha
pub struct CpuSurface {
    /// Surface dimensions
    pub width: u32,
    pub height: u32,
    /// Pixel data in row-major order, each pixel is [r, g, b, a] as f32
    pixels: Vec<[f32; 4]>,
}

impl CpuSurface {
    /// Allocate a transparent surface, reporting allocation failure instead of aborting
    pub fn try_new(width: u32, height: u32) -> Result<Self, CanvasError> {
        validate_canvas_size(width, height)?;
        let pixel_count = (width as usize) * (height as usize);

        let mut pixels = Vec::new();
        pixels
            .try_reserve_exact(pixel_count)
            .map_err(|_| CanvasError::AllocationFailed { pixels: pixel_count })?;
        pixels.resize(pixel_count, [0.0, 0.0, 0.0, 0.0]);

        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Clear the surface to a solid color
    pub fn clear(&mut self, color: [f32; 4]) {
        self.pixels.fill(color);
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some((y as usize) * (self.width as usize) + (x as usize))
    }

    /// Get a pixel at the given coordinates
    /// Returns None if coordinates are out of bounds
    #[inline]
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<[f32; 4]> {
        self.index(x, y).map(|i| self.pixels[i])
    }

    /// Set a pixel at the given coordinates
    /// Does nothing if coordinates are out of bounds
    #[inline]
    pub fn set_pixel(&mut self, x: u32, y: u32, color: [f32; 4]) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = color;
        }
    }

    /// Map a UV coordinate to the pixel containing it.
    /// Row 0 is the top of the texture, i.e. v = 1.
    pub fn uv_to_pixel(&self, u: f32, v: f32) -> Option<(u32, u32)> {
        if !(0.0..=1.0).contains(&u) || !(0.0..=1.0).contains(&v) {
            return None;
        }
        let x = ((u * self.width as f32) as u32).min(self.width - 1);
        let y = (((1.0 - v) * self.height as f32) as u32).min(self.height - 1);
        Some((x, y))
    }

    /// Coverage (alpha) at a UV coordinate
    pub fn alpha_at_uv(&self, u: f32, v: f32) -> Option<f32> {
        let (x, y) = self.uv_to_pixel(u, v)?;
        self.get_pixel(x, y).map(|p| p[3])
    }

    /// Get raw pixel data for GPU upload (Rgba32Float)
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    /// Quantize to RGBA8 for an 8-bit paint texture
    pub fn to_rgba8(&self) -> Vec<u8> {
        pixels_to_rgba8(&self.pixels)
    }

    /// Get the total number of pixels
    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.pixels.len()
    }

    /// Sum of alpha over the canvas, a cheap "how much paint" measure
    pub fn total_coverage(&self) -> f32 {
        self.pixels.iter().map(|p| p[3]).sum()
    }

    #[inline]
    pub fn pixels(&self) -> &[[f32; 4]] {
        &self.pixels
    }

    #[inline]
    pub fn pixels_mut(&mut self) -> &mut [[f32; 4]] {
        &mut self.pixels
    }
}

/// Straight-alpha "over": composites `src` with coverage `src_alpha` onto `dst`.
///
/// Output alpha is `src_alpha + dst_alpha * (1 - src_alpha)`, which is never
/// below `dst_alpha` for `src_alpha` in 0..=1.
#[inline]
pub fn blend_over(dst: [f32; 4], src: [f32; 3], src_alpha: f32) -> [f32; 4] {
    let src_alpha = src_alpha.clamp(0.0, 1.0);
    let dst_weight = dst[3] * (1.0 - src_alpha);
    let out_alpha = src_alpha + dst_weight;
    if out_alpha <= f32::EPSILON {
        return [0.0, 0.0, 0.0, 0.0];
    }
    [
        (src[0] * src_alpha + dst[0] * dst_weight) / out_alpha,
        (src[1] * src_alpha + dst[1] * dst_weight) / out_alpha,
        (src[2] * src_alpha + dst[2] * dst_weight) / out_alpha,
        out_alpha,
    ]
}

/// Convert f32 RGBA pixels to u8 RGBA
pub fn pixels_to_rgba8(pixels: &[[f32; 4]]) -> Vec<u8> {
    let mut output = Vec::with_capacity(pixels.len() * 4);
    for pixel in pixels {
        for channel in pixel {
            output.push((channel.clamp(0.0, 1.0) * 255.0).round() as u8);
        }
    }
    output
}

impl Drop for CpuSurface {
    fn drop(&mut self) {
        tracing::debug!(
            "CpuSurface: releasing {}x{} canvas",
            self.width, self.height
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_surface() {
        let surface = CpuSurface::try_new(100, 100).unwrap();
        assert_eq!(surface.width, 100);
        assert_eq!(surface.height, 100);
        assert_eq!(surface.pixel_count(), 10000);
        assert_eq!(surface.total_coverage(), 0.0);
    }

    #[test]
    fn test_invalid_size_rejected() {
        assert!(matches!(
            CpuSurface::try_new(0, 10),
            Err(CanvasError::InvalidSize { .. })
        ));
    }

    #[test]
    fn test_get_set_pixel() {
        let mut surface = CpuSurface::try_new(10, 10).unwrap();
        let color = [1.0, 0.5, 0.25, 1.0];

        surface.set_pixel(5, 5, color);
        assert_eq!(surface.get_pixel(5, 5), Some(color));

        // Out of bounds should return None
        assert_eq!(surface.get_pixel(100, 100), None);
    }

    #[test]
    fn test_uv_to_pixel_flips_v() {
        let surface = CpuSurface::try_new(10, 10).unwrap();
        assert_eq!(surface.uv_to_pixel(0.0, 1.0), Some((0, 0)));
        assert_eq!(surface.uv_to_pixel(1.0, 0.0), Some((9, 9)));
        assert_eq!(surface.uv_to_pixel(0.55, 0.55), Some((5, 4)));
        assert_eq!(surface.uv_to_pixel(1.5, 0.5), None);
    }

    #[test]
    fn test_blend_over_onto_transparent_keeps_color() {
        let out = blend_over([0.0, 0.0, 0.0, 0.0], [1.0, 0.0, 0.0], 0.5);
        assert!((out[0] - 1.0).abs() < 1e-6);
        assert!((out[3] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_blend_over_accumulates_alpha() {
        let once = blend_over([0.0, 0.0, 0.0, 0.0], [0.0, 0.0, 1.0], 0.4);
        let twice = blend_over(once, [0.0, 0.0, 1.0], 0.4);
        assert!(twice[3] > once[3]);
        assert!((twice[3] - 0.64).abs() < 1e-5);
    }

    #[test]
    fn test_blend_over_on_opaque_white() {
        let out = blend_over([1.0, 1.0, 1.0, 1.0], [1.0, 0.0, 0.0], 0.5);
        assert!((out[0] - 1.0).abs() < 0.01);
        assert!((out[1] - 0.5).abs() < 0.01);
        assert!((out[3] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_byte_views() {
        let surface = CpuSurface::try_new(2, 2).unwrap();
        // 4 pixels * 4 components * 4 bytes per f32 = 64 bytes
        assert_eq!(surface.as_bytes().len(), 64);
        assert_eq!(surface.to_rgba8().len(), 16);
    }
}
