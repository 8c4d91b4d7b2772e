//! Brush compositor for splat strokes
//!
//! A [`BrushStroke`] is a soft circular mark in buffer space. The
//! [`CpuCompositor`] renders it onto a [`TiledSurface`] through a scratch
//! copy of the affected region, so the pass never reads pixels it has
//! already written. [`BrushUniforms`] carries the same parameters for a GPU
//! pass.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use splat_config::PaintSettings;
use tracing::debug;

use crate::constants::HARD_EDGE_THRESHOLD;
use crate::surface::blend_over;
use crate::tiles::{PixelRect, TiledSurface};

/// An ephemeral paint request, consumed by a compositor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BrushStroke {
    /// Center in buffer space, [0,1] x [0,1]
    pub center: Vec2,
    /// Radius in buffer-space (UV) units
    pub radius: f32,
    /// Straight RGBA
    pub color: [f32; 4],
    /// Fraction of the radius painted at full strength
    pub hardness: f32,
    /// Speckle amount
    pub noise: f32,
    /// Speckle pattern seed
    pub seed: u32,
}

/// Uniform block for a GPU brush pass (std140-compatible, 48 bytes)
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct BrushUniforms {
    /// (u, v, radius, 0)
    pub brush_uvr: [f32; 4],
    pub brush_color: [f32; 4],
    pub hardness: f32,
    pub noise: f32,
    pub seed: u32,
    pub _padding: u32,
}

impl From<&BrushStroke> for BrushUniforms {
    fn from(stroke: &BrushStroke) -> Self {
        Self {
            brush_uvr: [stroke.center.x, stroke.center.y, stroke.radius, 0.0],
            brush_color: stroke.color,
            hardness: stroke.hardness,
            noise: stroke.noise,
            seed: stroke.seed,
            _padding: 0,
        }
    }
}

/// Immutable compositor parameters, built once and shared by every surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompositorConfig {
    pub hardness: f32,
    pub noise: f32,
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self::from(&PaintSettings::default())
    }
}

impl From<&PaintSettings> for CompositorConfig {
    fn from(settings: &PaintSettings) -> Self {
        Self {
            hardness: settings.hardness.clamp(0.0, 1.0),
            noise: settings.noise.clamp(0.0, 1.0),
        }
    }
}

/// Something that can deposit a stroke onto a canvas
pub trait StrokeCompositor: Send + Sync {
    /// Defaults applied to strokes prepared for this compositor
    fn config(&self) -> &CompositorConfig;

    /// Composite one stroke. Returns the touched pixel rectangle, or None
    /// if the stroke fell entirely outside the canvas.
    fn composite(&self, canvas: &mut TiledSurface, stroke: &BrushStroke) -> Option<PixelRect>;
}

/// Reference CPU implementation of the brush pass
#[derive(Debug, Clone, Default)]
pub struct CpuCompositor {
    config: CompositorConfig,
}

impl CpuCompositor {
    pub fn new(config: CompositorConfig) -> Self {
        Self { config }
    }
}

impl StrokeCompositor for CpuCompositor {
    fn config(&self) -> &CompositorConfig {
        &self.config
    }

    fn composite(&self, canvas: &mut TiledSurface, stroke: &BrushStroke) -> Option<PixelRect> {
        let width = canvas.width() as f32;
        let height = canvas.height() as f32;

        // Buffer-space radius is relative to the canvas edge
        let radius_px = stroke.radius * width;
        if !radius_px.is_finite() || radius_px <= 0.0 {
            return None;
        }

        let center_x = stroke.center.x * width;
        let center_y = (1.0 - stroke.center.y) * height;

        let x_min = (center_x - radius_px).floor().max(0.0) as u32;
        let y_min = (center_y - radius_px).floor().max(0.0) as u32;
        let x_max = (center_x + radius_px).ceil().max(0.0) as u32;
        let y_max = (center_y + radius_px).ceil().max(0.0) as u32;

        let rect = canvas.clamp_rect(PixelRect {
            x: x_min,
            y: y_min,
            width: x_max.saturating_sub(x_min),
            height: y_max.saturating_sub(y_min),
        });
        if rect.is_empty() {
            return None;
        }

        // canvas -> scratch, then scratch + brush -> canvas
        let scratch = canvas.get_region_data(rect);
        let mut output = Vec::with_capacity(scratch.len());
        let rgb = [stroke.color[0], stroke.color[1], stroke.color[2]];

        for (i, &base) in scratch.iter().enumerate() {
            let px = rect.x + (i as u32 % rect.width);
            let py = rect.y + (i as u32 / rect.width);

            let dx = (px as f32 + 0.5) - center_x;
            let dy = (py as f32 + 0.5) - center_y;
            let distance = (dx * dx + dy * dy).sqrt() / radius_px;

            let mask = edge_falloff(distance, stroke.hardness)
                * (1.0 - stroke.noise * speckle(px, py, stroke.seed));
            let alpha = mask * stroke.color[3];

            output.push(if alpha > 0.0 {
                blend_over(base, rgb, alpha)
            } else {
                base
            });
        }

        canvas.write_region(rect, &output);

        debug!(
            "CpuCompositor::composite: uv=({:.3}, {:.3}) r={:.1}px rect={}x{}@({}, {})",
            stroke.center.x, stroke.center.y, radius_px, rect.width, rect.height, rect.x, rect.y
        );

        Some(rect)
    }
}

/// Circular mask: 1.0 inside `hardness`, linear fade to 0.0 at the rim.
/// `distance_normalized` is 0 at center, 1 at the radius.
#[inline]
pub fn edge_falloff(distance_normalized: f32, hardness: f32) -> f32 {
    if distance_normalized >= 1.0 {
        return 0.0;
    }
    let hardness = hardness.clamp(0.0, 1.0);
    if hardness >= HARD_EDGE_THRESHOLD || distance_normalized <= hardness {
        return 1.0;
    }
    ((1.0 - distance_normalized) / (1.0 - hardness)).clamp(0.0, 1.0)
}

/// Per-pixel speckle value in [0, 1), stable for a given seed.
#[inline]
pub fn speckle(x: u32, y: u32, seed: u32) -> f32 {
    let mut h = x.wrapping_mul(0x8da6_b343) ^ y.wrapping_mul(0xd816_3841) ^ seed.wrapping_mul(0xcb1a_b31f);
    h ^= h >> 16;
    h = h.wrapping_mul(0x7feb_352d);
    h ^= h >> 15;
    h = h.wrapping_mul(0x846c_a68b);
    h ^= h >> 16;
    (h >> 8) as f32 / (1u32 << 24) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas() -> TiledSurface {
        TiledSurface::try_new(128, 128, 32).unwrap()
    }

    fn stroke(noise: f32) -> BrushStroke {
        BrushStroke {
            center: Vec2::splat(0.5),
            radius: 0.1,
            color: [1.0, 0.0, 0.0, 1.0],
            hardness: 0.7,
            noise,
            seed: 7,
        }
    }

    #[test]
    fn test_edge_falloff() {
        assert_eq!(edge_falloff(0.0, 0.7), 1.0);
        assert_eq!(edge_falloff(0.7, 0.7), 1.0);
        assert!((edge_falloff(0.85, 0.7) - 0.5).abs() < 1e-5);
        assert_eq!(edge_falloff(1.0, 0.7), 0.0);
        assert_eq!(edge_falloff(0.99, 1.0), 1.0);

        // Soft brush fades from the middle
        assert!((edge_falloff(0.5, 0.0) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_speckle_range_and_stability() {
        for i in 0..1000 {
            let s = speckle(i, i * 3, 11);
            assert!((0.0..1.0).contains(&s));
            assert_eq!(s, speckle(i, i * 3, 11));
        }
        assert_ne!(speckle(5, 5, 1), speckle(5, 5, 2));
    }

    #[test]
    fn test_composite_paints_center_only() {
        let mut canvas = canvas();
        let rect = CpuCompositor::default().composite(&mut canvas, &stroke(0.0)).unwrap();

        // 0.1 UV on 128 px = 12.8 px radius
        assert!(rect.width <= 27 && rect.height <= 27);
        let center = canvas.surface().get_pixel(64, 64).unwrap();
        assert!((center[0] - 1.0).abs() < 1e-5);
        assert!((center[3] - 1.0).abs() < 1e-5);

        assert_eq!(canvas.surface().get_pixel(64, 90), Some([0.0, 0.0, 0.0, 0.0]));
        assert!(canvas.has_dirty_tiles());
    }

    #[test]
    fn test_noise_never_empties_footprint() {
        let mut clean = canvas();
        let mut noisy = canvas();
        CpuCompositor::default().composite(&mut clean, &stroke(0.0));
        CpuCompositor::default().composite(&mut noisy, &stroke(0.35));

        for (a, b) in clean.surface().pixels().iter().zip(noisy.surface().pixels()) {
            assert_eq!(a[3] > 0.0, b[3] > 0.0);
            assert!(b[3] <= a[3] + 1e-6);
        }
    }

    #[test]
    fn test_stroke_outside_canvas() {
        let mut canvas = canvas();
        let mut s = stroke(0.0);
        s.center = Vec2::new(3.0, 3.0);
        assert!(CpuCompositor::default().composite(&mut canvas, &s).is_none());
        assert!(!canvas.has_dirty_tiles());
    }

    #[test]
    fn test_uniforms_layout() {
        let uniforms = BrushUniforms::from(&stroke(0.35));
        assert_eq!(std::mem::size_of::<BrushUniforms>(), 48);
        assert_eq!(uniforms.brush_uvr, [0.5, 0.5, 0.1, 0.0]);
        assert_eq!(bytemuck::bytes_of(&uniforms).len(), 48);
    }
}
