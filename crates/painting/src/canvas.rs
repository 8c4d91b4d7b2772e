//! Paintable surfaces: a canvas bound to one object's geometry.
//!
//! World-space paint requests are mapped to buffer space by probing the
//! surface's own mesh, then handed to the shared compositor.

use std::sync::Arc;

use glam::{Vec2, Vec3};
use splat_config::PaintSettings;
use tracing::{debug, warn};

use crate::brush::{BrushStroke, StrokeCompositor};
use crate::constants::MIN_STROKE_RADIUS_UV;
use crate::geometry::{SurfaceMesh, Transform};
use crate::raycast::cast_placed_mesh;
use crate::tiles::{DirtyRegion, PixelRect, TiledSurface};
use crate::types::SurfaceId;
use crate::validation::{validate_color, validate_radius, StrokeError};

/// UV ray parameters for world-to-UV mapping
#[derive(Debug, Clone, Copy)]
pub struct UvCastSettings {
    pub offset: f32,
    pub length: f32,
}

impl From<&PaintSettings> for UvCastSettings {
    fn from(settings: &PaintSettings) -> Self {
        Self {
            offset: settings.uv_cast_offset,
            length: settings.uv_cast_length,
        }
    }
}

/// One paintable object: geometry, current transform and an exclusively owned canvas.
///
/// The canvas is allocated in [`PaintableSurface::new`] and released when the
/// surface is dropped. If allocation fails the surface still exists but
/// every paint request is refused.
pub struct PaintableSurface {
    id: SurfaceId,
    mesh: SurfaceMesh,
    transform: Transform,
    canvas: Option<TiledSurface>,
    compositor: Arc<dyn StrokeCompositor>,
    uv_cast: UvCastSettings,
    stroke_counter: u32,
}

impl PaintableSurface {
    pub fn new(
        id: SurfaceId,
        mesh: SurfaceMesh,
        transform: Transform,
        compositor: Arc<dyn StrokeCompositor>,
        settings: &PaintSettings,
    ) -> Self {
        let canvas = match TiledSurface::try_new(
            settings.canvas_size,
            settings.canvas_size,
            settings.tile_size,
        ) {
            Ok(canvas) => Some(canvas),
            Err(err) => {
                warn!("Surface {:?}: paint disabled, canvas unavailable: {}", id, err);
                None
            }
        };

        Self {
            id,
            mesh,
            transform,
            canvas,
            compositor,
            uv_cast: UvCastSettings::from(settings),
            stroke_counter: 0,
        }
    }

    #[inline]
    pub fn id(&self) -> SurfaceId {
        self.id
    }

    #[inline]
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
    }

    /// Whether this surface accumulates paint at all
    #[inline]
    pub fn has_canvas(&self) -> bool {
        self.canvas.is_some()
    }

    pub fn canvas(&self) -> Option<&TiledSurface> {
        self.canvas.as_ref()
    }

    /// Map a world point to buffer space by probing this surface's mesh.
    ///
    /// The UV ray starts just outside the surface along `world_normal` and
    /// points back into it. A degenerate normal falls back to probing from
    /// the point toward the surface origin.
    pub fn map_to_uv(&self, world_point: Vec3, world_normal: Vec3) -> Option<Vec2> {
        let normal = match world_normal.try_normalize() {
            Some(n) => n,
            None => (world_point - self.transform.translation).try_normalize()?,
        };

        let origin = world_point + normal * self.uv_cast.offset;
        let hit = cast_placed_mesh(
            origin,
            -normal,
            self.uv_cast.length,
            &self.mesh,
            &self.transform,
        )?;
        Some(hit.uv.clamp(Vec2::ZERO, Vec2::ONE))
    }

    /// Convert a world-space radius to buffer space (see [`Transform::lossy_xz_scale`])
    pub fn radius_to_uv(&self, radius_meters: f32) -> f32 {
        let scale = self.transform.lossy_xz_scale().max(f32::EPSILON);
        (radius_meters / scale).max(MIN_STROKE_RADIUS_UV)
    }

    /// Build the stroke `paint_at` would apply, without touching the canvas.
    ///
    /// Returns `Ok(None)` when the point does not map onto this surface or
    /// the surface has no canvas.
    pub fn prepare_stroke(
        &mut self,
        world_point: Vec3,
        world_normal: Vec3,
        color: [f32; 4],
        radius_meters: f32,
    ) -> Result<Option<BrushStroke>, StrokeError> {
        validate_radius(radius_meters)?;
        validate_color(color)?;

        if self.canvas.is_none() {
            return Ok(None);
        }

        let Some(center) = self.map_to_uv(world_point, world_normal) else {
            debug!(
                "Surface {:?}: UV ray missed at ({:.3}, {:.3}, {:.3}), skipping",
                self.id, world_point.x, world_point.y, world_point.z
            );
            return Ok(None);
        };

        let config = *self.compositor.config();
        self.stroke_counter = self.stroke_counter.wrapping_add(1);

        Ok(Some(BrushStroke {
            center,
            radius: self.radius_to_uv(radius_meters),
            color,
            hardness: config.hardness,
            noise: config.noise,
            seed: self.id.0.wrapping_mul(0x9e37_79b9) ^ self.stroke_counter,
        }))
    }

    /// Composite a prepared stroke onto this surface's canvas
    pub fn apply_stroke(&mut self, stroke: &BrushStroke) -> Option<PixelRect> {
        let canvas = self.canvas.as_mut()?;
        self.compositor.composite(canvas, stroke)
    }

    /// Paint a soft mark at a world point. Returns true if the canvas changed.
    pub fn paint_at(
        &mut self,
        world_point: Vec3,
        world_normal: Vec3,
        color: [f32; 4],
        radius_meters: f32,
    ) -> Result<bool, StrokeError> {
        let Some(stroke) = self.prepare_stroke(world_point, world_normal, color, radius_meters)?
        else {
            return Ok(false);
        };
        Ok(self.apply_stroke(&stroke).is_some())
    }

    /// Paint coverage (alpha) at a buffer coordinate
    pub fn coverage_at(&self, uv: Vec2) -> Option<f32> {
        self.canvas.as_ref()?.surface().alpha_at_uv(uv.x, uv.y)
    }

    /// Drain modified tiles for texture upload
    pub fn take_dirty_regions(&mut self) -> Vec<DirtyRegion> {
        self.canvas
            .as_mut()
            .map(TiledSurface::take_dirty_regions)
            .unwrap_or_default()
    }
}
