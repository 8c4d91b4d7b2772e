//! Surface registry with per-surface stroke queues
//!
//! Owns every [`PaintableSurface`] and decides when prepared strokes reach
//! their canvas. In [`CompositeMode::Deferred`] strokes queue per surface and
//! are applied first-in-first-applied on [`SurfaceRegistry::flush`]; queues
//! of different surfaces are independent and may be drained in parallel.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use glam::Vec3;
use splat_config::PaintSettings;
use tracing::debug;

use crate::brush::{BrushStroke, CompositorConfig, CpuCompositor, StrokeCompositor};
use crate::canvas::PaintableSurface;
use crate::geometry::{SurfaceMesh, Transform};
use crate::types::{CompositeMode, SurfaceId};
use crate::validation::StrokeError;

struct SurfaceSlot {
    surface: PaintableSurface,
    pending: VecDeque<BrushStroke>,
}

impl SurfaceSlot {
    fn drain(&mut self) -> usize {
        let mut applied = 0;
        while let Some(stroke) = self.pending.pop_front() {
            if self.surface.apply_stroke(&stroke).is_some() {
                applied += 1;
            }
        }
        applied
    }
}

/// Result of a deferred flush
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushStats {
    /// Strokes that changed a canvas
    pub applied: usize,
    /// Surfaces that had queued strokes
    pub surfaces: usize,
}

pub struct SurfaceRegistry {
    settings: PaintSettings,
    compositor: Arc<dyn StrokeCompositor>,
    mode: CompositeMode,
    surfaces: HashMap<SurfaceId, SurfaceSlot>,
    next_id: u32,
}

impl SurfaceRegistry {
    /// Registry using the CPU compositor configured from `settings`
    pub fn new(settings: &PaintSettings, mode: CompositeMode) -> Self {
        let compositor = Arc::new(CpuCompositor::new(CompositorConfig::from(settings)));
        Self::with_compositor(settings, compositor, mode)
    }

    pub fn with_compositor(
        settings: &PaintSettings,
        compositor: Arc<dyn StrokeCompositor>,
        mode: CompositeMode,
    ) -> Self {
        Self {
            settings: settings.clone(),
            compositor,
            mode,
            surfaces: HashMap::new(),
            next_id: 1,
        }
    }

    /// Create a surface and allocate its canvas
    pub fn add_surface(&mut self, mesh: SurfaceMesh, transform: Transform) -> SurfaceId {
        let id = SurfaceId(self.next_id);
        self.next_id += 1;

        let surface = PaintableSurface::new(
            id,
            mesh,
            transform,
            Arc::clone(&self.compositor),
            &self.settings,
        );
        self.surfaces.insert(
            id,
            SurfaceSlot {
                surface,
                pending: VecDeque::new(),
            },
        );
        id
    }

    /// Destroy a surface, releasing its canvas and dropping queued strokes
    pub fn remove_surface(&mut self, id: SurfaceId) -> bool {
        match self.surfaces.remove(&id) {
            Some(slot) => {
                if !slot.pending.is_empty() {
                    debug!("Surface {:?} removed with {} queued strokes", id, slot.pending.len());
                }
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: SurfaceId) -> Option<&PaintableSurface> {
        self.surfaces.get(&id).map(|slot| &slot.surface)
    }

    pub fn set_transform(&mut self, id: SurfaceId, transform: Transform) {
        if let Some(slot) = self.surfaces.get_mut(&id) {
            slot.surface.set_transform(transform);
        }
    }

    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }

    /// Paint onto one surface.
    ///
    /// Returns Ok(true) when the stroke was composited (immediate mode) or
    /// queued (deferred mode); Ok(false) when the surface is unknown, has no
    /// canvas or the point did not map onto it.
    pub fn paint_at(
        &mut self,
        id: SurfaceId,
        world_point: Vec3,
        world_normal: Vec3,
        color: [f32; 4],
        radius_meters: f32,
    ) -> Result<bool, StrokeError> {
        let Some(slot) = self.surfaces.get_mut(&id) else {
            return Ok(false);
        };

        match self.mode {
            CompositeMode::Immediate => {
                slot.surface
                    .paint_at(world_point, world_normal, color, radius_meters)
            }
            CompositeMode::Deferred => {
                let stroke =
                    slot.surface
                        .prepare_stroke(world_point, world_normal, color, radius_meters)?;
                match stroke {
                    Some(stroke) => {
                        slot.pending.push_back(stroke);
                        Ok(true)
                    }
                    None => Ok(false),
                }
            }
        }
    }

    /// Strokes waiting for the next flush
    pub fn pending_count(&self) -> usize {
        self.surfaces.values().map(|slot| slot.pending.len()).sum()
    }

    /// Apply all queued strokes, preserving per-surface order
    pub fn flush(&mut self) -> FlushStats {
        let surfaces = self
            .surfaces
            .values()
            .filter(|slot| !slot.pending.is_empty())
            .count();
        if surfaces == 0 {
            return FlushStats::default();
        }

        #[cfg(feature = "parallel")]
        let applied: usize = {
            use rayon::prelude::*;
            self.surfaces
                .par_iter_mut()
                .map(|(_, slot)| slot.drain())
                .sum()
        };

        #[cfg(not(feature = "parallel"))]
        let applied: usize = self.surfaces.values_mut().map(SurfaceSlot::drain).sum();

        debug!("SurfaceRegistry::flush: {} strokes on {} surfaces", applied, surfaces);
        FlushStats { applied, surfaces }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    const RED: [f32; 4] = [1.0, 0.0, 0.0, 0.5];

    fn settings() -> PaintSettings {
        PaintSettings {
            canvas_size: 128,
            tile_size: 32,
            ..Default::default()
        }
    }

    #[test]
    fn test_immediate_paints_in_call() {
        let mut registry = SurfaceRegistry::new(&settings(), CompositeMode::Immediate);
        let id = registry.add_surface(SurfaceMesh::plane(10.0), Transform::IDENTITY);

        assert!(registry.paint_at(id, Vec3::ZERO, Vec3::Y, RED, 0.3).unwrap());
        assert_eq!(registry.pending_count(), 0);
        assert!(registry.get(id).unwrap().coverage_at(Vec2::splat(0.5)).unwrap() > 0.0);
    }

    #[test]
    fn test_deferred_waits_for_flush() {
        let mut registry = SurfaceRegistry::new(&settings(), CompositeMode::Deferred);
        let floor = registry.add_surface(SurfaceMesh::plane(10.0), Transform::IDENTITY);
        let wall = registry.add_surface(
            SurfaceMesh::plane(10.0),
            Transform::from_translation(Vec3::new(0.0, 3.0, 0.0)),
        );

        assert!(registry.paint_at(floor, Vec3::ZERO, Vec3::Y, RED, 0.3).unwrap());
        assert!(registry.paint_at(floor, Vec3::ZERO, Vec3::Y, RED, 0.3).unwrap());
        assert!(registry.paint_at(wall, Vec3::new(0.0, 3.0, 0.0), Vec3::Y, RED, 0.3).unwrap());
        assert_eq!(registry.pending_count(), 3);
        assert_eq!(registry.get(floor).unwrap().coverage_at(Vec2::splat(0.5)), Some(0.0));

        let stats = registry.flush();
        assert_eq!(stats, FlushStats { applied: 3, surfaces: 2 });
        assert_eq!(registry.pending_count(), 0);
        assert!(registry.get(floor).unwrap().coverage_at(Vec2::splat(0.5)).unwrap() > 0.5);
    }

    #[test]
    fn test_deferred_matches_immediate_result() {
        let strokes = [
            (Vec3::ZERO, [1.0, 0.0, 0.0, 0.6]),
            (Vec3::new(0.2, 0.0, 0.0), [0.0, 1.0, 0.0, 0.6]),
            (Vec3::new(0.1, 0.0, 0.1), [0.0, 0.0, 1.0, 0.6]),
        ];

        let mut immediate = SurfaceRegistry::new(&settings(), CompositeMode::Immediate);
        let mut deferred = SurfaceRegistry::new(&settings(), CompositeMode::Deferred);
        let a = immediate.add_surface(SurfaceMesh::plane(10.0), Transform::IDENTITY);
        let b = deferred.add_surface(SurfaceMesh::plane(10.0), Transform::IDENTITY);

        for (point, color) in strokes {
            immediate.paint_at(a, point, Vec3::Y, color, 0.4).unwrap();
            deferred.paint_at(b, point, Vec3::Y, color, 0.4).unwrap();
        }
        deferred.flush();

        let lhs = immediate.get(a).unwrap().canvas().unwrap().surface().pixels();
        let rhs = deferred.get(b).unwrap().canvas().unwrap().surface().pixels();
        assert_eq!(lhs, rhs);
    }

    #[test]
    fn test_unknown_and_removed_surfaces() {
        let mut registry = SurfaceRegistry::new(&settings(), CompositeMode::Deferred);
        let id = registry.add_surface(SurfaceMesh::cube(), Transform::IDENTITY);
        assert!(!registry.paint_at(SurfaceId(99), Vec3::ZERO, Vec3::Y, RED, 0.1).unwrap());

        registry.paint_at(id, Vec3::new(0.0, 0.5, 0.0), Vec3::Y, RED, 0.1).unwrap();
        assert!(registry.remove_surface(id));
        assert!(!registry.remove_surface(id));
        assert_eq!(registry.pending_count(), 0);
        assert_eq!(registry.flush(), FlushStats::default());
    }

    #[test]
    fn test_miss_is_not_queued() {
        let mut registry = SurfaceRegistry::new(&settings(), CompositeMode::Deferred);
        let id = registry.add_surface(SurfaceMesh::plane(10.0), Transform::IDENTITY);
        assert!(!registry.paint_at(id, Vec3::new(0.0, 4.0, 0.0), Vec3::Y, RED, 0.1).unwrap());
        assert_eq!(registry.pending_count(), 0);
    }
}
