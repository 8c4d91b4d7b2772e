//! Paint capability: which colliders accept paint, and where.
//!
//! Any collider can be struck, but only colliders bound to a surface in
//! the [`SurfaceRegistry`] are paintable. Everything else is
//! [`Capability::NonPaintable`] and paint requests against it are dropped.

use std::collections::HashMap;

use glam::Vec3;
use painting::{SurfaceId, SurfaceMesh, SurfaceRegistry, Transform};
use tracing::{debug, warn};

use crate::physics::{ColliderHandle, Pose, SpatialQuery};

/// Whether a struck collider accepts paint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Paintable(SurfaceId),
    NonPaintable,
}

/// Accepts paint requests addressed by collider
pub trait PaintTarget {
    fn capability(&self, collider: ColliderHandle) -> Capability;

    /// Paint a mark of `radius` meters. Returns true only if `collider`
    /// is paintable and the stroke was accepted.
    fn try_paint(
        &mut self,
        collider: ColliderHandle,
        point: Vec3,
        normal: Vec3,
        color: [f32; 4],
        radius: f32,
    ) -> bool;
}

#[derive(Debug, Clone, Copy)]
struct Binding {
    surface: SurfaceId,
    /// Mesh placement relative to the collider pose
    local: Transform,
}

impl Binding {
    fn world_transform(&self, pose: Pose) -> Transform {
        Transform {
            translation: pose.translation + pose.rotation * self.local.translation,
            rotation: pose.rotation * self.local.rotation,
            scale: self.local.scale,
        }
    }
}

/// Collider to surface bindings over a registry
pub struct PaintTargets {
    registry: SurfaceRegistry,
    bindings: HashMap<ColliderHandle, Binding>,
    /// Rejected strokes per surface; the first one is logged as a warning
    rejected: HashMap<SurfaceId, usize>,
}

impl PaintTargets {
    pub fn new(registry: SurfaceRegistry) -> Self {
        Self {
            registry,
            bindings: HashMap::new(),
            rejected: HashMap::new(),
        }
    }

    /// Strokes refused by a surface for invalid parameters
    pub fn rejected_count(&self, surface: SurfaceId) -> usize {
        self.rejected.get(&surface).copied().unwrap_or(0)
    }

    pub fn registry(&self) -> &SurfaceRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut SurfaceRegistry {
        &mut self.registry
    }

    /// Give a collider a canvas.
    ///
    /// `local` places the mesh relative to the collider; its scale is the
    /// mesh scale in world units. Rebinding a collider replaces its surface.
    pub fn make_paintable(
        &mut self,
        world: &impl SpatialQuery,
        collider: ColliderHandle,
        mesh: SurfaceMesh,
        local: Transform,
    ) -> Option<SurfaceId> {
        let Some(pose) = world.collider_pose(collider) else {
            warn!("Collider {:?} not in world, not made paintable", collider);
            return None;
        };
        self.unbind(collider);

        let mut binding = Binding {
            surface: SurfaceId(0),
            local,
        };
        binding.surface = self
            .registry
            .add_surface(mesh, binding.world_transform(pose));
        self.bindings.insert(collider, binding);
        debug!("Collider {:?} bound to surface {:?}", collider, binding.surface);
        Some(binding.surface)
    }

    /// Drop a collider's surface and canvas
    pub fn unbind(&mut self, collider: ColliderHandle) -> bool {
        match self.bindings.remove(&collider) {
            Some(binding) => {
                self.rejected.remove(&binding.surface);
                self.registry.remove_surface(binding.surface)
            }
            None => false,
        }
    }

    pub fn surface_of(&self, collider: ColliderHandle) -> Option<SurfaceId> {
        self.bindings.get(&collider).map(|b| b.surface)
    }

    /// Copy current collider poses into surface transforms. Bindings whose
    /// collider left the world are released.
    pub fn sync_transforms(&mut self, world: &impl SpatialQuery) {
        let mut gone = Vec::new();
        for (&collider, binding) in &self.bindings {
            match world.collider_pose(collider) {
                Some(pose) => self
                    .registry
                    .set_transform(binding.surface, binding.world_transform(pose)),
                None => gone.push(collider),
            }
        }
        for collider in gone {
            debug!("Collider {:?} removed from world, releasing its canvas", collider);
            self.unbind(collider);
        }
    }
}

impl PaintTarget for PaintTargets {
    fn capability(&self, collider: ColliderHandle) -> Capability {
        self.bindings
            .get(&collider)
            .map_or(Capability::NonPaintable, |b| Capability::Paintable(b.surface))
    }

    fn try_paint(
        &mut self,
        collider: ColliderHandle,
        point: Vec3,
        normal: Vec3,
        color: [f32; 4],
        radius: f32,
    ) -> bool {
        let Capability::Paintable(surface) = self.capability(collider) else {
            return false;
        };
        match self.registry.paint_at(surface, point, normal, color, radius) {
            Ok(accepted) => accepted,
            Err(err) => {
                let count = self.rejected.entry(surface).or_insert(0);
                *count += 1;
                if *count == 1 {
                    warn!("Paint on {:?} rejected: {}", surface, err);
                } else {
                    debug!("Paint on {:?} rejected ({} so far): {}", surface, count, err);
                }
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::{BodyDesc, PhysicsWorld, Shape};
    use crate::rapier_backend::RapierWorld;
    use glam::{Quat, Vec2};
    use painting::CompositeMode;
    use splat_config::{PaintSettings, PhysicsSettings};

    fn targets() -> PaintTargets {
        let settings = PaintSettings {
            canvas_size: 128,
            tile_size: 32,
            ..Default::default()
        };
        PaintTargets::new(SurfaceRegistry::new(&settings, CompositeMode::Immediate))
    }

    fn crate_box(world: &mut RapierWorld, position: Vec3) -> ColliderHandle {
        world
            .spawn(BodyDesc::dynamic(
                Shape::Cuboid {
                    half_extents: Vec3::splat(0.5),
                },
                position,
                1.0,
            ))
            .1
    }

    #[test]
    fn test_unbound_collider_is_not_paintable() {
        let mut world = RapierWorld::new(&PhysicsSettings::default());
        let collider = crate_box(&mut world, Vec3::ZERO);
        let mut targets = targets();

        assert_eq!(targets.capability(collider), Capability::NonPaintable);
        assert!(!targets.try_paint(collider, Vec3::new(0.0, 0.5, 0.0), Vec3::Y, [1.0; 4], 0.1));
    }

    #[test]
    fn test_bound_collider_accepts_paint() {
        let mut world = RapierWorld::new(&PhysicsSettings::default());
        let collider = crate_box(&mut world, Vec3::new(2.0, 0.5, 0.0));
        let mut targets = targets();
        let surface = targets
            .make_paintable(&world, collider, SurfaceMesh::cube(), Transform::IDENTITY)
            .unwrap();

        assert_eq!(targets.capability(collider), Capability::Paintable(surface));
        assert!(targets.try_paint(collider, Vec3::new(2.0, 1.0, 0.0), Vec3::Y, [1.0; 4], 0.1));
        let coverage = targets.registry().get(surface).unwrap().coverage_at(Vec2::splat(0.5));
        assert!(coverage.unwrap() > 0.5);

        // Invalid radius is refused rather than propagated
        assert!(!targets.try_paint(collider, Vec3::new(2.0, 1.0, 0.0), Vec3::Y, [1.0; 4], -1.0));
    }

    #[test]
    fn test_rejected_strokes_are_counted_per_surface() {
        let mut world = RapierWorld::new(&PhysicsSettings::default());
        let collider = crate_box(&mut world, Vec3::new(2.0, 0.5, 0.0));
        let other = crate_box(&mut world, Vec3::new(-2.0, 0.5, 0.0));
        let mut targets = targets();
        let surface = targets
            .make_paintable(&world, collider, SurfaceMesh::cube(), Transform::IDENTITY)
            .unwrap();
        let other_surface = targets
            .make_paintable(&world, other, SurfaceMesh::cube(), Transform::IDENTITY)
            .unwrap();

        let top = Vec3::new(2.0, 1.0, 0.0);
        for _ in 0..3 {
            assert!(!targets.try_paint(collider, top, Vec3::Y, [1.0; 4], 0.0));
        }
        assert!(!targets.try_paint(collider, top, Vec3::Y, [1.5, 0.0, 0.0, 1.0], 0.1));
        assert_eq!(targets.rejected_count(surface), 4);
        assert_eq!(targets.rejected_count(other_surface), 0);

        // Rejections leave the surface usable
        assert!(targets.try_paint(collider, top, Vec3::Y, [1.0; 4], 0.1));
        assert_eq!(targets.rejected_count(surface), 4);

        targets.unbind(collider);
        assert_eq!(targets.rejected_count(surface), 0);
    }

    #[test]
    fn test_sync_follows_moving_collider() {
        let mut world = RapierWorld::new(&PhysicsSettings::default());
        let collider = crate_box(&mut world, Vec3::new(0.0, 5.0, 0.0));
        let mut targets = targets();
        let surface = targets
            .make_paintable(&world, collider, SurfaceMesh::cube(), Transform::IDENTITY)
            .unwrap();

        for _ in 0..10 {
            world.step(1.0 / 50.0);
        }
        targets.sync_transforms(&world);

        let pose = world.collider_pose(collider).unwrap();
        let transform = *targets.registry().get(surface).unwrap().transform();
        assert!(pose.translation.y < 5.0);
        assert_eq!(transform.translation, pose.translation);
    }

    #[test]
    fn test_local_placement_composes_with_pose() {
        let binding = Binding {
            surface: SurfaceId(1),
            local: Transform::from_translation(Vec3::new(0.0, 0.5, 0.0))
                .with_scale(Vec3::new(4.0, 1.0, 4.0)),
        };
        let pose = Pose {
            translation: Vec3::new(1.0, 0.0, 0.0),
            rotation: Quat::from_rotation_z(std::f32::consts::FRAC_PI_2),
        };
        let world = binding.world_transform(pose);
        assert!((world.translation - Vec3::new(0.5, 0.0, 0.0)).length() < 1e-6);
        assert_eq!(world.scale, Vec3::new(4.0, 1.0, 4.0));
    }

    #[test]
    fn test_removed_collider_releases_surface() {
        let mut world = RapierWorld::new(&PhysicsSettings::default());
        let collider = crate_box(&mut world, Vec3::ZERO);
        let mut targets = targets();
        targets.make_paintable(&world, collider, SurfaceMesh::cube(), Transform::IDENTITY);
        assert_eq!(targets.registry().len(), 1);

        world.remove_body(crate::physics::BodyHandle(collider.0));
        targets.sync_transforms(&world);
        assert!(targets.registry().is_empty());
        assert_eq!(targets.capability(collider), Capability::NonPaintable);
    }
}
