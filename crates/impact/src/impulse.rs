//! Radial and recoil impulses.

use glam::Vec3;
use splat_config::SplashSettings;
use tracing::debug;

use crate::error::ImpulseError;
use crate::physics::{BodyHandle, CollisionEvent, PhysicsWorld, SpatialQuery};

/// A momentum change scheduled or applied on one body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AppliedImpulse {
    pub body: BodyHandle,
    pub impulse: Vec3,
    pub point: Vec3,
}

/// Linear falloff: full strength at the center, zero at `radius`
#[inline]
pub fn falloff(distance: f32, radius: f32) -> f32 {
    (1.0 - distance / radius).clamp(0.0, 1.0)
}

#[derive(Debug, Clone, Copy)]
pub struct ImpulseDistributor {
    /// Lowers the apparent explosion center so bodies get lifted
    upwards_modifier: f32,
}

impl ImpulseDistributor {
    pub fn new(upwards_modifier: f32) -> Self {
        Self { upwards_modifier }
    }

    /// Impulses a radial blast would apply, without applying them.
    ///
    /// Every dynamic body with a collider overlapping the sphere gets one
    /// impulse of `magnitude * (1 - d / radius)`, where `d` is the distance
    /// from `center` to the closest point on the collider. Static colliders
    /// and `exclude` are skipped.
    pub fn plan_radial_impulse(
        &self,
        world: &impl SpatialQuery,
        center: Vec3,
        radius: f32,
        magnitude: f32,
        exclude: Option<BodyHandle>,
    ) -> Result<Vec<AppliedImpulse>, ImpulseError> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(ImpulseError::InvalidRadius(radius));
        }
        if !magnitude.is_finite() || magnitude < 0.0 {
            return Err(ImpulseError::InvalidMagnitude(magnitude));
        }

        let source = center - Vec3::Y * self.upwards_modifier;
        let mut planned: Vec<AppliedImpulse> = Vec::new();

        for collider in world.query_overlap(center, radius) {
            let Some(body) = world.attached_body(collider) else {
                continue;
            };
            if Some(body) == exclude || planned.iter().any(|p| p.body == body) {
                continue;
            }
            let (Some(closest), Some(mass_center)) =
                (world.closest_point(collider, center), world.center_of_mass(body))
            else {
                continue;
            };

            let strength = magnitude * falloff(center.distance(closest), radius);
            if strength <= 0.0 {
                continue;
            }
            let direction = (mass_center - source).normalize_or(Vec3::Y);
            planned.push(AppliedImpulse {
                body,
                impulse: direction * strength,
                point: closest,
            });
        }
        Ok(planned)
    }

    /// Push every dynamic body near `center` away from it.
    ///
    /// Bodies are gathered before any impulse is applied, so the order of
    /// application cannot change who is affected.
    pub fn apply_radial_impulse(
        &self,
        world: &mut impl PhysicsWorld,
        center: Vec3,
        radius: f32,
        magnitude: f32,
        exclude: Option<BodyHandle>,
    ) -> Result<Vec<AppliedImpulse>, ImpulseError> {
        let planned = self.plan_radial_impulse(&*world, center, radius, magnitude, exclude)?;
        for applied in &planned {
            world.apply_impulse_at_point(applied.body, applied.impulse, applied.point);
        }
        if !planned.is_empty() {
            debug!(
                "Radial impulse at ({:.2}, {:.2}, {:.2}) r={:.2}: {} bodies",
                center.x, center.y, center.z, radius, planned.len()
            );
        }
        Ok(planned)
    }

    /// Push the struck body along the direction of impact.
    ///
    /// Nothing happens for static colliders or a zero relative velocity.
    pub fn apply_recoil(
        &self,
        world: &mut impl PhysicsWorld,
        event: &CollisionEvent,
        magnitude: f32,
    ) -> Option<AppliedImpulse> {
        if !magnitude.is_finite() || magnitude <= 0.0 {
            return None;
        }
        let body = world.attached_body(event.struck)?;
        let direction = (-event.relative_velocity).try_normalize()?;

        let applied = AppliedImpulse {
            body,
            impulse: direction * magnitude,
            point: event.contact_point,
        };
        world.apply_impulse_at_point(applied.body, applied.impulse, applied.point);
        Some(applied)
    }
}

impl From<&SplashSettings> for ImpulseDistributor {
    fn from(settings: &SplashSettings) -> Self {
        Self::new(settings.upwards_modifier)
    }
}
