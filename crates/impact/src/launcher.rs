//! Launchers: turn a trigger into a projectile spawn request.

use std::sync::Arc;

use glam::{EulerRot, Quat, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use splat_config::{BallLauncherSettings, PaintGunSettings};
use tracing::trace;

use crate::error::LaunchError;
use crate::physics::{BodyDesc, BodyHandle, PhysicsWorld, Shape};

/// Muzzle origin and facing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aim {
    pub origin: Vec3,
    pub forward: Vec3,
}

/// Supplies the current aim each time a launcher fires
pub trait AimSource: Send + Sync {
    fn aim(&self) -> Aim;
}

impl AimSource for Aim {
    fn aim(&self) -> Aim {
        *self
    }
}

/// What the projectile does on impact
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Munition {
    /// Splash paint, then remove itself. `None` fields take splash defaults.
    Paint {
        color: Option<[f32; 4]>,
        splash_count: Option<u32>,
        paint_radius: Option<f32>,
    },
    /// Persist and shove whatever it hits, every time it hits
    Kinetic { recoil_impulse: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaunchRequest {
    pub origin: Vec3,
    pub direction: Vec3,
    pub initial_speed: f32,
    pub mass: f32,
    /// Collider sphere radius
    pub body_radius: f32,
    pub restitution: Option<f32>,
    pub munition: Munition,
}

impl LaunchRequest {
    /// Normalized launch direction, once all physical values check out
    pub fn validated_direction(&self) -> Result<Vec3, LaunchError> {
        if !self.initial_speed.is_finite() || self.initial_speed < 0.0 {
            return Err(LaunchError::InvalidSpeed(self.initial_speed));
        }
        if !self.mass.is_finite() || self.mass <= 0.0 {
            return Err(LaunchError::InvalidMass(self.mass));
        }
        if !self.body_radius.is_finite() || self.body_radius <= 0.0 {
            return Err(LaunchError::InvalidSize(self.body_radius));
        }
        self.direction
            .try_normalize()
            .filter(|_| self.origin.is_finite())
            .ok_or(LaunchError::InvalidDirection)
    }
}

/// Spawn a CCD sphere and give it its launch momentum
pub fn spawn_projectile(
    world: &mut impl PhysicsWorld,
    request: &LaunchRequest,
) -> Result<BodyHandle, LaunchError> {
    let direction = request.validated_direction()?;

    let mut desc = BodyDesc::dynamic(
        Shape::Sphere {
            radius: request.body_radius,
        },
        request.origin,
        request.mass,
    )
    .with_ccd();
    desc.restitution = request.restitution;

    let (body, _) = world.spawn(desc);
    world.apply_impulse(body, direction * request.initial_speed * request.mass);
    trace!("Spawned projectile {:?} at {:?}", body, request.origin);
    Ok(body)
}

fn muzzle(aim: Aim, offset: f32) -> Result<(Vec3, Vec3), LaunchError> {
    let forward = aim
        .forward
        .try_normalize()
        .ok_or(LaunchError::InvalidDirection)?;
    Ok((aim.origin + forward * offset, forward))
}

/// Rapid-fire paintball gun with random spread
pub struct PaintGun<R = StdRng> {
    settings: PaintGunSettings,
    aim: Arc<dyn AimSource>,
    rng: R,
}

impl PaintGun<StdRng> {
    pub fn new(
        settings: PaintGunSettings,
        aim: Option<Arc<dyn AimSource>>,
    ) -> Result<Self, LaunchError> {
        Self::with_rng(settings, aim, StdRng::from_os_rng())
    }
}

impl<R: Rng> PaintGun<R> {
    pub fn with_rng(
        settings: PaintGunSettings,
        aim: Option<Arc<dyn AimSource>>,
        rng: R,
    ) -> Result<Self, LaunchError> {
        let aim = aim.ok_or(LaunchError::MissingAimSource)?;
        Ok(Self { settings, aim, rng })
    }

    pub fn settings(&self) -> &PaintGunSettings {
        &self.settings
    }

    /// Perturb `forward` by up to `spread_degrees` of yaw and pitch
    fn spread(&mut self, forward: Vec3) -> Vec3 {
        let spread = self.settings.spread_degrees.abs();
        if spread == 0.0 {
            return forward;
        }
        let yaw = self.rng.random_range(-spread..=spread).to_radians();
        let pitch = self.rng.random_range(-spread..=spread).to_radians();
        let offset = Quat::from_euler(EulerRot::YXZ, yaw, pitch, 0.0);
        Quat::from_rotation_arc(Vec3::Z, forward) * offset * Vec3::Z
    }

    pub fn trigger(&mut self) -> Result<LaunchRequest, LaunchError> {
        let (origin, forward) = muzzle(self.aim.aim(), self.settings.muzzle_offset)?;
        let direction = self.spread(forward);

        Ok(LaunchRequest {
            origin,
            direction,
            initial_speed: self.settings.muzzle_velocity,
            mass: self.settings.mass,
            body_radius: self.settings.diameter * 0.5,
            restitution: None,
            munition: Munition::Paint {
                color: Some(self.settings.color),
                splash_count: None,
                paint_radius: Some(self.settings.paint_radius),
            },
        })
    }
}

/// Fires heavy bouncing balls that never paint
pub struct BallLauncher {
    settings: BallLauncherSettings,
    aim: Arc<dyn AimSource>,
}

impl BallLauncher {
    pub fn new(
        settings: BallLauncherSettings,
        aim: Option<Arc<dyn AimSource>>,
    ) -> Result<Self, LaunchError> {
        let aim = aim.ok_or(LaunchError::MissingAimSource)?;
        Ok(Self { settings, aim })
    }

    pub fn trigger(&self) -> Result<LaunchRequest, LaunchError> {
        let (origin, direction) = muzzle(self.aim.aim(), self.settings.muzzle_offset)?;
        Ok(LaunchRequest {
            origin,
            direction,
            initial_speed: self.settings.speed,
            mass: self.settings.mass,
            body_radius: self.settings.radius,
            restitution: Some(self.settings.restitution),
            munition: Munition::Kinetic {
                recoil_impulse: self.settings.recoil_impulse,
            },
        })
    }
}
