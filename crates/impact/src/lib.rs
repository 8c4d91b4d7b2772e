//! splat impact - what happens when a projectile lands
//!
//! - [`physics`] - Boundary traits over the physics engine and its events
//! - [`rapier_backend`] - Physics world over rapier3d
//! - [`capability`] - Collider to paint surface bindings
//! - [`resolver`] - Center stroke plus scattered splash strokes
//! - [`impulse`] - Radial blast and recoil impulses
//! - [`projectile`] - Paintball lifecycle and deferred removal
//! - [`launcher`] - Paint gun and ball launcher triggers

pub mod capability;
pub mod error;
pub mod impulse;
pub mod launcher;
pub mod physics;
pub mod projectile;
pub mod rapier_backend;
pub mod resolver;

pub use capability::{Capability, PaintTarget, PaintTargets};
pub use error::{ImpactError, ImpulseError, LaunchError};
pub use impulse::{falloff, AppliedImpulse, ImpulseDistributor};
pub use launcher::{spawn_projectile, Aim, AimSource, BallLauncher, LaunchRequest, Munition, PaintGun};
pub use physics::*;
pub use projectile::{ImpactOutcome, PaintPayload, ProjectileState, ProjectileSystem, StepReport};
pub use resolver::{random_in_unit_sphere, ImpactReport, ImpactResolver, ScatterSettings, SplashParams, StrokeRecord};
pub use rapier_backend::RapierWorld;
