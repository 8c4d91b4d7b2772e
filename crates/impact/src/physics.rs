//! Physics boundary: handles, collision events and the world traits.
//!
//! The core never owns the simulation. It reads a world through
//! [`SpatialQuery`] and writes velocity changes through [`PhysicsWorld`].
//! [`crate::rapier_backend::RapierWorld`] implements both over rapier3d.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// A rigid body with dynamics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyHandle(pub u32);

/// A collision volume, possibly attached to a body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColliderHandle(pub u32);

/// Collision shape in body-local space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Sphere { radius: f32 },
    Cuboid { half_extents: Vec3 },
}

/// How a body moves
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Motion {
    /// Immovable geometry, never receives impulses
    Static,
    Dynamic {
        mass: f32,
        /// Continuous collision detection so thin geometry is not tunneled through
        ccd: bool,
    },
}

/// Spawn description for a body and its collider
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyDesc {
    pub shape: Shape,
    pub position: Vec3,
    pub rotation: Quat,
    pub motion: Motion,
    /// Restitution; None uses the world default
    pub restitution: Option<f32>,
}

impl BodyDesc {
    pub fn fixed(shape: Shape, position: Vec3) -> Self {
        Self {
            shape,
            position,
            rotation: Quat::IDENTITY,
            motion: Motion::Static,
            restitution: None,
        }
    }

    pub fn dynamic(shape: Shape, position: Vec3, mass: f32) -> Self {
        Self {
            shape,
            position,
            rotation: Quat::IDENTITY,
            motion: Motion::Dynamic { mass, ccd: false },
            restitution: None,
        }
    }

    pub fn with_ccd(mut self) -> Self {
        if let Motion::Dynamic { mass, .. } = self.motion {
            self.motion = Motion::Dynamic { mass, ccd: true };
        }
        self
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_restitution(mut self, restitution: f32) -> Self {
        self.restitution = Some(restitution);
        self
    }
}

/// Collider position and orientation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub translation: Vec3,
    pub rotation: Quat,
}

/// Closest ray intersection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub point: Vec3,
    pub normal: Vec3,
    pub distance: f32,
    pub collider: ColliderHandle,
}

/// One collision-enter event, delivered synchronously from a physics step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionEvent {
    /// First contact point, world space
    pub contact_point: Vec3,
    /// Contact normal pointing away from the struck surface
    pub contact_normal: Vec3,
    /// Pre-impact velocity of the struck body relative to the incoming one
    pub relative_velocity: Vec3,
    pub struck: ColliderHandle,
    pub incoming: BodyHandle,
}

/// Read-only view of the physics world for the current tick
pub trait SpatialQuery {
    /// Closest hit along a ray. Colliders containing the origin are not reported.
    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayHit>;

    /// Colliders overlapping a sphere
    fn query_overlap(&self, center: Vec3, radius: f32) -> Vec<ColliderHandle>;

    /// Body with dynamics attached to a collider (None for static geometry)
    fn attached_body(&self, collider: ColliderHandle) -> Option<BodyHandle>;

    /// Point on the collider closest to `point` (the point itself when inside)
    fn closest_point(&self, collider: ColliderHandle, point: Vec3) -> Option<Vec3>;

    fn collider_pose(&self, collider: ColliderHandle) -> Option<Pose>;

    fn center_of_mass(&self, body: BodyHandle) -> Option<Vec3>;
}

/// Mutable side of the physics world
pub trait PhysicsWorld: SpatialQuery {
    /// Advance one fixed step and return the collision-enter events it produced
    fn step(&mut self, dt: f32) -> Vec<CollisionEvent>;

    fn spawn(&mut self, desc: BodyDesc) -> (BodyHandle, ColliderHandle);

    /// Remove a body and its collider. Returns false if it was already gone.
    fn remove_body(&mut self, body: BodyHandle) -> bool;

    /// Instantaneous momentum change applied at a world point
    fn apply_impulse_at_point(&mut self, body: BodyHandle, impulse: Vec3, point: Vec3);

    /// Momentum change through the center of mass
    fn apply_impulse(&mut self, body: BodyHandle, impulse: Vec3) {
        if let Some(center) = self.center_of_mass(body) {
            self.apply_impulse_at_point(body, impulse, center);
        }
    }
}
