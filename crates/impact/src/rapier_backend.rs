//! Rapier physics backend
//!
//! [`RapierWorld`] implements the physics boundary on top of rapier3d:
//! spheres and cuboids, fixed or dynamic bodies, CCD for fast projectiles,
//! query pipeline ray casts and overlaps, and collision-enter events read
//! from a channel collector after every step.

use std::collections::{BTreeMap, HashMap};

use crossbeam_channel::Receiver;
use glam::{Quat, Vec3};
use rapier3d::na as nalgebra;
use rapier3d::na::{Isometry3, Quaternion, Translation3, UnitQuaternion};
use rapier3d::parry::query::PointQuery;
use rapier3d::parry::shape::Ball;
use rapier3d::prelude::{
    point, vector, ActiveEvents, CCDSolver, ChannelEventCollector, Collider, ColliderBuilder,
    ColliderSet, ContactForceEvent, DefaultBroadPhase, ImpulseJointSet, IntegrationParameters,
    IslandManager, MultibodyJointSet, NarrowPhase, PhysicsPipeline, QueryFilter, QueryPipeline,
    Real, RigidBodyBuilder, RigidBodySet, Vector,
};
use splat_config::PhysicsSettings;
use tracing::{debug, trace};

use crate::physics::{
    BodyDesc, BodyHandle, ColliderHandle, CollisionEvent, Motion, PhysicsWorld, Pose, RayHit,
    Shape, SpatialQuery,
};

// Rapier's own handle and event types, next to the crate's handles
use rapier3d::prelude::CollisionEvent as RapierCollisionEvent;
use rapier3d::prelude::ColliderHandle as RapierColliderHandle;
use rapier3d::prelude::RigidBodyHandle as RapierBodyHandle;

#[inline]
fn to_vector(v: Vec3) -> Vector<Real> {
    vector![v.x, v.y, v.z]
}

#[inline]
fn from_vector(v: &Vector<Real>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

fn to_isometry(position: Vec3, rotation: Quat) -> Isometry3<Real> {
    let rotation = rotation.normalize();
    Isometry3::from_parts(
        Translation3::new(position.x, position.y, position.z),
        UnitQuaternion::from_quaternion(Quaternion::new(
            rotation.w, rotation.x, rotation.y, rotation.z,
        )),
    )
}

fn from_rotation(rotation: &UnitQuaternion<Real>) -> Quat {
    let q = rotation.quaternion();
    Quat::from_xyzw(q.i, q.j, q.k, q.w)
}

/// Rapier body and collider behind one crate-level id
#[derive(Debug, Clone, Copy)]
struct Slot {
    body: RapierBodyHandle,
    collider: RapierColliderHandle,
    dynamic: bool,
}

pub struct RapierWorld {
    rigid_body_set: RigidBodySet,
    collider_set: ColliderSet,
    integration_parameters: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    impulse_joint_set: ImpulseJointSet,
    multibody_joint_set: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
    gravity: Vector<Real>,
    default_restitution: f32,

    event_collector: ChannelEventCollector,
    collision_recv: Receiver<RapierCollisionEvent>,
    contact_force_recv: Receiver<ContactForceEvent>,

    slots: BTreeMap<u32, Slot>,
    collider_to_id: HashMap<RapierColliderHandle, u32>,
    next_id: u32,
}

impl RapierWorld {
    pub fn new(settings: &PhysicsSettings) -> Self {
        let (collision_send, collision_recv) = crossbeam_channel::unbounded();
        let (contact_force_send, contact_force_recv) = crossbeam_channel::unbounded();

        let mut integration_parameters = IntegrationParameters::default();
        integration_parameters.dt = settings.fixed_timestep;

        Self {
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            integration_parameters,
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            gravity: to_vector(Vec3::from_array(settings.gravity)),
            default_restitution: settings.default_restitution,
            event_collector: ChannelEventCollector::new(collision_send, contact_force_send),
            collision_recv,
            contact_force_recv,
            slots: BTreeMap::new(),
            collider_to_id: HashMap::new(),
            next_id: 1,
        }
    }

    pub fn body_count(&self) -> usize {
        self.slots.len()
    }

    pub fn contains(&self, body: BodyHandle) -> bool {
        self.slots.contains_key(&body.0)
    }

    pub fn position(&self, body: BodyHandle) -> Option<Vec3> {
        let slot = self.slots.get(&body.0)?;
        self.rigid_body_set
            .get(slot.body)
            .map(|rb| from_vector(rb.translation()))
    }

    /// None for static bodies
    pub fn linear_velocity(&self, body: BodyHandle) -> Option<Vec3> {
        let slot = self.slots.get(&body.0).filter(|s| s.dynamic)?;
        self.rigid_body_set
            .get(slot.body)
            .map(|rb| from_vector(rb.linvel()))
    }

    pub fn angular_velocity(&self, body: BodyHandle) -> Option<Vec3> {
        let slot = self.slots.get(&body.0).filter(|s| s.dynamic)?;
        self.rigid_body_set
            .get(slot.body)
            .map(|rb| from_vector(rb.angvel()))
    }

    fn collider(&self, collider: ColliderHandle) -> Option<&Collider> {
        let slot = self.slots.get(&collider.0)?;
        self.collider_set.get(slot.collider)
    }

    fn velocities(&self) -> HashMap<u32, Vec3> {
        self.slots
            .iter()
            .filter(|(_, slot)| slot.dynamic)
            .filter_map(|(&id, slot)| {
                let rb = self.rigid_body_set.get(slot.body)?;
                Some((id, from_vector(rb.linvel())))
            })
            .collect()
    }

    /// Contact point on `struck` and the normal pointing away from it
    fn contact_on(&self, struck: u32, incoming: u32) -> Option<(Vec3, Vec3)> {
        let struck_slot = self.slots.get(&struck)?;
        let incoming_slot = self.slots.get(&incoming)?;
        let struck_collider = self.collider_set.get(struck_slot.collider)?;

        let deepest = self
            .narrow_phase
            .contact_pair(struck_slot.collider, incoming_slot.collider)
            .and_then(|pair| {
                let (manifold, contact) = pair.find_deepest_contact()?;
                let normal = from_vector(&manifold.data.normal);
                // Manifold normals point from collider1 toward collider2
                Some(if pair.collider1 == struck_slot.collider {
                    (struck_collider.position() * contact.local_p1, normal)
                } else {
                    (struck_collider.position() * contact.local_p2, -normal)
                })
            });
        if let Some((point, normal)) = deepest {
            return Some((Vec3::new(point.x, point.y, point.z), normal));
        }

        // The pair can start touching without a tracked contact point
        let incoming_center = self
            .rigid_body_set
            .get(incoming_slot.body)
            .map(|rb| from_vector(rb.translation()))?;
        let point = self.closest_point(ColliderHandle(struck), incoming_center)?;
        Some((point, (incoming_center - point).normalize_or(Vec3::Y)))
    }

    fn enter_events(&self, started: &[(u32, u32)], before: &HashMap<u32, Vec3>) -> Vec<CollisionEvent> {
        let velocity = |id: u32| before.get(&id).copied().unwrap_or(Vec3::ZERO);
        let mut events = Vec::new();

        for &(a, b) in started {
            for (incoming, struck) in [(a, b), (b, a)] {
                if !before.contains_key(&incoming) {
                    continue;
                }
                let Some((contact_point, contact_normal)) = self.contact_on(struck, incoming) else {
                    continue;
                };
                events.push(CollisionEvent {
                    contact_point,
                    contact_normal,
                    relative_velocity: velocity(struck) - velocity(incoming),
                    struck: ColliderHandle(struck),
                    incoming: BodyHandle(incoming),
                });
                trace!("Contact enter {} -> {} at {:?}", incoming, struck, contact_point);
            }
        }
        events
    }
}

impl SpatialQuery for RapierWorld {
    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayHit> {
        let direction = direction.try_normalize()?;
        if !max_distance.is_finite() || max_distance <= 0.0 {
            return None;
        }

        let start = point![origin.x, origin.y, origin.z];
        let outside = |_: RapierColliderHandle, collider: &Collider| {
            !collider.shape().contains_point(collider.position(), &start)
        };
        let filter = QueryFilter::default().predicate(&outside);
        let ray = rapier3d::prelude::Ray::new(start, to_vector(direction));

        let (handle, hit) = self.query_pipeline.cast_ray_and_get_normal(
            &self.rigid_body_set,
            &self.collider_set,
            &ray,
            max_distance,
            true,
            filter,
        )?;
        let id = *self.collider_to_id.get(&handle)?;
        Some(RayHit {
            point: origin + direction * hit.time_of_impact,
            normal: from_vector(&hit.normal),
            distance: hit.time_of_impact,
            collider: ColliderHandle(id),
        })
    }

    fn query_overlap(&self, center: Vec3, radius: f32) -> Vec<ColliderHandle> {
        if !radius.is_finite() || radius < 0.0 {
            return Vec::new();
        }

        let mut found = Vec::new();
        self.query_pipeline.intersections_with_shape(
            &self.rigid_body_set,
            &self.collider_set,
            &Isometry3::translation(center.x, center.y, center.z),
            &Ball::new(radius),
            QueryFilter::default(),
            |handle| {
                if let Some(&id) = self.collider_to_id.get(&handle) {
                    found.push(id);
                }
                true
            },
        );
        found.sort_unstable();
        found.into_iter().map(ColliderHandle).collect()
    }

    fn attached_body(&self, collider: ColliderHandle) -> Option<BodyHandle> {
        self.slots
            .get(&collider.0)
            .filter(|slot| slot.dynamic)
            .map(|_| BodyHandle(collider.0))
    }

    fn closest_point(&self, collider: ColliderHandle, point: Vec3) -> Option<Vec3> {
        let collider = self.collider(collider)?;
        let projection = collider.shape().project_point(
            collider.position(),
            &point![point.x, point.y, point.z],
            true,
        );
        Some(Vec3::new(
            projection.point.x,
            projection.point.y,
            projection.point.z,
        ))
    }

    fn collider_pose(&self, collider: ColliderHandle) -> Option<Pose> {
        let position = self.collider(collider)?.position();
        Some(Pose {
            translation: from_vector(&position.translation.vector),
            rotation: from_rotation(&position.rotation),
        })
    }

    fn center_of_mass(&self, body: BodyHandle) -> Option<Vec3> {
        let slot = self.slots.get(&body.0).filter(|s| s.dynamic)?;
        let com = self.rigid_body_set.get(slot.body)?.center_of_mass();
        Some(Vec3::new(com.x, com.y, com.z))
    }
}

impl PhysicsWorld for RapierWorld {
    fn step(&mut self, dt: f32) -> Vec<CollisionEvent> {
        if !dt.is_finite() || dt <= 0.0 {
            return Vec::new();
        }
        self.integration_parameters.dt = dt;
        let before = self.velocities();

        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &self.event_collector,
        );

        let started: Vec<(u32, u32)> = self
            .collision_recv
            .try_iter()
            .filter(|event| event.started() && !event.sensor())
            .filter_map(|event| {
                let a = *self.collider_to_id.get(&event.collider1())?;
                let b = *self.collider_to_id.get(&event.collider2())?;
                Some((a, b))
            })
            .collect();
        // Force events are not enabled; drain in case a collider opts in
        while self.contact_force_recv.try_recv().is_ok() {}

        let events = self.enter_events(&started, &before);
        if !events.is_empty() {
            debug!("RapierWorld::step: {} enter events", events.len());
        }
        events
    }

    fn spawn(&mut self, desc: BodyDesc) -> (BodyHandle, ColliderHandle) {
        let id = self.next_id;
        self.next_id += 1;

        let position = to_isometry(desc.position, desc.rotation);
        let (builder, mass) = match desc.motion {
            Motion::Static => (RigidBodyBuilder::fixed(), None),
            Motion::Dynamic { mass, ccd } => (
                RigidBodyBuilder::dynamic().ccd_enabled(ccd),
                Some(mass.max(f32::EPSILON)),
            ),
        };
        let body = self.rigid_body_set.insert(builder.position(position).build());

        let mut collider = match desc.shape {
            Shape::Sphere { radius } => ColliderBuilder::ball(radius),
            Shape::Cuboid { half_extents } => {
                ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            }
        }
        .restitution(desc.restitution.unwrap_or(self.default_restitution))
        .active_events(ActiveEvents::COLLISION_EVENTS);
        if let Some(mass) = mass {
            collider = collider.mass(mass);
        }
        let collider = self.collider_set.insert_with_parent(
            collider.build(),
            body,
            &mut self.rigid_body_set,
        );
        // Impulses may arrive before the first step
        if let Some(rb) = self.rigid_body_set.get_mut(body) {
            rb.recompute_mass_properties_from_colliders(&self.collider_set);
        }
        self.query_pipeline.update(&self.collider_set);

        self.slots.insert(
            id,
            Slot {
                body,
                collider,
                dynamic: mass.is_some(),
            },
        );
        self.collider_to_id.insert(collider, id);
        (BodyHandle(id), ColliderHandle(id))
    }

    fn remove_body(&mut self, body: BodyHandle) -> bool {
        let Some(slot) = self.slots.remove(&body.0) else {
            return false;
        };
        self.collider_to_id.remove(&slot.collider);
        self.rigid_body_set.remove(
            slot.body,
            &mut self.island_manager,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            true,
        );
        self.query_pipeline.update(&self.collider_set);
        true
    }

    fn apply_impulse_at_point(&mut self, body: BodyHandle, impulse: Vec3, point: Vec3) {
        if !impulse.is_finite() || !point.is_finite() {
            return;
        }
        let Some(slot) = self.slots.get(&body.0).filter(|s| s.dynamic) else {
            return;
        };
        if let Some(rb) = self.rigid_body_set.get_mut(slot.body) {
            rb.apply_impulse_at_point(to_vector(impulse), point![point.x, point.y, point.z], true);
        }
    }
}
