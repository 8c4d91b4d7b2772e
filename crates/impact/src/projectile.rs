//! Projectile lifecycle
//!
//! A paintball is `Spawned` when launched, `InFlight` once it has been
//! simulated, and `Resolved` by the first collision event that reaches it.
//! Resolution paints, then pushes nearby bodies, then queues the body for
//! removal. Removals are flushed after every event of the step has been
//! handled, so later events for the same projectile still see it and are
//! ignored instead of resolving twice.
//!
//! Kinetic balls never resolve; each collision-enter they take part in
//! recoils the body they hit.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use splat_config::SplashSettings;
use tracing::{debug, warn};

use crate::capability::PaintTarget;
use crate::error::{ImpactError, LaunchError};
use crate::impulse::{AppliedImpulse, ImpulseDistributor};
use crate::launcher::{spawn_projectile, LaunchRequest, Munition};
use crate::physics::{BodyHandle, CollisionEvent, PhysicsWorld, SpatialQuery};
use crate::resolver::{ImpactReport, ImpactResolver, SplashParams};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectileState {
    Spawned,
    InFlight,
    Resolved,
}

/// Everything a paintball does when it lands
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaintPayload {
    pub splash: SplashParams,
    /// Peak radial impulse
    pub impulse: f32,
    pub impulse_radius: f32,
}

impl PaintPayload {
    /// Payload from splash defaults, with optional per-shot overrides
    pub fn from_settings(
        settings: &SplashSettings,
        color: [f32; 4],
        splash_count: Option<u32>,
        paint_radius: Option<f32>,
    ) -> Result<Self, ImpactError> {
        let radius = paint_radius.unwrap_or(settings.paint_radius);
        let splash = SplashParams::new(
            color,
            radius,
            splash_count.unwrap_or(settings.splash_count),
        )?;
        Ok(Self {
            splash,
            impulse: settings.impulse,
            impulse_radius: radius * settings.impulse_radius_factor,
        })
    }
}

#[derive(Debug, Clone, Copy)]
struct Paintball {
    state: ProjectileState,
    payload: PaintPayload,
}

/// One resolved paintball
#[derive(Debug, Clone, PartialEq)]
pub struct ImpactOutcome {
    pub projectile: BodyHandle,
    pub event: CollisionEvent,
    pub report: ImpactReport,
    pub impulses: Vec<AppliedImpulse>,
}

/// What one step of collision events produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepReport {
    pub impacts: Vec<ImpactOutcome>,
    pub recoils: Vec<AppliedImpulse>,
    /// Bodies removed from the world at the end of the step
    pub removed: usize,
}

pub struct ProjectileSystem<R = StdRng> {
    defaults: SplashSettings,
    resolver: ImpactResolver,
    distributor: ImpulseDistributor,
    paintballs: HashMap<BodyHandle, Paintball>,
    kinetic: HashMap<BodyHandle, f32>,
    removal_queue: Vec<BodyHandle>,
    rng: R,
}

impl ProjectileSystem<StdRng> {
    pub fn new(settings: &SplashSettings) -> Self {
        Self::with_rng(settings, StdRng::from_os_rng())
    }
}

impl<R: Rng> ProjectileSystem<R> {
    pub fn with_rng(settings: &SplashSettings, rng: R) -> Self {
        Self {
            defaults: settings.clone(),
            resolver: ImpactResolver::new(settings),
            distributor: ImpulseDistributor::from(settings),
            paintballs: HashMap::new(),
            kinetic: HashMap::new(),
            removal_queue: Vec::new(),
            rng,
        }
    }

    /// Track an already spawned body as a paintball
    pub fn register_paintball(&mut self, body: BodyHandle, payload: PaintPayload) {
        self.paintballs.insert(
            body,
            Paintball {
                state: ProjectileState::Spawned,
                payload,
            },
        );
    }

    pub fn register_kinetic(&mut self, body: BodyHandle, recoil_impulse: f32) {
        self.kinetic.insert(body, recoil_impulse);
    }

    /// Validate, spawn and register a launch request.
    ///
    /// Paint payloads are checked before anything is spawned.
    pub fn launch(
        &mut self,
        world: &mut impl PhysicsWorld,
        request: &LaunchRequest,
    ) -> Result<BodyHandle, LaunchError> {
        match request.munition {
            Munition::Paint {
                color,
                splash_count,
                paint_radius,
            } => {
                let color = color.unwrap_or([1.0, 1.0, 1.0, 1.0]);
                let payload =
                    PaintPayload::from_settings(&self.defaults, color, splash_count, paint_radius)?;
                let body = spawn_projectile(world, request)?;
                self.register_paintball(body, payload);
                Ok(body)
            }
            Munition::Kinetic { recoil_impulse } => {
                let body = spawn_projectile(world, request)?;
                self.register_kinetic(body, recoil_impulse);
                Ok(body)
            }
        }
    }

    pub fn state(&self, body: BodyHandle) -> Option<ProjectileState> {
        self.paintballs.get(&body).map(|p| p.state)
    }

    pub fn paintball_count(&self) -> usize {
        self.paintballs.len()
    }

    pub fn is_kinetic(&self, body: BodyHandle) -> bool {
        self.kinetic.contains_key(&body)
    }

    pub fn kinetic_count(&self) -> usize {
        self.kinetic.len()
    }

    pub fn pending_removals(&self) -> usize {
        self.removal_queue.len()
    }

    /// Handle one step's collision events without removing anything
    pub fn handle_events(
        &mut self,
        world: &mut impl PhysicsWorld,
        targets: &mut impl PaintTarget,
        events: &[CollisionEvent],
    ) -> StepReport {
        // Every paintball alive during the step has now been simulated
        for ball in self.paintballs.values_mut() {
            if ball.state == ProjectileState::Spawned {
                ball.state = ProjectileState::InFlight;
            }
        }

        let mut report = StepReport::default();
        for event in events {
            if let Some(&recoil) = self.kinetic.get(&event.incoming) {
                if let Some(applied) = self.distributor.apply_recoil(world, event, recoil) {
                    report.recoils.push(applied);
                }
                continue;
            }
            if let Some(outcome) = self.resolve(world, targets, event) {
                report.impacts.push(outcome);
            }
        }
        report
    }

    fn resolve(
        &mut self,
        world: &mut impl PhysicsWorld,
        targets: &mut impl PaintTarget,
        event: &CollisionEvent,
    ) -> Option<ImpactOutcome> {
        let body = event.incoming;
        let ball = self.paintballs.get_mut(&body)?;
        if ball.state != ProjectileState::InFlight {
            debug!("Ignoring event for {:?} in state {:?}", body, ball.state);
            return None;
        }
        ball.state = ProjectileState::Resolved;
        let payload = ball.payload;

        let report = self
            .resolver
            .resolve(&*world, targets, event, &payload.splash, &mut self.rng);

        // The blast is centered on the projectile body, not the contact
        let center = world.center_of_mass(body).unwrap_or(event.contact_point);
        let impulses = match self.distributor.apply_radial_impulse(
            world,
            center,
            payload.impulse_radius,
            payload.impulse,
            Some(body),
        ) {
            Ok(applied) => applied,
            Err(err) => {
                warn!("Paintball {:?}: radial impulse skipped: {}", body, err);
                Vec::new()
            }
        };

        self.removal_queue.push(body);
        Some(ImpactOutcome {
            projectile: body,
            event: *event,
            report,
            impulses,
        })
    }

    /// Remove every resolved projectile from the world
    pub fn flush_removals(&mut self, world: &mut impl PhysicsWorld) -> usize {
        let mut removed = 0;
        for body in self.removal_queue.drain(..) {
            self.paintballs.remove(&body);
            if world.remove_body(body) {
                removed += 1;
            }
        }
        removed
    }

    /// Drop tracking for bodies that no longer exist in the world
    pub fn prune_missing(&mut self, world: &impl SpatialQuery) -> usize {
        let tracked = self.paintballs.len() + self.kinetic.len();
        self.paintballs
            .retain(|body, _| world.center_of_mass(*body).is_some());
        self.kinetic
            .retain(|body, _| world.center_of_mass(*body).is_some());
        tracked - self.paintballs.len() - self.kinetic.len()
    }

    /// Handle a step's events, flush removals, then forget bodies
    /// destroyed outside the system
    pub fn process_step(
        &mut self,
        world: &mut impl PhysicsWorld,
        targets: &mut impl PaintTarget,
        events: &[CollisionEvent],
    ) -> StepReport {
        let mut report = self.handle_events(world, targets, events);
        report.removed = self.flush_removals(world);
        let pruned = self.prune_missing(&*world);
        if pruned > 0 {
            debug!("ProjectileSystem::process_step: forgot {} missing bodies", pruned);
        }
        if !report.impacts.is_empty() || !report.recoils.is_empty() {
            debug!(
                "ProjectileSystem::process_step: {} impacts, {} recoils, {} removed",
                report.impacts.len(),
                report.recoils.len(),
                report.removed
            );
        }
        report
    }

    /// Stop tracking a body destroyed by someone else
    pub fn forget(&mut self, body: BodyHandle) {
        self.paintballs.remove(&body);
        self.kinetic.remove(&body);
        self.removal_queue.retain(|b| *b != body);
    }
}
