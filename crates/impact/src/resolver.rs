//! Impact resolution: one center stroke plus scattered secondary splashes.

use glam::Vec3;
use painting::{validate_color, validate_radius};
use rand::Rng;
use splat_config::SplashSettings;
use tracing::debug;

use crate::capability::PaintTarget;
use crate::error::ImpactError;
use crate::physics::{ColliderHandle, CollisionEvent, SpatialQuery};

/// Validated paint payload for one impact
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplashParams {
    color: [f32; 4],
    base_radius: f32,
    splash_count: u32,
}

impl SplashParams {
    /// `splash_count` is the number of scatter rays and must be at least 1
    pub fn new(color: [f32; 4], base_radius: f32, splash_count: u32) -> Result<Self, ImpactError> {
        validate_radius(base_radius).map_err(|_| ImpactError::InvalidRadius(base_radius))?;
        if splash_count == 0 {
            return Err(ImpactError::InvalidSplashCount);
        }
        validate_color(color)?;
        Ok(Self {
            color,
            base_radius,
            splash_count,
        })
    }

    #[inline]
    pub fn color(&self) -> [f32; 4] {
        self.color
    }

    #[inline]
    pub fn base_radius(&self) -> f32 {
        self.base_radius
    }

    #[inline]
    pub fn splash_count(&self) -> u32 {
        self.splash_count
    }
}

/// Scatter geometry, relative to the payload's base radius
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScatterSettings {
    pub range_factor: f32,
    pub scale_min: f32,
    pub scale_max: f32,
    pub surface_offset: f32,
}

impl From<&SplashSettings> for ScatterSettings {
    fn from(settings: &SplashSettings) -> Self {
        let scale_min = settings.scatter_scale_min.max(0.0);
        Self {
            range_factor: settings.scatter_range_factor.max(0.0),
            scale_min,
            scale_max: settings.scatter_scale_max.max(scale_min),
            surface_offset: settings.surface_offset,
        }
    }
}

/// One accepted stroke
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeRecord {
    pub collider: ColliderHandle,
    pub point: Vec3,
    pub normal: Vec3,
    /// World-space radius in meters
    pub radius: f32,
}

/// What a single impact painted
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImpactReport {
    /// The center stroke, if the struck collider accepted it
    pub center: Option<StrokeRecord>,
    /// Secondary strokes that landed on a paintable collider
    pub scatter: Vec<StrokeRecord>,
    /// Scatter rays cast, hit or miss
    pub rays_cast: u32,
}

impl ImpactReport {
    pub fn stroke_count(&self) -> usize {
        self.scatter.len() + usize::from(self.center.is_some())
    }
}

#[derive(Debug, Clone)]
pub struct ImpactResolver {
    scatter: ScatterSettings,
}

impl ImpactResolver {
    pub fn new(settings: &SplashSettings) -> Self {
        Self {
            scatter: ScatterSettings::from(settings),
        }
    }

    /// Resolve one collision into paint.
    ///
    /// The struck collider gets a full-size stroke at the contact point.
    /// Then `splash_count` rays leave a point just off the surface in
    /// uniformly random directions; each hit on a paintable collider gets a
    /// smaller stroke. Misses and non-paintable hits are discarded.
    pub fn resolve<R: Rng>(
        &self,
        world: &impl SpatialQuery,
        targets: &mut impl PaintTarget,
        event: &CollisionEvent,
        params: &SplashParams,
        rng: &mut R,
    ) -> ImpactReport {
        let mut report = ImpactReport::default();
        let color = params.color;
        let radius = params.base_radius;

        if targets.try_paint(
            event.struck,
            event.contact_point,
            event.contact_normal,
            color,
            radius,
        ) {
            report.center = Some(StrokeRecord {
                collider: event.struck,
                point: event.contact_point,
                normal: event.contact_normal,
                radius,
            });
        }

        let origin = event.contact_point + event.contact_normal * self.scatter.surface_offset;
        let range = radius * self.scatter.range_factor;

        for _ in 0..params.splash_count {
            report.rays_cast += 1;
            let direction = random_in_unit_sphere(rng);
            let Some(hit) = world.raycast(origin, direction, range) else {
                continue;
            };

            let scaled = radius * rng.random_range(self.scatter.scale_min..=self.scatter.scale_max);
            if targets.try_paint(hit.collider, hit.point, hit.normal, color, scaled) {
                report.scatter.push(StrokeRecord {
                    collider: hit.collider,
                    point: hit.point,
                    normal: hit.normal,
                    radius: scaled,
                });
            }
        }

        debug!(
            "Impact on {:?}: center={} scatter={}/{}",
            event.struck,
            report.center.is_some(),
            report.scatter.len(),
            report.rays_cast
        );
        report
    }
}

/// Uniform sample inside the unit ball, rejecting near-zero vectors
pub fn random_in_unit_sphere<R: Rng>(rng: &mut R) -> Vec3 {
    loop {
        let v = Vec3::new(
            rng.random_range(-1.0..=1.0),
            rng.random_range(-1.0..=1.0),
            rng.random_range(-1.0..=1.0),
        );
        let len2 = v.length_squared();
        if len2 <= 1.0 && len2 > 1e-8 {
            return v;
        }
    }
}
