//! Shared configuration for splat
//!
//! This crate provides the single source of truth for paint canvas, splash,
//! launcher and physics tunables. Every section has defaults matching the
//! reference scene and can be overridden from JSON.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[cfg(feature = "bevy")]
use bevy::prelude::Resource;

/// Default canvas resolution (square) in pixels
pub const DEFAULT_CANVAS_SIZE: u32 = 1024;

/// Default brush hardness (edge softness)
pub const DEFAULT_HARDNESS: f32 = 0.7;

/// Default brush speckle amount
pub const DEFAULT_NOISE: f32 = 0.35;

/// Default paint radius in meters
pub const DEFAULT_PAINT_RADIUS: f32 = 0.06;

/// Default number of scatter rays per impact
pub const DEFAULT_SPLASH_COUNT: u32 = 12;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{field} out of range: {value}")]
    OutOfRange { field: &'static str, value: f32 },
}

/// Canvas and brush settings shared by all paintable surfaces
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaintSettings {
    /// Canvas width and height in pixels
    pub canvas_size: u32,
    /// Dirty tracking tile size in pixels
    pub tile_size: u32,
    /// Brush hardness, 0.0 = fully soft, 1.0 = hard edge
    pub hardness: f32,
    /// Speckle amount, 0.0 = clean disc
    pub noise: f32,
    /// Distance the UV ray starts above the surface (meters)
    pub uv_cast_offset: f32,
    /// Maximum UV ray length (meters)
    pub uv_cast_length: f32,
}

impl Default for PaintSettings {
    fn default() -> Self {
        Self {
            canvas_size: DEFAULT_CANVAS_SIZE,
            tile_size: 128,
            hardness: DEFAULT_HARDNESS,
            noise: DEFAULT_NOISE,
            uv_cast_offset: 0.01,
            uv_cast_length: 1.0,
        }
    }
}

/// Splash and impulse settings for paint projectiles
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SplashSettings {
    /// Base paint radius in meters
    pub paint_radius: f32,
    /// Scatter rays cast per impact
    pub splash_count: u32,
    /// Scatter ray length as a multiple of the paint radius
    pub scatter_range_factor: f32,
    /// Smallest scatter radius scale
    pub scatter_scale_min: f32,
    /// Largest scatter radius scale
    pub scatter_scale_max: f32,
    /// Offset along the contact normal for scatter ray origins (meters)
    pub surface_offset: f32,
    /// Peak radial impulse
    pub impulse: f32,
    /// Radial impulse radius as a multiple of the paint radius
    pub impulse_radius_factor: f32,
    /// Downward shift of the explosion origin used for impulse direction
    pub upwards_modifier: f32,
    /// Counter-impulse applied to the struck body
    pub recoil_impulse: f32,
}

impl Default for SplashSettings {
    fn default() -> Self {
        Self {
            paint_radius: DEFAULT_PAINT_RADIUS,
            splash_count: DEFAULT_SPLASH_COUNT,
            scatter_range_factor: 4.0,
            scatter_scale_min: 0.3,
            scatter_scale_max: 0.8,
            surface_offset: 0.01,
            impulse: 60.0,
            impulse_radius_factor: 8.0,
            upwards_modifier: 0.1,
            recoil_impulse: 2.5,
        }
    }
}

impl SplashSettings {
    /// Radius of the radial impulse sphere in meters
    pub fn impulse_radius(&self) -> f32 {
        self.paint_radius * self.impulse_radius_factor
    }

    /// Length of scatter rays in meters
    pub fn scatter_range(&self) -> f32 {
        self.paint_radius * self.scatter_range_factor
    }
}

/// Rapid-fire paint gun
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaintGunSettings {
    /// Launch speed in m/s
    pub muzzle_velocity: f32,
    /// Max random pitch/yaw deviation in degrees
    pub spread_degrees: f32,
    /// Paintball mass in kg
    pub mass: f32,
    /// Paintball diameter in meters
    pub diameter: f32,
    /// Spawn distance ahead of the aim origin
    pub muzzle_offset: f32,
    /// Paint color [r, g, b, a]
    pub color: [f32; 4],
    /// Paint radius in meters
    pub paint_radius: f32,
}

impl Default for PaintGunSettings {
    fn default() -> Self {
        Self {
            muzzle_velocity: 40.0,
            spread_degrees: 0.5,
            mass: 0.02,
            diameter: 0.06,
            muzzle_offset: 0.2,
            color: [0.1, 0.6, 1.0, 1.0],
            paint_radius: DEFAULT_PAINT_RADIUS,
        }
    }
}

/// Heavy kinetic ball launcher
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BallLauncherSettings {
    pub speed: f32,
    pub mass: f32,
    pub radius: f32,
    pub muzzle_offset: f32,
    pub restitution: f32,
    /// Counter-impulse the ball applies to whatever it hits
    pub recoil_impulse: f32,
}

impl Default for BallLauncherSettings {
    fn default() -> Self {
        Self {
            speed: 28.0,
            mass: 0.6,
            radius: 0.15,
            muzzle_offset: 0.4,
            restitution: 0.65,
            recoil_impulse: 2.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsSettings {
    pub gravity: [f32; 3],
    /// Fixed simulation step in seconds
    pub fixed_timestep: f32,
    pub default_restitution: f32,
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        Self {
            gravity: [0.0, -9.81, 0.0],
            fixed_timestep: 1.0 / 50.0,
            default_restitution: 0.2,
        }
    }
}

/// Complete configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "bevy", derive(Resource))]
#[serde(default)]
pub struct SplatConfig {
    pub paint: PaintSettings,
    pub splash: SplashSettings,
    pub paint_gun: PaintGunSettings,
    pub ball_launcher: BallLauncherSettings,
    pub physics: PhysicsSettings,
}

impl SplatConfig {
    /// Parse a JSON document, filling missing fields with defaults, and validate it
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty JSON
    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check every tunable against its valid range
    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.paint;
        if p.canvas_size == 0 {
            return Err(out_of_range("paint.canvas_size", 0.0));
        }
        if p.tile_size == 0 {
            return Err(out_of_range("paint.tile_size", 0.0));
        }
        unit("paint.hardness", p.hardness)?;
        unit("paint.noise", p.noise)?;
        positive("paint.uv_cast_offset", p.uv_cast_offset)?;
        positive("paint.uv_cast_length", p.uv_cast_length)?;

        let s = &self.splash;
        positive("splash.paint_radius", s.paint_radius)?;
        if s.splash_count == 0 {
            return Err(out_of_range("splash.splash_count", 0.0));
        }
        positive("splash.scatter_range_factor", s.scatter_range_factor)?;
        positive("splash.scatter_scale_min", s.scatter_scale_min)?;
        if !s.scatter_scale_max.is_finite() || s.scatter_scale_max < s.scatter_scale_min {
            return Err(out_of_range("splash.scatter_scale_max", s.scatter_scale_max));
        }
        positive("splash.surface_offset", s.surface_offset)?;
        non_negative("splash.impulse", s.impulse)?;
        positive("splash.impulse_radius_factor", s.impulse_radius_factor)?;
        non_negative("splash.recoil_impulse", s.recoil_impulse)?;

        let g = &self.paint_gun;
        positive("paint_gun.muzzle_velocity", g.muzzle_velocity)?;
        non_negative("paint_gun.spread_degrees", g.spread_degrees)?;
        positive("paint_gun.mass", g.mass)?;
        positive("paint_gun.diameter", g.diameter)?;
        positive("paint_gun.paint_radius", g.paint_radius)?;
        for channel in g.color {
            unit("paint_gun.color", channel)?;
        }

        let b = &self.ball_launcher;
        positive("ball_launcher.speed", b.speed)?;
        positive("ball_launcher.mass", b.mass)?;
        positive("ball_launcher.radius", b.radius)?;
        unit("ball_launcher.restitution", b.restitution)?;
        non_negative("ball_launcher.recoil_impulse", b.recoil_impulse)?;

        positive("physics.fixed_timestep", self.physics.fixed_timestep)?;
        unit("physics.default_restitution", self.physics.default_restitution)?;
        Ok(())
    }
}

fn out_of_range(field: &'static str, value: f32) -> ConfigError {
    ConfigError::OutOfRange { field, value }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(out_of_range(field, value))
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(out_of_range(field, value))
    }
}

fn unit(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(out_of_range(field, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = SplatConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.paint.canvas_size, DEFAULT_CANVAS_SIZE);
        assert_eq!(config.splash.splash_count, 12);
    }

    #[test]
    fn test_derived_radii() {
        let splash = SplashSettings::default();
        assert!((splash.impulse_radius() - 0.48).abs() < 1e-6);
        assert!((splash.scatter_range() - 0.24).abs() < 1e-6);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = SplatConfig::from_json_str(r#"{ "splash": { "splash_count": 3 } }"#).unwrap();
        assert_eq!(config.splash.splash_count, 3);
        assert_eq!(config.splash.paint_radius, DEFAULT_PAINT_RADIUS);
        assert_eq!(config.paint.hardness, DEFAULT_HARDNESS);
    }

    #[test]
    fn test_rejects_invalid_values() {
        let err = SplatConfig::from_json_str(r#"{ "paint": { "hardness": 1.5 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange { field: "paint.hardness", .. }));

        let err = SplatConfig::from_json_str(r#"{ "splash": { "paint_radius": 0.0 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange { field: "splash.paint_radius", .. }));

        assert!(matches!(
            SplatConfig::from_json_str("not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_json_round_trip_keeps_values() {
        let mut config = SplatConfig::default();
        config.ball_launcher.speed = 12.0;
        let json = config.to_json_string().unwrap();
        let parsed = SplatConfig::from_json_str(&json).unwrap();
        assert_eq!(parsed.ball_launcher.speed, 12.0);
    }
}
