//! Error types for impact resolution, impulses and launching.

use painting::StrokeError;

/// Rejected splash parameters.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ImpactError {
    #[error("Invalid paint radius: {0}")]
    InvalidRadius(f32),

    #[error("Splash count must be at least 1")]
    InvalidSplashCount,

    #[error("Invalid paint color: {0}")]
    InvalidColor(#[from] StrokeError),
}

/// Rejected radial impulse parameters.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ImpulseError {
    #[error("Invalid impulse radius: {0}")]
    InvalidRadius(f32),

    #[error("Invalid impulse magnitude: {0}")]
    InvalidMagnitude(f32),
}

/// Launcher construction and trigger failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LaunchError {
    #[error("Launcher has no aim source")]
    MissingAimSource,

    #[error("Invalid launch speed: {0}")]
    InvalidSpeed(f32),

    #[error("Invalid projectile mass: {0}")]
    InvalidMass(f32),

    #[error("Invalid projectile size: {0}")]
    InvalidSize(f32),

    #[error("Launch direction is degenerate")]
    InvalidDirection,

    #[error("Invalid paint payload: {0}")]
    Payload(#[from] ImpactError),
}
