//! splat painting - persistent texture-space paint on 3D surfaces
//!
//! This crate provides the canvas side of the splat system:
//! - [`surface`] - CPU RGBA f32 canvas with straight-alpha "over" blending
//! - [`tiles`] - Tiled canvas with dirty tracking for incremental upload
//! - [`brush`] - Brush strokes, GPU uniforms and the CPU compositor
//! - [`geometry`] / [`raycast`] - Surface meshes and UV rays
//! - [`canvas`] - A paintable surface: geometry plus its owned canvas
//! - [`registry`] - All surfaces, with deferred per-surface stroke queues

pub mod brush;
pub mod canvas;
pub mod constants;
pub mod geometry;
pub mod raycast;
pub mod registry;
pub mod surface;
pub mod tiles;
pub mod types;
pub mod validation;

pub use brush::*;
pub use canvas::*;
pub use constants::*;
pub use geometry::*;
pub use registry::*;
pub use surface::*;
pub use tiles::*;
pub use types::*;
pub use validation::*;
