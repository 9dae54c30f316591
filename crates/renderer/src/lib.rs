//! Render-side scene state for the garden: camera, materials with
//! pre-compile shader hooks, wind sway and GPU buffer layouts.

pub mod camera;
pub mod material;
pub mod vertex;
pub mod wind;

pub use camera::*;
pub use material::*;
pub use vertex::*;
pub use wind::*;

/// WGSL template for lit surfaces. Hooks splice code in at its markers.
pub const LIT_SHADER_TEMPLATE: &str = include_str!("shaders/lit.wgsl");
