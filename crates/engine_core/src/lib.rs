//! Core engine types and utilities for the garden scene.
//!
//! This crate provides the foundational types used across all scene systems:
//! - Transform and spatial components
//! - Frame clock
//! - Scene-graph components and world-transform composition
//! - Bounding boxes and model height normalization

pub mod bounds;
pub mod components;
pub mod hierarchy;
pub mod time;
pub mod transform;

pub use bounds::*;
pub use components::*;
pub use hierarchy::*;
pub use time::*;
pub use transform::*;

// Re-export commonly used types
pub use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
pub use hecs::{Entity, World};
