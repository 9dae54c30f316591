//! Procedural generation for the garden: keyed seeding, prop scattering and
//! ground geometry.

pub mod platform;
pub mod rng;
pub mod scatter;

pub use platform::*;
pub use rng::*;
pub use scatter::*;
