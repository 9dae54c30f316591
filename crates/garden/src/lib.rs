//! Garden scene: scattered, wind-swayed props and a paper airplane that flies
//! between waypoint beacons under a parallax follow camera.

pub mod camera_rig;
pub mod config;
pub mod flight;
pub mod scene;
pub mod waypoints;

pub use camera_rig::{CameraFollowState, ParallaxRig, RigConfig, RigError};
pub use config::{ConfigError, SceneConfig, DEFAULT_CONFIG_FILE};
pub use flight::{AvatarController, FlightBounds, FlightPhase, FlightTuning, TuningError};
pub use scene::{GardenScene, PatchRender, SceneEvent};
pub use waypoints::{
    BeaconStyle, BeaconVisual, WaypointDefinition, WaypointError, WaypointEvent, WaypointTracker,
};
