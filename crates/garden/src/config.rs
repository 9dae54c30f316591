//! Scene configuration. Loaded from `scene.ron` in the current directory, or
//! from the path given on the command line.

use std::collections::HashSet;
use std::f32::consts::PI;
use std::path::{Path, PathBuf};

use engine_core::Aabb;
use glam::Vec3;
use input::InputMode;
use procgen::{PatchSpec, PlatformSpec, ScatterError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::camera_rig::{RigConfig, RigError};
use crate::flight::{FlightTuning, TuningError};
use crate::waypoints::{default_waypoints, BeaconStyle, WaypointDefinition, WaypointError};

pub const DEFAULT_CONFIG_FILE: &str = "scene.ron";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid scene config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },
    #[error(transparent)]
    Scatter(#[from] ScatterError),
    #[error(transparent)]
    Waypoint(#[from] WaypointError),
    #[error(transparent)]
    Flight(#[from] TuningError),
    #[error(transparent)]
    Rig(#[from] RigError),
}

/// Avatar rest pose and model size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AvatarConfig {
    pub rest_position: Vec3,
    pub rest_rotation: Vec3,
    /// Model height after normalization.
    pub target_height: f32,
}

impl Default for AvatarConfig {
    fn default() -> Self {
        Self {
            rest_position: Vec3::new(-1.1, 0.75, -0.6),
            rest_rotation: Vec3::ZERO,
            target_height: 0.05,
        }
    }
}

/// Initial camera pose and lens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: Vec3,
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: Vec3::new(5.2, 4.4, 4.0),
            fov_degrees: 38.0,
            near: 0.1,
            far: 80.0,
        }
    }
}

/// Source model for scattered props: its local bounds and the height it is
/// normalized to before patch scaling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropModelConfig {
    pub bounds_min: Vec3,
    pub bounds_max: Vec3,
    pub target_height: f32,
    pub sit_on_ground: bool,
}

impl Default for PropModelConfig {
    fn default() -> Self {
        Self {
            bounds_min: Vec3::new(-0.5, 0.0, -0.5),
            bounds_max: Vec3::new(0.5, 1.0, 0.5),
            target_height: 0.25,
            sit_on_ground: true,
        }
    }
}

impl PropModelConfig {
    pub fn bounds(&self) -> Aabb {
        Aabb::from_points([self.bounds_min, self.bounds_max])
    }
}

/// Everything needed to build a [`crate::GardenScene`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneConfig {
    #[serde(default)]
    pub input_mode: InputMode,
    /// Overrides the input mode's flight preset.
    #[serde(default)]
    pub flight: Option<FlightTuning>,
    #[serde(default)]
    pub avatar: AvatarConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub rig: RigConfig,
    #[serde(default)]
    pub beacon: BeaconStyle,
    #[serde(default)]
    pub platform: PlatformSpec,
    #[serde(default)]
    pub grass: PropModelConfig,
    #[serde(default = "default_patches")]
    pub patches: Vec<PatchSpec>,
    #[serde(default = "default_waypoints")]
    pub waypoints: Vec<WaypointDefinition>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            input_mode: InputMode::default(),
            flight: None,
            avatar: AvatarConfig::default(),
            camera: CameraConfig::default(),
            rig: RigConfig::default(),
            beacon: BeaconStyle::default(),
            platform: PlatformSpec::default(),
            grass: PropModelConfig::default(),
            patches: default_patches(),
            waypoints: default_waypoints(),
        }
    }
}

impl SceneConfig {
    /// Load and validate `path`. A missing file yields the defaults; a file
    /// that exists but does not parse or validate is an error.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let data = match std::fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::warn!("No scene config at {:?}, using defaults", path);
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        let config = Self::parse(&data, path)?;
        log::info!(
            "Loaded scene config from {:?} ({} patches, {} waypoints)",
            path,
            config.patches.len(),
            config.waypoints.len()
        );
        Ok(config)
    }

    pub fn from_ron_str(data: &str) -> Result<Self, ConfigError> {
        Self::parse(data, Path::new("<string>"))
    }

    fn parse(data: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check tuning, patch and waypoint data. Nothing is clamped or dropped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.flight_tuning().validate()?;
        self.rig.validate()?;
        let mut keys = HashSet::new();
        for patch in &self.patches {
            patch.validate()?;
            if !keys.insert(patch.key.as_str()) {
                return Err(ScatterError::DuplicateKey { key: patch.key.clone() }.into());
            }
        }
        let mut ids = HashSet::new();
        for waypoint in &self.waypoints {
            waypoint.validate()?;
            if !ids.insert(waypoint.id.as_str()) {
                return Err(WaypointError::DuplicateId(waypoint.id.clone()).into());
            }
        }
        Ok(())
    }

    /// Flight tuning: the explicit override, else the input mode's preset.
    pub fn flight_tuning(&self) -> FlightTuning {
        self.flight.unwrap_or_else(|| FlightTuning::for_mode(self.input_mode))
    }
}

/// Grass clusters around the garden.
pub fn default_patches() -> Vec<PatchSpec> {
    let grass = |key: &str, pos: Vec3, yaw: f32, count: usize, radius: f32, scale: (f32, f32)| {
        PatchSpec::new(key, pos)
            .with_rotation(Vec3::new(0.0, yaw, 0.0))
            .with_count(count)
            .with_radius(radius)
            .with_scale_range(scale.0, scale.1)
            .with_rotation_jitter(PI * 1.2)
    };
    vec![
        grass("grass1", Vec3::new(1.6, -0.15, -0.4), -PI / 2.25, 10, 0.6, (0.85, 1.2)),
        grass("grass2", Vec3::new(-1.1, -0.15, -2.5), -PI / 1.25, 12, 0.8, (0.8, 0.8)),
        grass("grass3", Vec3::new(-2.3, -0.15, 2.2), -PI / 2.25, 18, 0.9, (0.8, 0.8)),
        grass("grass4", Vec3::new(3.4, -0.15, 3.0), -PI / 2.25, 18, 0.5, (0.8, 0.8)),
        grass("grass5", Vec3::new(3.4, -0.15, -0.7), -PI / 2.25, 11, 0.2, (0.8, 0.8)),
    ]
}
