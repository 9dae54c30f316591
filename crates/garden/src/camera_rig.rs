//! Parallax follow camera: the view drifts a fraction of the avatar's offset
//! from the scene center, so the garden stays framed while the plane moves.

use glam::Vec3;
use renderer::Camera;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum RigError {
    #[error("camera rig `{field}` is not finite")]
    NonFinite { field: &'static str },
    #[error("camera rig stiffness {0} is outside [0, 1]")]
    Stiffness(f32),
    #[error("camera rig reference_aspect {0} must be positive")]
    ReferenceAspect(f32),
    #[error("camera rig max_boost {0} must be at least 1")]
    MaxBoost(f32),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RigConfig {
    /// Point the parallax offsets are measured from; also the initial look target.
    pub center: Vec3,
    /// Fraction of the avatar offset applied to the camera position.
    pub parallax: Vec3,
    /// Fraction of the avatar offset applied to the look target.
    pub look_parallax: Vec3,
    /// Per-frame (at 60 fps) smoothing factor.
    pub stiffness: f32,
    /// Aspect ratio below which parallax is boosted.
    pub reference_aspect: f32,
    pub max_boost: f32,
}

impl Default for RigConfig {
    fn default() -> Self {
        Self {
            center: Vec3::new(0.0, 0.8, 0.0),
            parallax: Vec3::new(0.22, 0.08, 0.18),
            look_parallax: Vec3::new(0.35, 0.12, 0.35),
            stiffness: 0.06,
            reference_aspect: 1.35,
            max_boost: 1.85,
        }
    }
}

impl RigConfig {
    pub fn validate(&self) -> Result<(), RigError> {
        let vectors = [
            ("center", self.center),
            ("parallax", self.parallax),
            ("look_parallax", self.look_parallax),
        ];
        if let Some(&(field, _)) = vectors.iter().find(|(_, v)| !v.is_finite()) {
            return Err(RigError::NonFinite { field });
        }
        if !(0.0..=1.0).contains(&self.stiffness) {
            return Err(RigError::Stiffness(self.stiffness));
        }
        if !(self.reference_aspect.is_finite() && self.reference_aspect > 0.0) {
            return Err(RigError::ReferenceAspect(self.reference_aspect));
        }
        if !(self.max_boost.is_finite() && self.max_boost >= 1.0) {
            return Err(RigError::MaxBoost(self.max_boost));
        }
        Ok(())
    }

    /// Parallax multiplier for narrow viewports, in `[1, max_boost]`.
    pub fn frame_boost(&self, aspect: f32) -> f32 {
        if !(aspect.is_finite() && aspect > 0.0) {
            return 1.0;
        }
        (self.reference_aspect / aspect).clamp(1.0, self.max_boost.max(1.0))
    }

    /// Frame-rate independent blend factor for a step of `dt` seconds.
    pub fn blend(&self, dt: f32) -> f32 {
        1.0 - (1.0 - self.stiffness).powf(dt.max(0.0) * 60.0)
    }
}

/// Rest pose captured on the first tick, plus the smoothed look target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraFollowState {
    pub base_camera: Vec3,
    pub base_look: Vec3,
    pub smoothed_look: Vec3,
}

#[derive(Debug, Clone, Default)]
pub struct ParallaxRig {
    pub config: RigConfig,
    state: Option<CameraFollowState>,
}

impl ParallaxRig {
    pub fn new(config: RigConfig) -> Self {
        Self { config, state: None }
    }

    pub fn state(&self) -> Option<&CameraFollowState> {
        self.state.as_ref()
    }

    /// Forget the captured rest pose; the next tick re-captures it.
    pub fn reset(&mut self) {
        self.state = None;
    }

    /// Move `camera` toward the parallax pose for `avatar`. Skips the tick
    /// when there is no avatar. Returns whether the camera was touched.
    ///
    /// The camera keeps its current distance to the look target, so a zoom
    /// applied by the host between frames sticks.
    pub fn update(&mut self, camera: &mut Camera, avatar: Option<Vec3>, aspect: f32, dt: f32) -> bool {
        let Some(avatar) = avatar else {
            return false;
        };
        let cfg = self.config;
        let state = self.state.get_or_insert_with(|| CameraFollowState {
            base_camera: camera.position(),
            base_look: cfg.center,
            smoothed_look: cfg.center,
        });

        let boost = cfg.frame_boost(aspect);
        let delta = avatar - cfg.center;
        let desired_cam = state.base_camera + delta * cfg.parallax * boost;
        let desired_look = state.base_look + delta * cfg.look_parallax * boost;

        let distance = camera.distance_to(state.smoothed_look);
        let dir = (desired_cam - desired_look).normalize_or_zero();
        let zoom_aware = desired_look + dir * distance;

        let k = cfg.blend(dt);
        let lerped = camera.position().lerp(zoom_aware, k);
        state.smoothed_look = state.smoothed_look.lerp(desired_look, k);

        let offset = lerped - state.smoothed_look;
        let position = if offset.length_squared() > 1e-12 {
            state.smoothed_look + offset.normalize() * distance
        } else {
            lerped
        };
        camera.set_position(position);
        camera.look_at(state.smoothed_look);
        true
    }
}
