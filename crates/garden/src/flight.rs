//! Paper-airplane avatar: a short scripted intro, then damped planar flight.

use std::f32::consts::{PI, TAU};

use engine_core::Transform;
use glam::{Vec2, Vec3};
use input::{InputMode, InputState};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Length of the landing intro in seconds.
pub const INTRO_DURATION: f32 = 2.0;
/// Where the intro starts, relative to the rest position.
pub const SPAWN_OFFSET: Vec3 = Vec3::new(-0.25, 0.65, 0.9);

#[derive(Debug, Error, PartialEq)]
pub enum TuningError {
    #[error("flight tuning `{field}` is not finite")]
    NonFinite { field: &'static str },
    #[error("flight tuning `{field}` = {value} is outside [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },
    #[error("flight bounds on {axis} are inverted: min {min} > max {max}")]
    InvertedBounds { axis: &'static str, min: f32, max: f32 },
}

/// Horizontal flight area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlightBounds {
    pub min_x: f32,
    pub max_x: f32,
    pub min_z: f32,
    pub max_z: f32,
}

impl Default for FlightBounds {
    fn default() -> Self {
        Self {
            min_x: -3.8,
            max_x: 3.8,
            min_z: -3.0,
            max_z: 3.2,
        }
    }
}

impl FlightBounds {
    pub fn validate(&self) -> Result<(), TuningError> {
        for (axis, min, max) in [("x", self.min_x, self.max_x), ("z", self.min_z, self.max_z)] {
            if !min.is_finite() || !max.is_finite() {
                return Err(TuningError::NonFinite { field: "bounds" });
            }
            if min > max {
                return Err(TuningError::InvertedBounds { axis, min, max });
            }
        }
        Ok(())
    }

    /// Clamp a point into the area. Never panics, even on unvalidated bounds.
    pub fn clamp(&self, x: f32, z: f32) -> (f32, f32) {
        (x.max(self.min_x).min(self.max_x), z.max(self.min_z).min(self.max_z))
    }

    pub fn contains(&self, x: f32, z: f32) -> bool {
        (self.min_x..=self.max_x).contains(&x) && (self.min_z..=self.max_z).contains(&z)
    }
}

/// Flight feel. Velocity is in world units per tick, not per second.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlightTuning {
    /// Acceleration per second of full input.
    pub speed: f32,
    pub max_vel: f32,
    /// Per-tick velocity multiplier.
    pub damping: f32,
    pub turn_lerp: f32,
    pub bank_max: f32,
    pub bank_lerp: f32,
    pub pitch_strength: f32,
    pub pitch_lerp: f32,
    /// Longest step a single tick may integrate.
    pub max_dt: f32,
    pub bounds: FlightBounds,
}

impl FlightTuning {
    pub fn keyboard() -> Self {
        Self {
            speed: 0.9,
            max_vel: 0.08,
            damping: 0.95,
            turn_lerp: 0.14,
            bank_max: 0.65,
            bank_lerp: 0.18,
            pitch_strength: 0.16,
            pitch_lerp: 0.1,
            max_dt: 1.0 / 30.0,
            bounds: FlightBounds::default(),
        }
    }

    /// Phone-sized touch screens: slower and tighter.
    pub fn touch() -> Self {
        Self {
            speed: 0.495,
            max_vel: 0.027,
            damping: 0.92,
            ..Self::keyboard()
        }
    }

    pub fn tablet() -> Self {
        Self {
            speed: 0.7,
            max_vel: 0.042,
            damping: 0.92,
            ..Self::keyboard()
        }
    }

    /// Reject values that would make a tick produce NaN or run away.
    pub fn validate(&self) -> Result<(), TuningError> {
        let unit = [
            ("damping", self.damping),
            ("turn_lerp", self.turn_lerp),
            ("bank_lerp", self.bank_lerp),
            ("pitch_lerp", self.pitch_lerp),
        ];
        let non_negative = [
            ("speed", self.speed),
            ("max_vel", self.max_vel),
            ("bank_max", self.bank_max),
        ];
        let signed = [("pitch_strength", self.pitch_strength)];
        for &(field, value) in unit.iter().chain(&non_negative).chain(&signed) {
            if !value.is_finite() {
                return Err(TuningError::NonFinite { field });
            }
        }
        if let Some(&(field, value)) = unit.iter().find(|(_, v)| !(0.0..=1.0).contains(v)) {
            return Err(TuningError::OutOfRange {
                field,
                value,
                min: 0.0,
                max: 1.0,
            });
        }
        if let Some(&(field, value)) = non_negative.iter().find(|(_, v)| *v < 0.0) {
            return Err(TuningError::OutOfRange {
                field,
                value,
                min: 0.0,
                max: f32::MAX,
            });
        }
        if !(self.max_dt.is_finite() && self.max_dt > 0.0) {
            return Err(TuningError::OutOfRange {
                field: "max_dt",
                value: self.max_dt,
                min: f32::MIN_POSITIVE,
                max: f32::MAX,
            });
        }
        self.bounds.validate()
    }

    pub fn for_mode(mode: InputMode) -> Self {
        match mode {
            InputMode::Keyboard => Self::keyboard(),
            InputMode::Touch => Self::touch(),
            InputMode::Tablet => Self::tablet(),
        }
    }
}

impl Default for FlightTuning {
    fn default() -> Self {
        Self::keyboard()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlightPhase {
    Intro,
    Flying,
}

/// Motion state and input of one mounted avatar.
#[derive(Debug)]
pub struct AvatarController {
    tuning: FlightTuning,
    mode: InputMode,
    input: InputState,
    rest_position: Vec3,
    rest_rotation: Vec3,
    phase: FlightPhase,
    /// Accumulated clamped time.
    time: f32,
    position: Vec3,
    velocity: Vec2,
    /// Visual pitch (x), yaw (y) and roll (z).
    orientation: Vec3,
    /// Visual hover on top of `position.y`.
    hover: f32,
    moved_once: bool,
}

impl AvatarController {
    pub fn new(rest_position: Vec3, rest_rotation: Vec3, mode: InputMode) -> Self {
        Self {
            tuning: FlightTuning::for_mode(mode),
            mode,
            input: InputState::new(),
            rest_position,
            rest_rotation,
            phase: FlightPhase::Intro,
            time: 0.0,
            position: rest_position + SPAWN_OFFSET,
            velocity: Vec2::ZERO,
            orientation: Vec3::ZERO,
            hover: 0.0,
            moved_once: false,
        }
    }

    pub fn with_tuning(mut self, tuning: FlightTuning) -> Self {
        self.tuning = tuning;
        self
    }

    /// Switch input mode; the tuning follows the mode's preset.
    pub fn set_input_mode(&mut self, mode: InputMode) {
        if mode != self.mode {
            self.mode = mode;
            self.tuning = FlightTuning::for_mode(mode);
            self.input.clear();
        }
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut InputState {
        &mut self.input
    }

    pub fn tuning(&self) -> &FlightTuning {
        &self.tuning
    }

    pub fn phase(&self) -> FlightPhase {
        self.phase
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Planar velocity (x, z) in units per tick.
    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// Visual (pitch, yaw, roll).
    pub fn orientation(&self) -> Vec3 {
        self.orientation
    }

    pub fn hover(&self) -> f32 {
        self.hover
    }

    pub fn has_moved(&self) -> bool {
        self.moved_once
    }

    /// Transform of the avatar root node.
    pub fn root_transform(&self) -> Transform {
        Transform::from_position_euler(self.position, self.rest_rotation)
    }

    /// Transform of the visual child (hover and attitude), relative to the root.
    pub fn visual_transform(&self) -> Transform {
        Transform::from_position_euler(Vec3::new(0.0, self.hover, 0.0), self.orientation)
    }

    /// Advance one frame. Returns `true` on the tick the avatar first starts moving.
    pub fn tick(&mut self, dt: f32) -> bool {
        let dt = if dt.is_finite() { dt.min(self.tuning.max_dt).max(0.0) } else { 0.0 };
        self.time += dt;

        if self.phase == FlightPhase::Intro {
            if self.time < INTRO_DURATION {
                self.tick_intro();
                return false;
            }
            self.phase = FlightPhase::Flying;
            log::debug!("Avatar intro finished at {:?}", self.position);
        }
        self.tick_flying(dt)
    }

    fn tick_intro(&mut self) {
        let t = self.time / INTRO_DURATION;
        let e = smoothstep(t);
        let start = self.rest_position + SPAWN_OFFSET;
        let wobble = 1.0 - e;
        let time = self.time;

        let mut pos = start.lerp(self.rest_position, e);
        pos.x += (time * 7.0).sin() * 0.06 * wobble;
        pos.z += (time * 5.0).sin() * 0.03 * wobble;

        // Small bounce as the plane settles.
        let settle = (t - 0.82) / 0.18;
        if settle > 0.0 {
            let se = smoothstep(settle.clamp(0.0, 1.0));
            pos.y += (se * PI).sin() * 0.05 * (1.0 - se);
        }

        self.position = pos;
        self.orientation = Vec3::new(
            -0.25 * wobble,
            (time * 3.2).sin() * 0.35 * wobble,
            (time * 6.5).sin() * 0.25 * wobble,
        );
        self.hover = (time * 3.0).sin() * 0.02 * wobble;
        self.velocity = Vec2::ZERO;
    }

    fn tick_flying(&mut self, dt: f32) -> bool {
        let tuning = self.tuning;
        let axes = self.input.directional_axes(self.mode);

        self.velocity += axes * tuning.speed * dt;
        self.velocity *= tuning.damping;
        self.velocity = self.velocity.clamp_length_max(tuning.max_vel);

        let speed_sq = self.velocity.length_squared();
        let has_input = axes.x.abs() + axes.y.abs() > 0.001;
        let first_move = !self.moved_once && has_input && speed_sq > 1e-5;
        if first_move {
            self.moved_once = true;
        }

        let (x, z) = tuning
            .bounds
            .clamp(self.position.x + self.velocity.x, self.position.z + self.velocity.y);

        let steer = self.input.steer(self.mode);
        if speed_sq > 1e-6 {
            let heading = self.velocity.x.atan2(self.velocity.y);
            self.orientation.y = lerp_angle(self.orientation.y, heading, tuning.turn_lerp);
            self.orientation.z = lerp(self.orientation.z, steer * tuning.bank_max, tuning.bank_lerp);
            self.orientation.x = lerp(
                self.orientation.x,
                -self.velocity.y * tuning.pitch_strength,
                tuning.pitch_lerp,
            );
        } else {
            self.orientation.y = lerp_angle(self.orientation.y, 0.0, 0.1);
            self.orientation.z = lerp(self.orientation.z, 0.0, 0.1);
            self.orientation.x = lerp(self.orientation.x, 0.0, 0.1);
        }

        let time = self.time;
        let y = self.rest_position.y + (time * 1.5).sin() * 0.08 + (speed_sq * 30.0).min(0.05);
        self.position = Vec3::new(x, y, z);

        let speed01 = (speed_sq * 220.0).clamp(0.0, 1.0);
        let hover = (time * 1.2 * TAU).sin() * 0.02;
        let bob = (time * 6.0).sin() * 0.01 * speed01 + (time * 3.5).sin() * 0.02 * speed01;
        self.hover = hover + bob;

        first_move
    }
}

fn smoothstep(t: f32) -> f32 {
    t * t * (3.0 - 2.0 * t)
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Lerp between angles along the shorter arc.
fn lerp_angle(a: f32, b: f32, t: f32) -> f32 {
    let diff = (b - a + PI).rem_euclid(TAU) - PI;
    a + diff * t
}
