//! Waypoint beacons: proximity enter/exit with hysteresis, and the bobbing,
//! pulsing beacon each waypoint shows.

use std::collections::HashSet;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Exit radius as a multiple of the trigger radius when none is given.
pub const DEFAULT_EXIT_FACTOR: f32 = 1.4;

#[derive(Debug, Error, PartialEq)]
pub enum WaypointError {
    #[error("waypoint id must not be empty")]
    EmptyId,
    #[error("waypoint `{0}` is defined twice")]
    DuplicateId(String),
    #[error("waypoint `{id}`: trigger_radius must be finite and > 0, got {radius}")]
    InvalidTriggerRadius { id: String, radius: f32 },
    #[error("waypoint `{id}`: exit_radius {exit} is smaller than trigger_radius {trigger}")]
    ExitInsideTrigger { id: String, trigger: f32, exit: f32 },
    #[error("waypoint `{id}`: position is not finite")]
    NonFinitePosition { id: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaypointDefinition {
    pub id: String,
    pub title: String,
    pub message: String,
    pub target_position: Vec3,
    #[serde(default = "default_beacon_offset")]
    pub beacon_offset: Vec3,
    #[serde(default = "default_trigger_radius")]
    pub trigger_radius: f32,
    #[serde(default)]
    pub exit_radius: Option<f32>,
}

fn default_beacon_offset() -> Vec3 {
    Vec3::new(0.0, 2.0, 0.0)
}
fn default_trigger_radius() -> f32 {
    1.2
}

impl WaypointDefinition {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        message: impl Into<String>,
        target_position: Vec3,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            message: message.into(),
            target_position,
            beacon_offset: default_beacon_offset(),
            trigger_radius: default_trigger_radius(),
            exit_radius: None,
        }
    }

    pub fn with_beacon_offset(mut self, offset: Vec3) -> Self {
        self.beacon_offset = offset;
        self
    }

    pub fn with_radii(mut self, trigger: f32, exit: Option<f32>) -> Self {
        self.trigger_radius = trigger;
        self.exit_radius = exit;
        self
    }

    pub fn exit_radius(&self) -> f32 {
        self.exit_radius.unwrap_or(self.trigger_radius * DEFAULT_EXIT_FACTOR)
    }

    pub fn beacon_position(&self) -> Vec3 {
        self.target_position + self.beacon_offset
    }

    pub fn validate(&self) -> Result<(), WaypointError> {
        if self.id.is_empty() {
            return Err(WaypointError::EmptyId);
        }
        if !self.target_position.is_finite() || !self.beacon_offset.is_finite() {
            return Err(WaypointError::NonFinitePosition { id: self.id.clone() });
        }
        if !(self.trigger_radius.is_finite() && self.trigger_radius > 0.0) {
            return Err(WaypointError::InvalidTriggerRadius {
                id: self.id.clone(),
                radius: self.trigger_radius,
            });
        }
        let exit = self.exit_radius();
        // NaN fails the comparison and lands here too.
        if !(exit >= self.trigger_radius) {
            return Err(WaypointError::ExitInsideTrigger {
                id: self.id.clone(),
                trigger: self.trigger_radius,
                exit,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WaypointRuntimeState {
    pub is_inside: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WaypointEvent {
    Entered { id: String, title: String, message: String },
    Exited { id: String },
}

/// Cosmetic beacon parameters shared by every waypoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeaconStyle {
    pub bounce_height: f32,
    pub bounce_speed: f32,
    pub pulse_speed: f32,
    pub base_intensity: f32,
    pub pulse_intensity: f32,
    /// Intensity multiplier while the avatar is inside.
    pub active_boost: f32,
    pub range_active: f32,
    pub range_idle: f32,
}

impl Default for BeaconStyle {
    fn default() -> Self {
        Self {
            bounce_height: 0.05,
            bounce_speed: 3.0,
            pulse_speed: 2.5,
            base_intensity: 0.6,
            pulse_intensity: 1.2,
            active_boost: 1.6,
            range_active: 6.0,
            range_idle: 4.0,
        }
    }
}

/// Where and how brightly to draw one beacon this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeaconVisual {
    pub position: Vec3,
    pub light_intensity: f32,
    pub light_range: f32,
    /// Linear RGB: white while idle, orange while active.
    pub color: Vec3,
}

const IDLE_COLOR: Vec3 = Vec3::ONE;
const ACTIVE_COLOR: Vec3 = Vec3::new(1.0, 0.647, 0.0);

impl BeaconStyle {
    pub fn visual(&self, waypoint: &WaypointDefinition, active: bool, t: f32) -> BeaconVisual {
        let mut position = waypoint.beacon_position();
        position.y += (t * self.bounce_speed).sin() * self.bounce_height;
        let pulse = self.base_intensity + (t * self.pulse_speed).sin() * self.pulse_intensity * 0.5;
        BeaconVisual {
            position,
            light_intensity: if active { pulse * self.active_boost } else { pulse },
            light_range: if active { self.range_active } else { self.range_idle },
            color: if active { ACTIVE_COLOR } else { IDLE_COLOR },
        }
    }
}

/// Outside/Inside state machine for every waypoint.
#[derive(Debug, Clone, Default)]
pub struct WaypointTracker {
    waypoints: Vec<(WaypointDefinition, WaypointRuntimeState)>,
}

impl WaypointTracker {
    pub fn new(definitions: Vec<WaypointDefinition>) -> Result<Self, WaypointError> {
        let mut ids = HashSet::new();
        for def in &definitions {
            def.validate()?;
            if !ids.insert(def.id.as_str()) {
                return Err(WaypointError::DuplicateId(def.id.clone()));
            }
        }
        Ok(Self {
            waypoints: definitions
                .into_iter()
                .map(|d| (d, WaypointRuntimeState::default()))
                .collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn definitions(&self) -> impl Iterator<Item = &WaypointDefinition> {
        self.waypoints.iter().map(|(d, _)| d)
    }

    pub fn is_inside(&self, id: &str) -> bool {
        self.waypoints.iter().any(|(d, s)| d.id == id && s.is_inside)
    }

    /// Run every state machine against the avatar's world position.
    /// No avatar means no transitions.
    pub fn update(&mut self, avatar: Option<Vec3>) -> Vec<WaypointEvent> {
        let Some(avatar) = avatar else {
            return Vec::new();
        };
        let mut events = Vec::new();
        for (def, state) in &mut self.waypoints {
            let d = avatar.distance(def.target_position);
            if !state.is_inside && d <= def.trigger_radius {
                state.is_inside = true;
                events.push(WaypointEvent::Entered {
                    id: def.id.clone(),
                    title: def.title.clone(),
                    message: def.message.clone(),
                });
            } else if state.is_inside && d > def.exit_radius() {
                state.is_inside = false;
                events.push(WaypointEvent::Exited { id: def.id.clone() });
            }
        }
        events
    }

    pub fn beacons(&self, style: &BeaconStyle, t: f32) -> Vec<BeaconVisual> {
        self.waypoints
            .iter()
            .map(|(d, s)| style.visual(d, s.is_inside, t))
            .collect()
    }
}

/// The four biography stops around the garden.
pub fn default_waypoints() -> Vec<WaypointDefinition> {
    vec![
        WaypointDefinition::new(
            "windmill",
            "Roots in the Netherlands",
            "Grew up near Amsterdam, tinkering with early web editors long before it was a job.",
            Vec3::new(-2.6, -0.15, -1.5),
        )
        .with_beacon_offset(Vec3::new(0.0, 1.6, 0.0))
        .with_radii(1.25, None),
        WaypointDefinition::new(
            "postbox",
            "Moving to London",
            "Restaurant management in London: busy floors, quick decisions, steady teams.",
            Vec3::new(-3.1, 0.45, 1.2),
        )
        .with_beacon_offset(Vec3::new(0.0, 0.95, 0.0))
        .with_radii(1.1, None),
        WaypointDefinition::new(
            "loungechair",
            "Barcelona bootcamp",
            "A full-stack bootcamp alongside full-time work, three projects from MVP to team build.",
            Vec3::new(2.6, 0.1, 2.0),
        )
        .with_beacon_offset(Vec3::new(0.0, 1.4, 0.0))
        .with_radii(1.2, None),
        WaypointDefinition::new(
            "laptop",
            "By the sea, building things",
            "Frontend engineering by the coast, with an eye on architecture and performance.",
            Vec3::new(2.72, 0.52, -2.9),
        )
        .with_beacon_offset(Vec3::new(0.0, 1.0, 0.0))
        .with_radii(1.2, None),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(d: f32) -> Option<Vec3> {
        Some(Vec3::new(d, 0.0, 0.0))
    }

    #[test]
    fn hysteresis_sequence() {
        let wp = WaypointDefinition::new("w", "W", "msg", Vec3::ZERO).with_radii(1.0, Some(1.4));
        let mut tracker = WaypointTracker::new(vec![wp]).unwrap();

        let e = tracker.update(at(0.5));
        assert_eq!(
            e,
            vec![WaypointEvent::Entered {
                id: "w".into(),
                title: "W".into(),
                message: "msg".into()
            }]
        );
        assert!(tracker.update(at(1.2)).is_empty(), "inside the exit band");
        assert!(tracker.update(at(1.0)).is_empty(), "already inside");
        assert_eq!(tracker.update(at(1.5)), vec![WaypointEvent::Exited { id: "w".into() }]);
        assert!(!tracker.is_inside("w"));
        assert!(tracker.update(at(1.2)).is_empty(), "re-entry needs the trigger radius");
    }

    #[test]
    fn boundaries_are_inclusive_on_enter_exclusive_on_exit() {
        let wp = WaypointDefinition::new("w", "W", "", Vec3::ZERO).with_radii(1.0, None);
        let mut tracker = WaypointTracker::new(vec![wp]).unwrap();
        assert_eq!(tracker.update(at(1.0)).len(), 1);
        assert!(tracker.update(at(1.4)).is_empty());
        assert_eq!(tracker.update(at(1.41)).len(), 1);
    }

    #[test]
    fn missing_avatar_changes_nothing() {
        let wp = WaypointDefinition::new("w", "W", "", Vec3::ZERO);
        let mut tracker = WaypointTracker::new(vec![wp]).unwrap();
        tracker.update(at(0.0));
        assert!(tracker.update(None).is_empty());
        assert!(tracker.is_inside("w"));
    }

    #[test]
    fn waypoints_are_independent() {
        let a = WaypointDefinition::new("a", "A", "", Vec3::ZERO).with_radii(1.0, None);
        let b = WaypointDefinition::new("b", "B", "", Vec3::new(1.5, 0.0, 0.0)).with_radii(1.0, None);
        let mut tracker = WaypointTracker::new(vec![a, b]).unwrap();
        let e = tracker.update(at(0.75));
        assert_eq!(e.len(), 2);
        let e = tracker.update(at(2.2));
        assert_eq!(e, vec![WaypointEvent::Exited { id: "a".into() }]);
        assert!(tracker.is_inside("b"));
    }

    #[test]
    fn bad_definitions_rejected() {
        let zero = WaypointDefinition::new("z", "", "", Vec3::ZERO).with_radii(0.0, None);
        assert!(matches!(
            WaypointTracker::new(vec![zero]),
            Err(WaypointError::InvalidTriggerRadius { .. })
        ));
        let tight = WaypointDefinition::new("t", "", "", Vec3::ZERO).with_radii(1.0, Some(0.5));
        assert!(matches!(
            WaypointTracker::new(vec![tight]),
            Err(WaypointError::ExitInsideTrigger { .. })
        ));
        let dup = WaypointDefinition::new("d", "", "", Vec3::ZERO);
        assert_eq!(
            WaypointTracker::new(vec![dup.clone(), dup]).unwrap_err(),
            WaypointError::DuplicateId("d".into())
        );
        assert!(WaypointTracker::new(default_waypoints()).is_ok());
    }

    #[test]
    fn beacon_brightens_when_active() {
        let style = BeaconStyle::default();
        let wp = &default_waypoints()[0];
        let idle = style.visual(wp, false, 0.0);
        let active = style.visual(wp, true, 0.0);
        assert!((idle.position - Vec3::new(-2.6, 1.45, -1.5)).length() < 1e-6);
        assert!((idle.light_intensity - 0.6).abs() < 1e-6);
        assert!((active.light_intensity - 0.96).abs() < 1e-6);
        assert_eq!((idle.light_range, active.light_range), (4.0, 6.0));
    }
}
