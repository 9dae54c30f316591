//! Directional input for the flying avatar: held keys and touch drags.
//!
//! One `InputState` belongs to one avatar controller. The host forwards its
//! window events into it and drops it when the avatar unmounts, so nothing
//! here is global.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Drag distance (CSS pixels) that maps to a full-deflection axis value.
pub const TOUCH_DRAG_RANGE_PX: f32 = 140.0;

/// How the player steers. Selects the flight tuning preset as well.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputMode {
    #[default]
    Keyboard,
    /// Touch drag on a phone-sized screen.
    Touch,
    /// Touch drag on a tablet-sized screen.
    Tablet,
}

impl InputMode {
    pub fn is_touch(self) -> bool {
        matches!(self, InputMode::Touch | InputMode::Tablet)
    }
}

/// An in-progress pointer drag (one pointer at a time).
#[derive(Debug, Clone, Copy, PartialEq)]
struct Drag {
    pointer_id: u64,
    start: Vec2,
    delta: Vec2,
}

/// Input state owned by a single avatar controller.
#[derive(Debug, Default)]
pub struct InputState {
    /// Keys currently held down.
    keys_held: HashSet<KeyCode>,
    /// Active touch drag, if any.
    drag: Option<Drag>,
    /// A text field has focus; typing must not steer.
    text_focus: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process a keyboard event.
    pub fn process_keyboard(&mut self, key: KeyCode, state: ElementState) {
        if self.text_focus {
            return;
        }
        match state {
            ElementState::Pressed => {
                self.keys_held.insert(key);
            }
            ElementState::Released => {
                self.keys_held.remove(&key);
            }
        }
    }

    /// Start a drag. Ignored while another pointer is already dragging.
    pub fn process_pointer_down(&mut self, pointer_id: u64, position: Vec2) {
        if self.drag.is_some() {
            return;
        }
        self.drag = Some(Drag {
            pointer_id,
            start: position,
            delta: Vec2::ZERO,
        });
    }

    /// Track the dragging pointer; other pointers are ignored.
    pub fn process_pointer_move(&mut self, pointer_id: u64, position: Vec2) {
        if let Some(drag) = self.drag.as_mut().filter(|d| d.pointer_id == pointer_id) {
            drag.delta = position - drag.start;
        }
    }

    /// End (or cancel) the drag started by `pointer_id`.
    pub fn process_pointer_up(&mut self, pointer_id: u64) {
        if self.drag.is_some_and(|d| d.pointer_id == pointer_id) {
            self.drag = None;
        }
    }

    /// Report whether an editable text element has focus. Gaining focus drops held keys.
    pub fn set_text_focus(&mut self, focused: bool) {
        if self.text_focus != focused {
            log::debug!("Text focus {}", if focused { "gained, flight keys released" } else { "lost" });
        }
        self.text_focus = focused;
        if focused {
            self.keys_held.clear();
        }
    }

    /// Forget everything (window blur, avatar unmount).
    pub fn clear(&mut self) {
        self.keys_held.clear();
        self.drag = None;
    }

    // Query methods

    /// Check if a key is currently held.
    pub fn is_key_held(&self, key: KeyCode) -> bool {
        self.keys_held.contains(&key)
    }

    /// Whether a pointer drag is in progress.
    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Current drag offset from where the pointer went down, in pixels.
    pub fn drag_delta(&self) -> Vec2 {
        self.drag.map(|d| d.delta).unwrap_or(Vec2::ZERO)
    }

    /// Two independent axes in [-1, 1]: x = right, y = toward the viewer (+Z).
    ///
    /// Keyboard axes are ±1 per held key (opposing keys cancel). Touch axes are
    /// the drag delta divided by `TOUCH_DRAG_RANGE_PX`, clamped; screen-down
    /// maps to +Z.
    pub fn directional_axes(&self, mode: InputMode) -> Vec2 {
        if mode.is_touch() {
            let d = self.drag_delta() / TOUCH_DRAG_RANGE_PX;
            return d.clamp(Vec2::splat(-1.0), Vec2::splat(1.0));
        }
        let mut axes = Vec2::ZERO;
        if self.any_held(&[KeyCode::KeyW, KeyCode::ArrowUp]) {
            axes.y -= 1.0;
        }
        if self.any_held(&[KeyCode::KeyS, KeyCode::ArrowDown]) {
            axes.y += 1.0;
        }
        if self.any_held(&[KeyCode::KeyA, KeyCode::ArrowLeft]) {
            axes.x -= 1.0;
        }
        if self.any_held(&[KeyCode::KeyD, KeyCode::ArrowRight]) {
            axes.x += 1.0;
        }
        axes
    }

    /// Lateral steering sign used for banking: -1, 0 or +1 on keyboard, the
    /// (continuous) lateral axis on touch.
    pub fn steer(&self, mode: InputMode) -> f32 {
        self.directional_axes(mode).x.clamp(-1.0, 1.0)
    }

    fn any_held(&self, keys: &[KeyCode]) -> bool {
        keys.iter().any(|k| self.keys_held.contains(k))
    }
}

// Re-export for convenience
pub use winit::event::ElementState;
pub use winit::keyboard::KeyCode;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposing_keys_cancel() {
        let mut input = InputState::new();
        input.process_keyboard(KeyCode::KeyA, ElementState::Pressed);
        input.process_keyboard(KeyCode::ArrowRight, ElementState::Pressed);
        input.process_keyboard(KeyCode::KeyW, ElementState::Pressed);
        assert_eq!(input.directional_axes(InputMode::Keyboard), Vec2::new(0.0, -1.0));

        input.process_keyboard(KeyCode::KeyA, ElementState::Released);
        assert_eq!(input.directional_axes(InputMode::Keyboard), Vec2::new(1.0, -1.0));
        assert_eq!(input.steer(InputMode::Keyboard), 1.0);
    }

    #[test]
    fn touch_drag_is_normalized_and_clamped() {
        let mut input = InputState::new();
        input.process_pointer_down(7, Vec2::new(100.0, 100.0));
        input.process_pointer_move(7, Vec2::new(170.0, 500.0));
        let axes = input.directional_axes(InputMode::Touch);
        assert!((axes.x - 0.5).abs() < 1e-6);
        assert_eq!(axes.y, 1.0);

        // A second finger neither restarts nor moves the drag.
        input.process_pointer_down(8, Vec2::ZERO);
        input.process_pointer_move(8, Vec2::ZERO);
        assert!((input.drag_delta().x - 70.0).abs() < 1e-6);

        input.process_pointer_up(8);
        assert!(input.is_dragging());
        input.process_pointer_up(7);
        assert_eq!(input.directional_axes(InputMode::Tablet), Vec2::ZERO);
    }

    #[test]
    fn text_focus_suppresses_keys() {
        let mut input = InputState::new();
        input.process_keyboard(KeyCode::KeyD, ElementState::Pressed);
        input.set_text_focus(true);
        assert_eq!(input.directional_axes(InputMode::Keyboard), Vec2::ZERO);
        input.process_keyboard(KeyCode::KeyS, ElementState::Pressed);
        assert!(!input.is_key_held(KeyCode::KeyS));

        input.set_text_focus(false);
        input.process_keyboard(KeyCode::KeyS, ElementState::Pressed);
        assert_eq!(input.directional_axes(InputMode::Keyboard), Vec2::new(0.0, 1.0));
    }

    #[test]
    fn keyboard_mode_ignores_drag() {
        let mut input = InputState::new();
        input.process_pointer_down(1, Vec2::ZERO);
        input.process_pointer_move(1, Vec2::new(500.0, 0.0));
        assert_eq!(input.directional_axes(InputMode::Keyboard), Vec2::ZERO);
    }
}
