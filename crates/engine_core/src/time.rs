//! Frame clock for the per-frame tick.

use std::time::Duration;

/// Shared animation clock: one elapsed time and one frame delta per frame.
///
/// The host steps it once per frame with [`Time::advance`]. Everything that
/// animates off the clock (wind uniforms, beacon bob, avatar hover) reads the
/// same `elapsed_seconds`, so all of it stays in phase.
#[derive(Debug, Clone, Default)]
pub struct Time {
    /// Duration of the last frame.
    delta: Duration,
    /// Total elapsed time since start.
    elapsed: Duration,
    /// Frame count since start.
    frame_count: u64,
}

impl Time {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new frame that lasted `dt`.
    pub fn advance(&mut self, dt: Duration) {
        self.delta = dt;
        self.elapsed += dt;
        self.frame_count += 1;
    }

    /// Get the delta time in seconds.
    pub fn delta_seconds(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    /// Delta time in seconds, capped at `max` (avoids huge steps after a stall).
    pub fn clamped_delta_seconds(&self, max: f32) -> f32 {
        self.delta_seconds().min(max)
    }

    /// Get total elapsed time in seconds.
    pub fn elapsed_seconds(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }

    /// Get the current frame count.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}
