//! Transform component and utilities for spatial positioning.

use glam::{EulerRot, Mat4, Quat, Vec3};

/// A 3D transform representing position, rotation, and scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Create a new transform at the given position.
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a new transform with position and rotation.
    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            ..Default::default()
        }
    }

    /// Position plus an XYZ Euler rotation (radians), the way scene layouts are authored.
    pub fn from_position_euler(position: Vec3, euler: Vec3) -> Self {
        Self::from_position_rotation(position, euler_xyz(euler))
    }

    /// Builder: set a uniform scale.
    pub fn with_uniform_scale(mut self, scale: f32) -> Self {
        self.scale = Vec3::splat(scale);
        self
    }

    /// Create the model matrix for this transform.
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    /// Mean of the three scale axes.
    pub fn average_scale(&self) -> f32 {
        (self.scale.x + self.scale.y + self.scale.z) / 3.0
    }

    /// Get the forward direction (negative Z in right-handed coordinates).
    pub fn forward(&self) -> Vec3 {
        self.rotation * -Vec3::Z
    }

    /// Point -Z at a target position. No-op when the target is (nearly) the current position.
    pub fn look_at(&mut self, target: Vec3, up: Vec3) {
        let forward = target - self.position;
        if forward.length_squared() > 1e-8 {
            self.rotation = Quat::from_mat4(&Mat4::look_at_rh(self.position, target, up)).inverse();
        }
    }
}

/// Euler angles applied in X, then Y, then Z order.
pub fn euler_xyz(euler: Vec3) -> Quat {
    Quat::from_euler(EulerRot::XYZ, euler.x, euler.y, euler.z)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn look_at_points_forward_at_target() {
        let mut t = Transform::from_position(Vec3::new(0.0, 2.0, 5.0));
        let target = Vec3::new(0.0, 0.8, 0.0);
        t.look_at(target, Vec3::Y);
        let expected = (target - t.position).normalize();
        assert!((t.forward() - expected).length() < 1e-4);
    }

    #[test]
    fn look_at_self_keeps_rotation() {
        let mut t = Transform::from_position_euler(Vec3::ONE, Vec3::new(0.0, 0.5, 0.0));
        let before = t.rotation;
        t.look_at(Vec3::ONE, Vec3::Y);
        assert_eq!(t.rotation, before);
    }

    #[test]
    fn average_scale_of_uniform_scale() {
        let t = Transform::default().with_uniform_scale(0.8);
        assert!((t.average_scale() - 0.8).abs() < 1e-6);
    }
}
