//! Vertex and instance layouts for GPU upload.

use bytemuck::{Pod, Zeroable};
use glam::Vec4;

/// Standard vertex with position, normal, UV coordinates, and color.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coords: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    pub fn new(position: [f32; 3], normal: [f32; 3], tex_coords: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            tex_coords,
            color: [1.0, 1.0, 1.0, 1.0],
        }
    }

    pub fn with_color(mut self, color: Vec4) -> Self {
        self.color = color.into();
        self
    }

    /// Byte distance between consecutive vertices.
    pub const STRIDE: usize = std::mem::size_of::<Vertex>();
}

/// Instance data for instanced rendering.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct InstanceData {
    /// Model matrix (4x4, column-major)
    pub model: [[f32; 4]; 4],
    /// Color tint
    pub color: [f32; 4],
}

impl InstanceData {
    pub fn new(model: [[f32; 4]; 4], color: [f32; 4]) -> Self {
        Self { model, color }
    }
}

impl Default for InstanceData {
    fn default() -> Self {
        Self {
            model: glam::Mat4::IDENTITY.to_cols_array_2d(),
            color: [1.0, 1.0, 1.0, 1.0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::Transform;
    use glam::Vec3;

    #[test]
    fn layouts_are_tightly_packed() {
        assert_eq!(Vertex::STRIDE, 48);
        assert_eq!(std::mem::size_of::<InstanceData>(), 80);
    }

    #[test]
    fn instance_carries_translation_in_last_column() {
        let t = Transform::from_position(Vec3::new(1.6, -0.15, -0.4)).with_uniform_scale(2.0);
        let inst = InstanceData::new(t.to_matrix().to_cols_array_2d(), [1.0; 4]);
        assert_eq!(inst.model[3][..3], [1.6, -0.15, -0.4]);
        assert_eq!(inst.model[0][0], 2.0);
        let bytes: &[u8] = bytemuck::bytes_of(&inst);
        assert_eq!(bytes.len(), 80);
    }
}
