//! Common ECS components used by the scene graph.

use hecs::Entity;

/// Attaches an entity to a parent; its `Transform` is then local to the parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parent(pub Entity);

/// Human-readable node name (debug output, lookups in tests).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Name(pub String);

impl Name {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

/// Mesh reference component - links entity to a mesh and its material for rendering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MeshInstance {
    pub mesh_id: u32,
    pub material_id: u64,
}

impl MeshInstance {
    pub fn new(mesh_id: u32, material_id: u64) -> Self {
        Self { mesh_id, material_id }
    }
}

/// Tag component for the avatar's root node (position, carries the flight state).
#[derive(Debug, Clone, Copy, Default)]
pub struct AvatarRoot;

/// Tag component for the avatar's visual child (banking, pitch, hover bob).
#[derive(Debug, Clone, Copy, Default)]
pub struct AvatarVisual;

/// One scattered prop: which patch produced it and at what index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScatteredProp {
    pub patch_key: String,
    pub index: usize,
}
