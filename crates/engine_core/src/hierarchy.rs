//! World-space queries over the `Parent` hierarchy.

use glam::{Mat4, Vec3};
use hecs::{Entity, World};

use crate::components::Parent;
use crate::transform::Transform;

/// Hierarchies deeper than this are treated as a cycle.
const MAX_DEPTH: usize = 64;

/// Compose the entity's local transform with all of its ancestors.
///
/// Returns `None` when the entity (or an ancestor) no longer exists or has no
/// `Transform`; callers treat that as "node not available this frame".
pub fn world_matrix(world: &World, entity: Entity) -> Option<Mat4> {
    let mut matrix = Mat4::IDENTITY;
    let mut current = entity;
    for _ in 0..MAX_DEPTH {
        let local = world.get::<&Transform>(current).ok()?.to_matrix();
        matrix = local * matrix;
        match world.get::<&Parent>(current) {
            Ok(parent) => current = parent.0,
            Err(_) => return Some(matrix),
        }
    }
    log::warn!("Parent chain of {:?} exceeds {} levels; assuming a cycle", entity, MAX_DEPTH);
    None
}

/// World-space position of an entity's origin.
pub fn world_position(world: &World, entity: Entity) -> Option<Vec3> {
    world_matrix(world, entity).map(|m| m.transform_point3(Vec3::ZERO))
}

/// World-space scale of an entity (per axis, ignoring shear).
pub fn world_scale(world: &World, entity: Entity) -> Option<Vec3> {
    world_matrix(world, entity).map(|m| m.to_scale_rotation_translation().0)
}
