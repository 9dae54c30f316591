//! Ground slab under the garden: a rounded rectangle sized from the fence line,
//! extruded downwards into a flat-shaded mesh.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Vertex with position, normal and UV.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlatformVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl PlatformVertex {
    pub fn new(position: Vec3, normal: Vec3, uv: Vec2) -> Self {
        Self {
            position: position.into(),
            normal: normal.into(),
            uv: uv.into(),
        }
    }
}

/// Generated slab geometry.
#[derive(Debug, Clone, Default)]
pub struct PlatformMeshData {
    pub vertices: Vec<PlatformVertex>,
    pub indices: Vec<u32>,
}

impl PlatformMeshData {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Slab dimensions. The fence rectangle is grown by `margin` on every side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformSpec {
    pub fence_min: Vec2,
    pub fence_max: Vec2,
    pub margin: f32,
    pub corner_radius: f32,
    /// Height of the slab's mid-plane.
    pub y: f32,
    pub thickness: f32,
    /// Samples per rounded corner.
    pub curve_segments: u32,
}

impl Default for PlatformSpec {
    fn default() -> Self {
        Self {
            fence_min: Vec2::new(-4.2, -3.4),
            fence_max: Vec2::new(4.2, 3.7),
            margin: 0.7,
            corner_radius: 0.6,
            y: -0.3,
            thickness: 0.25,
            curve_segments: 16,
        }
    }
}

impl PlatformSpec {
    /// Full (width, depth) including the margin.
    pub fn size(&self) -> Vec2 {
        self.fence_max - self.fence_min + Vec2::splat(self.margin * 2.0)
    }

    /// Center in the XZ plane.
    pub fn center(&self) -> Vec2 {
        (self.fence_min + self.fence_max) * 0.5
    }

    pub fn top_y(&self) -> f32 {
        self.y + self.thickness * 0.5
    }

    pub fn bottom_y(&self) -> f32 {
        self.y - self.thickness * 0.5
    }

    /// Closed outline in the XZ plane, counter-clockwise seen from above,
    /// without a repeated end point. Corners are quadratic curves with the
    /// control point on the sharp corner.
    pub fn outline(&self) -> Vec<Vec2> {
        let half = self.size() * 0.5;
        let r = self.corner_radius.clamp(0.0, half.x.min(half.y));
        let segments = self.curve_segments.max(1);
        let c = self.center();

        // (edge end, corner, curve end) walking around the rectangle.
        let corners = [
            (Vec2::new(half.x - r, -half.y), Vec2::new(half.x, -half.y), Vec2::new(half.x, -half.y + r)),
            (Vec2::new(half.x, half.y - r), Vec2::new(half.x, half.y), Vec2::new(half.x - r, half.y)),
            (Vec2::new(-half.x + r, half.y), Vec2::new(-half.x, half.y), Vec2::new(-half.x, half.y - r)),
            (Vec2::new(-half.x, -half.y + r), Vec2::new(-half.x, -half.y), Vec2::new(-half.x + r, -half.y)),
        ];

        let mut points = Vec::with_capacity(4 * (segments as usize + 1));
        points.push(Vec2::new(-half.x + r, -half.y));
        for (edge_end, control, curve_end) in corners {
            points.push(edge_end);
            for s in 1..=segments {
                let t = s as f32 / segments as f32;
                points.push(quadratic(edge_end, control, curve_end, t));
            }
        }
        // The last curve closes back onto the start point.
        points.pop();

        points.into_iter().map(|p| p + c).collect()
    }

    /// Extrude the outline into a closed slab: top cap, bottom cap and side walls.
    pub fn build_mesh(&self) -> PlatformMeshData {
        let outline = self.outline();
        let n = outline.len() as u32;
        let size = self.size();
        let min = self.center() - size * 0.5;
        let (top, bottom) = (self.top_y(), self.bottom_y());
        let centroid = outline.iter().copied().sum::<Vec2>() / n as f32;
        let uv_of = |p: Vec2| (p - min) / size;

        let mut mesh = PlatformMeshData::default();

        // Caps: fan around the centroid (the outline is convex).
        for (y, normal) in [(top, Vec3::Y), (bottom, Vec3::NEG_Y)] {
            let base = mesh.vertices.len() as u32;
            mesh.vertices
                .push(PlatformVertex::new(Vec3::new(centroid.x, y, centroid.y), normal, uv_of(centroid)));
            for p in &outline {
                mesh.vertices.push(PlatformVertex::new(Vec3::new(p.x, y, p.y), normal, uv_of(*p)));
            }
            for i in 0..n {
                let a = base + 1 + i;
                let b = base + 1 + (i + 1) % n;
                if normal.y > 0.0 {
                    mesh.indices.extend_from_slice(&[base, b, a]);
                } else {
                    mesh.indices.extend_from_slice(&[base, a, b]);
                }
            }
        }

        // Walls: one flat quad per outline edge.
        let mut v = 0.0;
        for i in 0..outline.len() {
            let a = outline[i];
            let b = outline[(i + 1) % outline.len()];
            let edge = b - a;
            let len = edge.length();
            if len <= f32::EPSILON {
                continue;
            }
            let normal = Vec3::new(edge.y, 0.0, -edge.x) / len;
            let base = mesh.vertices.len() as u32;
            let (v0, v1) = (v, v + len);
            mesh.vertices.extend_from_slice(&[
                PlatformVertex::new(Vec3::new(a.x, top, a.y), normal, Vec2::new(v0, 0.0)),
                PlatformVertex::new(Vec3::new(b.x, top, b.y), normal, Vec2::new(v1, 0.0)),
                PlatformVertex::new(Vec3::new(b.x, bottom, b.y), normal, Vec2::new(v1, 1.0)),
                PlatformVertex::new(Vec3::new(a.x, bottom, a.y), normal, Vec2::new(v0, 1.0)),
            ]);
            mesh.indices
                .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
            v = v1;
        }

        mesh
    }
}

fn quadratic(p0: Vec2, p1: Vec2, p2: Vec2, t: f32) -> Vec2 {
    let u = 1.0 - t;
    p0 * (u * u) + p1 * (2.0 * u * t) + p2 * (t * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outline_has_expected_extent_and_count() {
        let spec = PlatformSpec::default();
        let outline = spec.outline();
        assert_eq!(outline.len(), 4 * (16 + 1));

        let size = spec.size();
        assert!((size.x - 9.8).abs() < 1e-5);
        assert!((size.y - 8.5).abs() < 1e-5);

        let (lo, hi) = outline.iter().fold(
            (Vec2::splat(f32::MAX), Vec2::splat(f32::MIN)),
            |(lo, hi), p| (lo.min(*p), hi.max(*p)),
        );
        assert!((hi.x - lo.x - size.x).abs() < 1e-4);
        assert!((hi.y - lo.y - size.y).abs() < 1e-4);
        assert!(((lo + hi) * 0.5 - spec.center()).length() < 1e-4);
    }

    #[test]
    fn corners_are_cut() {
        let spec = PlatformSpec::default();
        let half = spec.size() * 0.5;
        let c = spec.center();
        // The sharp corner itself is never on the outline.
        let sharp = c + half;
        assert!(spec.outline().iter().all(|p| (*p - sharp).length() > 0.1));
    }

    #[test]
    fn mesh_indices_in_range_and_top_faces_up() {
        let spec = PlatformSpec::default();
        let mesh = spec.build_mesh();
        let n = mesh.vertices.len() as u32;
        assert!(mesh.indices.iter().all(|&i| i < n));
        assert_eq!(mesh.indices.len() % 3, 0);

        // First cap triangle: counter-clockwise seen from +Y.
        let p = |i: usize| Vec3::from(mesh.vertices[mesh.indices[i] as usize].position);
        let face = (p(1) - p(0)).cross(p(2) - p(0));
        assert!(face.y > 0.0);
        assert!((p(0).y - spec.top_y()).abs() < 1e-6);
    }

    #[test]
    fn wall_normals_point_outward() {
        let spec = PlatformSpec::default();
        let mesh = spec.build_mesh();
        let c = spec.center();
        for v in mesh.vertices.iter().filter(|v| v.normal[1] == 0.0) {
            let out = Vec2::new(v.position[0], v.position[2]) - c;
            assert!(out.dot(Vec2::new(v.normal[0], v.normal[2])) > 0.0);
        }
    }
}
