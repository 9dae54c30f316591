//! Axis-aligned bounding boxes and model height normalization.

use glam::{Mat4, Vec3};

/// Axis-aligned bounding box. An empty box has `min > max` on every axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Aabb {
    pub const EMPTY: Self = Self {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Smallest box enclosing all points; `EMPTY` for no points.
    pub fn from_points<I: IntoIterator<Item = Vec3>>(points: I) -> Self {
        points.into_iter().fold(Self::EMPTY, |mut b, p| {
            b.extend(p);
            b
        })
    }

    pub fn extend(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn size(&self) -> Vec3 {
        if self.is_empty() {
            Vec3::ZERO
        } else {
            self.max - self.min
        }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Bounds of the eight corners after applying `m`.
    pub fn transformed(&self, m: &Mat4) -> Self {
        if self.is_empty() {
            return *self;
        }
        let (lo, hi) = (self.min, self.max);
        Self::from_points((0..8).map(|i| {
            let corner = Vec3::new(
                if i & 1 == 0 { lo.x } else { hi.x },
                if i & 2 == 0 { lo.y } else { hi.y },
                if i & 4 == 0 { lo.z } else { hi.z },
            );
            m.transform_point3(corner)
        }))
    }
}

/// Uniform scale and vertical lift that fit a model to a target height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeightFit {
    /// Multiply the model's scale by this.
    pub scale: f32,
    /// Add this to the model's y position (0 unless seated on the ground).
    pub lift: f32,
}

/// Fit `bounds` (in the model's parent space) to `target_height`.
///
/// A degenerate box (zero height) keeps its scale. With `sit_on_ground` the
/// lowest point of the rescaled model ends up at y = 0 of the parent.
pub fn normalize_to_height(bounds: &Aabb, target_height: f32, sit_on_ground: bool) -> HeightFit {
    let height = bounds.size().y;
    let scale = if height > 0.0 { target_height / height } else { 1.0 };
    let lift = if sit_on_ground && !bounds.is_empty() {
        let min_y = bounds.min.y * scale;
        if min_y.is_finite() {
            -min_y
        } else {
            0.0
        }
    } else {
        0.0
    };
    HeightFit { scale, lift }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_scales_to_target_and_seats_on_ground() {
        let bounds = Aabb::new(Vec3::new(-1.0, -0.5, -1.0), Vec3::new(1.0, 1.5, 1.0));
        let fit = normalize_to_height(&bounds, 0.45, true);
        assert!((fit.scale - 0.225).abs() < 1e-6);
        // min.y after scaling is -0.1125; the lift cancels it.
        assert!((fit.lift - 0.1125).abs() < 1e-6);
    }

    #[test]
    fn flat_bounds_keep_scale() {
        let bounds = Aabb::new(Vec3::new(-1.0, 0.2, -1.0), Vec3::new(1.0, 0.2, 1.0));
        let fit = normalize_to_height(&bounds, 1.0, false);
        assert_eq!(fit.scale, 1.0);
        assert_eq!(fit.lift, 0.0);
    }

    #[test]
    fn transformed_box_encloses_rotated_corners() {
        let b = Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0));
        let m = Mat4::from_rotation_y(std::f32::consts::FRAC_PI_4);
        let t = b.transformed(&m);
        let half_diag = 2.0_f32.sqrt();
        assert!((t.max.x - half_diag).abs() < 1e-5);
        assert!((t.max.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn empty_box_has_zero_size() {
        assert_eq!(Aabb::EMPTY.size(), Vec3::ZERO);
        assert!(Aabb::from_points(std::iter::empty()).is_empty());
    }
}
