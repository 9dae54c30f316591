//! Deterministic prop scattering: clusters ("patches") of decorative instances.
//!
//! Every patch seeds its own generator from its key, so a patch's layout never
//! depends on which other patches exist or in what order they are generated.

use std::collections::HashSet;
use std::f32::consts::TAU;

use engine_core::{euler_xyz, Transform};
use glam::{Quat, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::rng::Mulberry32;

/// Invalid patch configuration. Rejected up front, never clamped.
#[derive(Debug, Error, PartialEq)]
pub enum ScatterError {
    #[error("patch key must not be empty")]
    EmptyKey,
    #[error("patch `{key}`: duplicate key, layouts would collide")]
    DuplicateKey { key: String },
    #[error("patch `{key}`: instance_count must be at least 1")]
    NoInstances { key: String },
    #[error("patch `{key}`: scatter_radius must be finite and >= 0, got {radius}")]
    InvalidRadius { key: String, radius: f32 },
    #[error("patch `{key}`: scale_range min {min} exceeds max {max}")]
    InvertedScaleRange { key: String, min: f32, max: f32 },
    #[error("patch `{key}`: `{field}` is not a finite number")]
    NonFinite { key: String, field: &'static str },
}

/// Inclusive range for the per-instance scale multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleRange {
    pub min: f32,
    pub max: f32,
}

impl ScaleRange {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn lerp(&self, t: f32) -> f32 {
        self.min + (self.max - self.min) * t
    }
}

impl Default for ScaleRange {
    fn default() -> Self {
        Self { min: 1.0, max: 1.0 }
    }
}

/// Where and how many instances to scatter for one patch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchSpec {
    /// Stable, unique key. Seeds the generator.
    pub key: String,
    pub base_position: Vec3,
    /// XYZ Euler rotation of the patch; only y feeds the instance heading.
    #[serde(default)]
    pub base_rotation: Vec3,
    #[serde(default = "default_instance_count")]
    pub instance_count: usize,
    #[serde(default)]
    pub scatter_radius: f32,
    #[serde(default = "default_base_scale")]
    pub base_scale: f32,
    #[serde(default)]
    pub scale_range: ScaleRange,
    /// Full width (radians) of the random heading offset around `base_rotation.y`.
    #[serde(default)]
    pub rotation_jitter: f32,
}

fn default_instance_count() -> usize {
    1
}
fn default_base_scale() -> f32 {
    1.0
}

impl PatchSpec {
    /// A single unscaled, unjittered instance at `base_position`.
    pub fn new(key: impl Into<String>, base_position: Vec3) -> Self {
        Self {
            key: key.into(),
            base_position,
            base_rotation: Vec3::ZERO,
            instance_count: default_instance_count(),
            scatter_radius: 0.0,
            base_scale: default_base_scale(),
            scale_range: ScaleRange::default(),
            rotation_jitter: 0.0,
        }
    }

    pub fn with_rotation(mut self, rotation: Vec3) -> Self {
        self.base_rotation = rotation;
        self
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.instance_count = count;
        self
    }

    pub fn with_radius(mut self, radius: f32) -> Self {
        self.scatter_radius = radius;
        self
    }

    pub fn with_base_scale(mut self, scale: f32) -> Self {
        self.base_scale = scale;
        self
    }

    pub fn with_scale_range(mut self, min: f32, max: f32) -> Self {
        self.scale_range = ScaleRange::new(min, max);
        self
    }

    pub fn with_rotation_jitter(mut self, jitter: f32) -> Self {
        self.rotation_jitter = jitter;
        self
    }

    /// Check every field; the first problem found is returned.
    pub fn validate(&self) -> Result<(), ScatterError> {
        let key = || self.key.clone();
        if self.key.is_empty() {
            return Err(ScatterError::EmptyKey);
        }
        if self.instance_count == 0 {
            return Err(ScatterError::NoInstances { key: key() });
        }
        if !self.scatter_radius.is_finite() || self.scatter_radius < 0.0 {
            return Err(ScatterError::InvalidRadius {
                key: key(),
                radius: self.scatter_radius,
            });
        }
        let finite_fields = [
            ("base_position", self.base_position.is_finite()),
            ("base_rotation", self.base_rotation.is_finite()),
            ("base_scale", self.base_scale.is_finite()),
            ("scale_range", self.scale_range.min.is_finite() && self.scale_range.max.is_finite()),
            ("rotation_jitter", self.rotation_jitter.is_finite()),
        ];
        if let Some((field, _)) = finite_fields.iter().find(|(_, ok)| !ok) {
            return Err(ScatterError::NonFinite { key: key(), field });
        }
        if self.scale_range.min > self.scale_range.max {
            return Err(ScatterError::InvertedScaleRange {
                key: key(),
                min: self.scale_range.min,
                max: self.scale_range.max,
            });
        }
        Ok(())
    }
}

/// One placed copy of the patch's source model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScatterInstance {
    pub position: Vec3,
    pub rotation_y: f32,
    pub uniform_scale: f32,
}

impl ScatterInstance {
    /// Scene transform: the patch's x/z tilt kept, heading replaced by `rotation_y`.
    pub fn transform(&self, base_rotation: Vec3) -> Transform {
        let rotation: Quat = euler_xyz(Vec3::new(base_rotation.x, self.rotation_y, base_rotation.z));
        Transform::from_position_rotation(self.position, rotation).with_uniform_scale(self.uniform_scale)
    }
}

/// Scatter `spec` with the default keyed generator.
pub fn generate_instances(spec: &PatchSpec) -> Result<Vec<ScatterInstance>, ScatterError> {
    let mut rng = Mulberry32::from_key(&spec.key);
    generate_instances_with(spec, &mut rng)
}

/// Scatter `spec` drawing from any `rand` generator.
///
/// Draw order per instance is angle, radius, scale, heading; changing it
/// changes every existing layout.
pub fn generate_instances_with<R: Rng + ?Sized>(
    spec: &PatchSpec,
    rng: &mut R,
) -> Result<Vec<ScatterInstance>, ScatterError> {
    spec.validate()?;

    let instances = (0..spec.instance_count)
        .map(|_| {
            let angle = rng.gen::<f32>() * TAU;
            // sqrt keeps the density uniform over the disk's area.
            let radius = rng.gen::<f32>().sqrt() * spec.scatter_radius;
            let offset = Vec3::new(angle.cos() * radius, 0.0, angle.sin() * radius);

            let multiplier = spec.scale_range.lerp(rng.gen::<f32>());
            let rotation_y = spec.base_rotation.y + (rng.gen::<f32>() - 0.5) * spec.rotation_jitter;

            ScatterInstance {
                position: spec.base_position + offset,
                rotation_y,
                uniform_scale: spec.base_scale * multiplier,
            }
        })
        .collect();

    Ok(instances)
}

/// Generated instances for one patch.
#[derive(Debug, Clone, PartialEq)]
pub struct ScatteredPatch {
    pub spec: PatchSpec,
    pub instances: Vec<ScatterInstance>,
}

impl ScatteredPatch {
    /// Mean `uniform_scale` across the patch (input for wind scale compensation).
    pub fn average_scale(&self) -> f32 {
        if self.instances.is_empty() {
            return 1.0;
        }
        self.instances.iter().map(|i| i.uniform_scale).sum::<f32>() / self.instances.len() as f32
    }
}

/// The whole scatter configuration of a scene, generated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScatterLayout {
    pub patches: Vec<ScatteredPatch>,
}

impl ScatterLayout {
    /// Validate key uniqueness and generate every patch.
    pub fn build(specs: &[PatchSpec]) -> Result<Self, ScatterError> {
        let mut seen = HashSet::new();
        let mut patches = Vec::with_capacity(specs.len());
        for spec in specs {
            if !seen.insert(spec.key.as_str()) {
                return Err(ScatterError::DuplicateKey { key: spec.key.clone() });
            }
            let instances = generate_instances(spec)?;
            patches.push(ScatteredPatch {
                spec: spec.clone(),
                instances,
            });
        }
        log::debug!(
            "Scattered {} patches ({} instances)",
            patches.len(),
            patches.iter().map(|p| p.instances.len()).sum::<usize>()
        );
        Ok(Self { patches })
    }

    pub fn instance_count(&self) -> usize {
        self.patches.iter().map(|p| p.instances.len()).sum()
    }

    pub fn patch(&self, key: &str) -> Option<&ScatteredPatch> {
        self.patches.iter().find(|p| p.spec.key == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::f32::consts::PI;

    fn grass1() -> PatchSpec {
        PatchSpec::new("grass1", Vec3::new(1.0, 0.0, -0.5))
            .with_count(10)
            .with_radius(0.6)
            .with_scale_range(0.85, 1.2)
            .with_rotation_jitter(PI * 1.2)
    }

    fn bits(instances: &[ScatterInstance]) -> Vec<[u32; 5]> {
        instances
            .iter()
            .map(|i| {
                [
                    i.position.x.to_bits(),
                    i.position.y.to_bits(),
                    i.position.z.to_bits(),
                    i.rotation_y.to_bits(),
                    i.uniform_scale.to_bits(),
                ]
            })
            .collect()
    }

    /// The grass1 scenario: 10 instances, reproducible, inside the disk, scales in range.
    #[test]
    fn grass1_layout_is_reproducible_and_bounded() {
        let spec = grass1();
        let a = generate_instances(&spec).unwrap();
        let b = generate_instances(&spec).unwrap();
        assert_eq!(a.len(), 10);
        assert_eq!(bits(&a), bits(&b));

        for inst in &a {
            let d = inst.position - spec.base_position;
            assert_eq!(d.y, 0.0);
            assert!((d.x * d.x + d.z * d.z).sqrt() <= 0.6 + 1e-5);
            assert!(inst.uniform_scale >= 0.85 - 1e-6 && inst.uniform_scale <= 1.2 + 1e-6);
            assert!(inst.rotation_y.abs() <= PI * 0.6 + 1e-5);
        }
    }

    #[test]
    fn layout_independent_of_generation_order() {
        let a = grass1();
        let other = PatchSpec::new("grass2", Vec3::new(-1.1, -0.15, -2.5)).with_count(12).with_radius(0.8);
        let first = generate_instances(&a).unwrap();
        let _ = generate_instances(&other).unwrap();
        let again = generate_instances(&a).unwrap();
        assert_eq!(bits(&first), bits(&again));

        let layout_ab = ScatterLayout::build(&[a.clone(), other.clone()]).unwrap();
        let layout_ba = ScatterLayout::build(&[other, a]).unwrap();
        assert_eq!(layout_ab.patch("grass1"), layout_ba.patch("grass1"));
    }

    #[test]
    fn different_keys_give_different_layouts() {
        let a = generate_instances(&grass1()).unwrap();
        let mut renamed = grass1();
        renamed.key = "grass1b".into();
        let b = generate_instances(&renamed).unwrap();
        assert_ne!(bits(&a), bits(&b));
    }

    /// Distances from the center follow P(dist <= r) = (r/R)^2 (uniform over area).
    #[test]
    fn scatter_is_uniform_over_disk_area() {
        let n = 10_000;
        let radius = 2.0;
        let spec = PatchSpec::new("ks-disk", Vec3::ZERO).with_count(n).with_radius(radius);
        let mut dists: Vec<f64> = generate_instances(&spec)
            .unwrap()
            .iter()
            .map(|i| (i.position.x as f64).hypot(i.position.z as f64) / radius as f64)
            .collect();
        dists.sort_by(|a, b| a.partial_cmp(b).unwrap());

        let ks_area = ks_statistic(&dists, |r| r * r);
        let ks_linear = ks_statistic(&dists, |r| r);
        // Critical value at alpha = 0.001 is about 1.95 / sqrt(n).
        let critical = 1.95 / (n as f64).sqrt();
        assert!(ks_area < critical, "D = {ks_area} exceeds {critical}");
        // A uniform-radius sampler would sit near D = 0.25 against the area CDF.
        assert!(ks_linear > 0.2, "distribution looks radius-uniform, D = {ks_linear}");
    }

    fn ks_statistic(sorted: &[f64], cdf: impl Fn(f64) -> f64) -> f64 {
        let n = sorted.len() as f64;
        sorted
            .iter()
            .enumerate()
            .map(|(i, &x)| {
                let f = cdf(x);
                let lo = (f - i as f64 / n).abs();
                let hi = ((i + 1) as f64 / n - f).abs();
                lo.max(hi)
            })
            .fold(0.0, f64::max)
    }

    #[test]
    fn invalid_specs_are_rejected() {
        let neg = grass1().with_radius(-0.1);
        assert!(matches!(generate_instances(&neg), Err(ScatterError::InvalidRadius { .. })));

        let empty = grass1().with_count(0);
        assert!(matches!(generate_instances(&empty), Err(ScatterError::NoInstances { .. })));

        let inverted = grass1().with_scale_range(1.2, 0.8);
        assert!(matches!(
            generate_instances(&inverted),
            Err(ScatterError::InvertedScaleRange { .. })
        ));

        let nan = grass1().with_rotation_jitter(f32::NAN);
        assert_eq!(
            generate_instances(&nan),
            Err(ScatterError::NonFinite {
                key: "grass1".into(),
                field: "rotation_jitter"
            })
        );

        let mut blank = grass1();
        blank.key.clear();
        assert_eq!(generate_instances(&blank), Err(ScatterError::EmptyKey));
    }

    #[test]
    fn duplicate_keys_fail_layout() {
        let err = ScatterLayout::build(&[grass1(), grass1()]).unwrap_err();
        assert_eq!(err, ScatterError::DuplicateKey { key: "grass1".into() });
    }

    #[test]
    fn generator_is_swappable() {
        let spec = grass1();
        let mut rng = StdRng::seed_from_u64(7);
        let insts = generate_instances_with(&spec, &mut rng).unwrap();
        assert_eq!(insts.len(), 10);
        assert!(insts.iter().all(|i| (i.position - spec.base_position).length() <= 0.6 + 1e-5));
    }

    #[test]
    fn zero_radius_stacks_on_base_position() {
        let spec = PatchSpec::new("point", Vec3::new(3.4, -0.15, -0.7)).with_count(5);
        let insts = generate_instances(&spec).unwrap();
        assert!(insts.iter().all(|i| i.position == spec.base_position));
        assert!(insts.iter().all(|i| i.uniform_scale == 1.0));
    }

    #[test]
    fn average_scale_and_transform() {
        let layout = ScatterLayout::build(&[grass1()]).unwrap();
        let patch = layout.patch("grass1").unwrap();
        let avg = patch.average_scale();
        assert!((0.85..=1.2).contains(&avg));

        let inst = patch.instances[0];
        let t = inst.transform(Vec3::ZERO);
        assert_eq!(t.position, inst.position);
        assert!((t.average_scale() - inst.uniform_scale).abs() < 1e-6);
    }
}
