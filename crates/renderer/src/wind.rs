//! Wind sway for scattered foliage.
//!
//! A vertex hook bends each vertex sideways by an amount that grows with its
//! height inside the mesh, so roots stay planted and tips move. Per-material
//! parameters live in [`WindMaterials`], keyed by material id; one shared
//! clock drives them all.

use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

use crate::material::{insert_after_marker, Material, MaterialId, ShaderHook, BEGIN_VERTEX_MARKER};

/// Name of the installed pre-compile hook.
pub const WIND_HOOK: &str = "wind_sway";

pub const DEFAULT_AMPLITUDE: f32 = 0.15;
pub const DEFAULT_FREQUENCY: f32 = 1.3;

const WIND_UNIFORM_BLOCK: &str = "\
struct WindUniforms {
    time: f32,
    amplitude_base: f32,
    frequency: f32,
    height_min: f32,
    wind_direction: vec2<f32>,
    height_max: f32,
    scale_compensation: f32,
};

@group(2) @binding(0) var<uniform> wind: WindUniforms;

";

const WIND_VERTEX_BODY: &str = "
    let wind_denom = max(wind.height_max - wind.height_min, 1e-5);
    let height_factor = clamp((transformed.y - wind.height_min) / wind_denom, 0.0, 1.0);
    let wind_phase = (transformed.x * 0.75 + transformed.z * 0.35) * wind.frequency;
    let sway = sin(wind_phase + wind.time * 1.5) * 0.85 + sin(wind_phase * 2.3 + wind.time * 0.9) * 0.15;
    let wind_amp = wind.amplitude_base * wind.scale_compensation;
    transformed.x += wind_amp * sway * wind.wind_direction.x * height_factor;
    transformed.z += wind_amp * sway * wind.wind_direction.y * height_factor;";

/// Sway parameters of one patched material.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindMaterialState {
    pub amplitude_base: f32,
    pub frequency: f32,
    /// Direction in the XZ plane. Normalized on use; zero means no sway.
    pub wind_direction: Vec2,
    pub height_min: f32,
    pub height_max: f32,
    /// Cancels the instance's world scale so sway reads the same on every clone.
    pub scale_compensation: f32,
    pub time: f32,
}

impl Default for WindMaterialState {
    fn default() -> Self {
        Self {
            amplitude_base: DEFAULT_AMPLITUDE,
            frequency: DEFAULT_FREQUENCY,
            wind_direction: Vec2::X,
            height_min: 0.0,
            height_max: 1.0,
            scale_compensation: 1.0,
            time: 0.0,
        }
    }
}

impl WindMaterialState {
    /// 0 at `height_min`, 1 at `height_max` and above.
    pub fn height_factor(&self, y: f32) -> f32 {
        let denom = (self.height_max - self.height_min).max(1e-5);
        ((y - self.height_min) / denom).clamp(0.0, 1.0)
    }

    /// Two-octave sway signal in roughly [-1, 1].
    pub fn sway(&self, x: f32, z: f32) -> f32 {
        let phase = (x * 0.75 + z * 0.35) * self.frequency;
        (phase + self.time * 1.5).sin() * 0.85 + (phase * 2.3 + self.time * 0.9).sin() * 0.15
    }

    /// Unit wind direction, or zero when `wind_direction` is degenerate.
    pub fn direction(&self) -> Vec2 {
        self.wind_direction.normalize_or_zero()
    }

    /// CPU evaluation of the vertex hook for a local-space position.
    pub fn displace(&self, local: Vec3) -> Vec3 {
        let hf = self.height_factor(local.y);
        let amp = self.amplitude_base * self.scale_compensation;
        let s = amp * self.sway(local.x, local.z) * hf;
        let dir = self.direction();
        Vec3::new(local.x + s * dir.x, local.y, local.z + s * dir.y)
    }

    pub fn to_uniform(&self) -> WindUniform {
        WindUniform {
            time: self.time,
            amplitude_base: self.amplitude_base,
            frequency: self.frequency,
            height_min: self.height_min,
            wind_direction: self.direction().into(),
            height_max: self.height_max,
            scale_compensation: self.scale_compensation,
        }
    }
}

/// GPU mirror of [`WindMaterialState`], laid out like `WindUniforms` in WGSL.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct WindUniform {
    pub time: f32,
    pub amplitude_base: f32,
    pub frequency: f32,
    pub height_min: f32,
    pub wind_direction: [f32; 2],
    pub height_max: f32,
    pub scale_compensation: f32,
}

/// `1 / average_scale`, or 1 for a degenerate scale.
pub fn scale_compensation(average_scale: f32) -> f32 {
    if average_scale > 1e-6 {
        1.0 / average_scale
    } else {
        1.0
    }
}

/// Wind state of every patched material plus the shared clock.
#[derive(Debug, Default)]
pub struct WindMaterials {
    states: HashMap<MaterialId, WindMaterialState>,
    time: f32,
}

impl WindMaterials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: MaterialId) -> Option<&WindMaterialState> {
        self.states.get(&id)
    }

    pub fn get_mut(&mut self, id: MaterialId) -> Option<&mut WindMaterialState> {
        self.states.get_mut(&id)
    }

    pub fn contains(&self, id: MaterialId) -> bool {
        self.states.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    /// Write the shared clock into every patched material.
    pub fn set_time(&mut self, elapsed: f32) {
        self.time = elapsed;
        for state in self.states.values_mut() {
            state.time = elapsed;
        }
    }

    /// Forget a material (it was dropped).
    pub fn remove(&mut self, id: MaterialId) -> Option<WindMaterialState> {
        self.states.remove(&id)
    }

    pub fn uniforms(&self) -> impl Iterator<Item = (MaterialId, WindUniform)> + '_ {
        self.states.iter().map(|(id, s)| (*id, s.to_uniform()))
    }
}

/// Patch `material` so its vertices sway.
///
/// Returns `false` and leaves everything untouched for material kinds without
/// a vertex template, or when the height range is not finite or inverted
/// (`height_min > height_max`). Re-applying only refreshes the height range
/// and scale compensation.
pub fn apply_wind_sway(
    registry: &mut WindMaterials,
    material: &mut Material,
    height_min: f32,
    height_max: f32,
    scale_compensation: f32,
) -> bool {
    let id = material.id();
    let kind = material.kind;
    let Some(mut injector) = material.shader_injection() else {
        log::debug!("Wind sway skipped for {:?} material {}", kind, id);
        return false;
    };
    if !height_min.is_finite() || !height_max.is_finite() {
        log::debug!("Wind sway skipped for material {}: empty bounds", id);
        return false;
    }
    if height_min > height_max {
        log::debug!(
            "Wind sway skipped for material {}: height range {}..{} is inverted",
            id,
            height_min,
            height_max
        );
        return false;
    }

    let time = registry.time;
    let state = registry.states.entry(id).or_insert_with(|| WindMaterialState {
        time,
        ..Default::default()
    });
    state.height_min = height_min;
    state.height_max = height_max;
    state.scale_compensation = scale_compensation;

    if !injector.has_hook(WIND_HOOK) {
        injector.register(ShaderHook::new(WIND_HOOK, |source: &mut String| {
            insert_after_marker(source, WIND_HOOK, BEGIN_VERTEX_MARKER, WIND_VERTEX_BODY)?;
            source.insert_str(0, WIND_UNIFORM_BLOCK);
            Ok(())
        }));
    }
    true
}
