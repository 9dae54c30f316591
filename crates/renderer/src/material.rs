//! Materials and pre-compile shader hooks.
//!
//! Only lit surface materials expose a [`ShaderInjector`]; everything else is
//! drawn with a fixed pipeline and cannot be patched.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use glam::Vec4;
use thiserror::Error;

/// Marker in the vertex template after which the local-space position
/// (`transformed`) may be modified.
pub const BEGIN_VERTEX_MARKER: &str = "// <begin_vertex>";

pub type MaterialId = u64;

static NEXT_MATERIAL_ID: AtomicU64 = AtomicU64::new(1);

fn next_material_id() -> MaterialId {
    NEXT_MATERIAL_ID.fetch_add(1, Ordering::Relaxed)
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShaderError {
    #[error("hook `{hook}`: marker `{marker}` not found in shader source")]
    MissingMarker { hook: String, marker: &'static str },
}

/// Surface model of a material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaterialKind {
    Basic,
    Lambert,
    Phong,
    Standard,
    Physical,
    Line,
    Points,
    Sprite,
    /// Raw user shader; no template to hook into.
    Shader,
}

impl MaterialKind {
    /// Mesh materials built from the lit vertex template.
    pub fn is_lit_surface(self) -> bool {
        matches!(
            self,
            MaterialKind::Basic
                | MaterialKind::Lambert
                | MaterialKind::Phong
                | MaterialKind::Standard
                | MaterialKind::Physical
        )
    }
}

type HookFn = dyn Fn(&mut String) -> Result<(), ShaderError> + Send + Sync;

/// Named source transform run before the material's shader is compiled.
#[derive(Clone)]
pub struct ShaderHook {
    name: String,
    apply: Arc<HookFn>,
}

impl ShaderHook {
    pub fn new<F>(name: impl Into<String>, apply: F) -> Self
    where
        F: Fn(&mut String) -> Result<(), ShaderError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            apply: Arc::new(apply),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for ShaderHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShaderHook").field("name", &self.name).finish_non_exhaustive()
    }
}

/// Capability to register pre-compile hooks on a material.
pub struct ShaderInjector<'a> {
    hooks: &'a mut Vec<ShaderHook>,
}

impl ShaderInjector<'_> {
    /// Install `hook`, replacing any hook with the same name.
    pub fn register(&mut self, hook: ShaderHook) {
        match self.hooks.iter_mut().find(|h| h.name == hook.name) {
            Some(existing) => *existing = hook,
            None => self.hooks.push(hook),
        }
    }

    pub fn has_hook(&self, name: &str) -> bool {
        self.hooks.iter().any(|h| h.name == name)
    }
}

/// A surface material. Identity is the `id`; hooks are bound to it.
#[derive(Debug)]
pub struct Material {
    id: MaterialId,
    pub kind: MaterialKind,
    pub name: String,
    pub color: Vec4,
    hooks: Vec<ShaderHook>,
}

impl Material {
    pub fn new(kind: MaterialKind, name: impl Into<String>) -> Self {
        Self {
            id: next_material_id(),
            kind,
            name: name.into(),
            color: Vec4::ONE,
            hooks: Vec::new(),
        }
    }

    pub fn with_color(mut self, color: Vec4) -> Self {
        self.color = color;
        self
    }

    pub fn id(&self) -> MaterialId {
        self.id
    }

    /// Hook registration, available for lit surface kinds only.
    pub fn shader_injection(&mut self) -> Option<ShaderInjector<'_>> {
        if self.kind.is_lit_surface() {
            Some(ShaderInjector { hooks: &mut self.hooks })
        } else {
            None
        }
    }

    pub fn hook_names(&self) -> impl Iterator<Item = &str> {
        self.hooks.iter().map(|h| h.name())
    }

    /// Run every hook, in registration order, over a copy of `template`.
    pub fn compile(&self, template: &str) -> Result<String, ShaderError> {
        let mut source = template.to_owned();
        for hook in &self.hooks {
            (hook.apply)(&mut source)?;
        }
        Ok(source)
    }
}

impl Clone for Material {
    /// The clone gets a fresh id and starts unpatched.
    fn clone(&self) -> Self {
        Self {
            id: next_material_id(),
            kind: self.kind,
            name: self.name.clone(),
            color: self.color,
            hooks: Vec::new(),
        }
    }
}

/// Insert `code` on the line after `marker`, keeping the marker for later hooks.
pub fn insert_after_marker(
    source: &mut String,
    hook: &str,
    marker: &'static str,
    code: &str,
) -> Result<(), ShaderError> {
    let at = source.find(marker).ok_or_else(|| ShaderError::MissingMarker {
        hook: hook.to_owned(),
        marker,
    })?;
    let insert_at = at + marker.len();
    source.insert_str(insert_at, code);
    Ok(())
}
