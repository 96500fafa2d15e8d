use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use glam::{Vec2, Vec4};
use rustc_hash::{FxHashMap, FxHashSet};
use uuid::Uuid;

use crate::material_builder::MaterialBuilder;
use crate::shader::{PropertyKind, ShaderRef};
use crate::texture::{TextureBinding, TextureRef};

// ============================================================================
// Property values
// ============================================================================

/// Typed value stored for one shader property.
#[derive(Debug, Clone)]
pub enum PropertyValue {
    Color(Vec4),
    Vector(Vec4),
    Float(f32),
    Int(i32),
    Texture(TextureBinding),
    /// Explicitly unset. Skipped by fingerprinting, same as a missing entry.
    Absent,
}

impl PropertyValue {
    /// Kind tag of this value, `None` for [`PropertyValue::Absent`].
    #[must_use]
    pub fn kind(&self) -> Option<PropertyKind> {
        match self {
            Self::Color(_) => Some(PropertyKind::Color),
            Self::Vector(_) => Some(PropertyKind::Vector),
            Self::Float(_) => Some(PropertyKind::Float),
            Self::Int(_) => Some(PropertyKind::Int),
            Self::Texture(_) => Some(PropertyKind::Texture),
            Self::Absent => None,
        }
    }
}

// ============================================================================
// Material
// ============================================================================

/// A material: shader identity, typed property table and enabled keywords.
///
/// Every mutation bumps [`Material::version`], which together with the uuid
/// keys the [`FingerprintCache`](crate::FingerprintCache). Cloning a material
/// produces a *new* asset with its own uuid, the way an editor duplicates a
/// material when it creates a per-instance override.
#[derive(Debug)]
pub struct Material {
    uuid: Uuid,
    pub name: Option<String>,
    version: u64,
    shader: Option<ShaderRef>,
    properties: FxHashMap<String, PropertyValue>,
    keywords: FxHashSet<String>,
}

impl Material {
    pub fn new(shader: ShaderRef) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: None,
            version: 0,
            shader: Some(shader),
            properties: FxHashMap::default(),
            keywords: FxHashSet::default(),
        }
    }

    /// A material whose shader is missing (e.g. failed to compile or import).
    #[must_use]
    pub fn without_shader() -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: None,
            version: 0,
            shader: None,
            properties: FxHashMap::default(),
            keywords: FxHashSet::default(),
        }
    }

    #[must_use]
    pub fn builder(shader: ShaderRef) -> MaterialBuilder {
        MaterialBuilder::new(shader)
    }

    #[inline]
    #[must_use]
    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    #[inline]
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    #[inline]
    #[must_use]
    pub fn shader(&self) -> Option<&ShaderRef> {
        self.shader.as_ref()
    }

    pub fn set_shader(&mut self, shader: Option<ShaderRef>) {
        self.shader = shader;
        self.mark_dirty();
    }

    // --- Property table ---

    pub fn set(&mut self, name: &str, value: PropertyValue) {
        self.properties.insert(name.to_string(), value);
        self.mark_dirty();
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<PropertyValue> {
        let removed = self.properties.remove(name);
        if removed.is_some() {
            self.mark_dirty();
        }
        removed
    }

    pub fn set_color(&mut self, name: &str, color: Vec4) {
        self.set(name, PropertyValue::Color(color));
    }

    pub fn set_vector(&mut self, name: &str, vector: Vec4) {
        self.set(name, PropertyValue::Vector(vector));
    }

    pub fn set_float(&mut self, name: &str, value: f32) {
        self.set(name, PropertyValue::Float(value));
    }

    pub fn set_int(&mut self, name: &str, value: i32) {
        self.set(name, PropertyValue::Int(value));
    }

    pub fn set_texture(&mut self, name: &str, texture: Option<TextureRef>, tiling: Vec2, offset: Vec2) {
        let binding = TextureBinding::new(texture)
            .with_tiling(tiling)
            .with_offset(offset);
        self.set(name, PropertyValue::Texture(binding));
    }

    /// Iterates every texture referenced by the property table.
    pub fn textures(&self) -> impl Iterator<Item = &TextureRef> {
        self.properties.values().filter_map(|value| match value {
            PropertyValue::Texture(binding) => binding.texture.as_ref(),
            _ => None,
        })
    }

    // --- Keywords ---

    pub fn enable_keyword(&mut self, keyword: &str) {
        if self.keywords.insert(keyword.to_string()) {
            self.mark_dirty();
        }
    }

    pub fn disable_keyword(&mut self, keyword: &str) {
        if self.keywords.remove(keyword) {
            self.mark_dirty();
        }
    }

    #[must_use]
    pub fn has_keyword(&self, keyword: &str) -> bool {
        self.keywords.contains(keyword)
    }

    /// Enabled keywords in unspecified order.
    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.keywords.iter().map(String::as_str)
    }

    #[inline]
    fn mark_dirty(&mut self) {
        self.version = self.version.wrapping_add(1);
    }

    #[must_use]
    pub fn into_ref(self) -> MaterialRef {
        MaterialRef::new(self)
    }
}

impl Clone for Material {
    fn clone(&self) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: self.name.clone(),
            version: 0,
            shader: self.shader.clone(),
            properties: self.properties.clone(),
            keywords: self.keywords.clone(),
        }
    }
}

// ============================================================================
// MaterialRef
// ============================================================================

/// Shared reference to an immutable material asset.
///
/// Equality is *reference* equality: two `MaterialRef`s are equal only when
/// they point at the same allocation. Use fingerprints to compare state.
#[derive(Clone)]
pub struct MaterialRef(Arc<Material>);

impl MaterialRef {
    #[must_use]
    pub fn new(material: Material) -> Self {
        Self(Arc::new(material))
    }

    #[inline]
    #[must_use]
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    /// Short label for logs: name if set, otherwise the uuid.
    #[must_use]
    pub fn label(&self) -> String {
        match &self.0.name {
            Some(name) => name.clone(),
            None => self.0.uuid.simple().to_string(),
        }
    }
}

impl Deref for MaterialRef {
    type Target = Material;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl PartialEq for MaterialRef {
    fn eq(&self, other: &Self) -> bool {
        Self::ptr_eq(self, other)
    }
}

impl Eq for MaterialRef {}

impl fmt::Debug for MaterialRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MaterialRef({})", self.label())
    }
}

impl From<Material> for MaterialRef {
    fn from(material: Material) -> Self {
        Self::new(material)
    }
}
