use glam::{Vec2, Vec4};

use crate::material::{Material, MaterialRef, PropertyValue};
use crate::shader::ShaderRef;
use crate::texture::{TextureBinding, TextureRef};

/// Chained construction of a [`Material`].
///
/// Values are recorded in call order; the resulting material (and its
/// fingerprint) does not depend on that order.
pub struct MaterialBuilder {
    shader: ShaderRef,
    name: Option<String>,
    values: Vec<(String, PropertyValue)>,
    keywords: Vec<String>,
}

impl MaterialBuilder {
    pub fn new(shader: ShaderRef) -> Self {
        Self {
            shader,
            name: None,
            values: Vec::new(),
            keywords: Vec::new(),
        }
    }

    pub fn name(mut self, name: &str) -> Self { self.name = Some(name.to_string()); self }
    pub fn color(mut self, prop: &str, color: Vec4) -> Self { self.values.push((prop.to_string(), PropertyValue::Color(color))); self }
    pub fn vector(mut self, prop: &str, vector: Vec4) -> Self { self.values.push((prop.to_string(), PropertyValue::Vector(vector))); self }
    pub fn float(mut self, prop: &str, value: f32) -> Self { self.values.push((prop.to_string(), PropertyValue::Float(value))); self }
    pub fn int(mut self, prop: &str, value: i32) -> Self { self.values.push((prop.to_string(), PropertyValue::Int(value))); self }
    pub fn absent(mut self, prop: &str) -> Self { self.values.push((prop.to_string(), PropertyValue::Absent)); self }
    pub fn keyword(mut self, keyword: &str) -> Self { self.keywords.push(keyword.to_string()); self }

    pub fn texture(mut self, prop: &str, texture: TextureRef, tiling: Vec2, offset: Vec2) -> Self {
        let binding = TextureBinding::new(Some(texture))
            .with_tiling(tiling)
            .with_offset(offset);
        self.values.push((prop.to_string(), PropertyValue::Texture(binding)));
        self
    }

    /// Builds the final material.
    pub fn build(self) -> Material {
        let mut material = Material::new(self.shader);
        material.name = self.name;
        for (prop, value) in self.values {
            material.set(&prop, value);
        }
        for keyword in &self.keywords {
            material.enable_keyword(keyword);
        }
        material
    }

    pub fn build_ref(self) -> MaterialRef {
        self.build().into_ref()
    }
}
